//! HTTP API tests
//!
//! Each test builds the router over an in-memory database and drives it with
//! `tower::ServiceExt::oneshot`, without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sect::core::config::Config;
use sect::core::db::Database;
use sect::server::{router, AppState};

fn app_with(config: Config) -> Router {
    let db = Database::open_in_memory().unwrap();
    router(Arc::new(AppState::new(db, config).unwrap()))
}

fn app() -> Router {
    app_with(Config::default())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    user: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = user {
        builder = builder.header("x-sect-user", email);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), None).await
}

async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body), None).await
}

async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None, None).await
}

async fn create_supplier(app: &Router, name: &str) -> i64 {
    let (status, body) = post(
        app,
        "/suppliers",
        json!({ "name": name, "country_code": "fr", "supply_chain_level": "tier1" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn issue_token(app: &Router, supplier_id: i64) -> String {
    let (status, body) = post(
        app,
        "/portal/tokens",
        json!({ "supplier_id": supplier_id, "contact_email": "contact@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

// ============================================================================
// Info
// ============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let app = app();
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "SECT Control Tower");

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

// ============================================================================
// Suppliers
// ============================================================================

#[tokio::test]
async fn test_supplier_crud() {
    let app = app();
    let id = create_supplier(&app, "Bosch").await;

    let (status, body) = get(&app, &format!("/suppliers/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bosch");
    assert_eq!(body["country_code"], "FR");
    assert_eq!(body["contacts"], json!([]));

    let (status, body) = put(&app, &format!("/suppliers/{id}"), json!({ "region": "EMEA" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"], "EMEA");
    assert_eq!(body["name"], "Bosch");

    let (status, body) = get(&app, "/suppliers?search=bos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = delete(&app, &format!("/suppliers/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, &format!("/suppliers/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_supplier_validation_and_conflict() {
    let app = app();

    let (status, body) = post(&app, "/suppliers", json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = post(&app, "/suppliers", json!({ "name": "A", "external_id": "SUP-1" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/suppliers", json!({ "name": "B", "external_id": "SUP-1" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = get(&app, "/suppliers?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_supplier_contacts_and_profiles() {
    let app = app();
    let id = create_supplier(&app, "Valeo").await;

    let (status, body) = post(
        &app,
        &format!("/suppliers/{id}/contacts"),
        json!({ "full_name": "Marie Curie", "email": "Marie@Valeo.example", "is_primary": true }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["full_name"], "Marie Curie");
    assert_eq!(body["is_primary"], true);

    let (status, _) = get(&app, &format!("/suppliers/{id}/pcf")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = put(
        &app,
        &format!("/suppliers/{id}/pcf"),
        json!({ "pcf_maturity": "advanced", "pcf_count": 4, "frameworks": ["ISO 14067"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pcf_maturity"], "advanced");

    let (_, stats) = get(&app, "/suppliers/stats").await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["pcf_maturity"]["advanced"], 1);
}

#[tokio::test]
async fn test_malformed_path_is_rejected() {
    let app = app();
    let (status, _) = get(&app, "/suppliers/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Campaigns
// ============================================================================

#[tokio::test]
async fn test_campaign_progress() {
    let app = app();
    let a = create_supplier(&app, "Alpha").await;
    let b = create_supplier(&app, "Beta").await;

    let (status, campaign) = post(
        &app,
        "/campaigns",
        json!({ "name": "PCF 2025", "type": "PCF", "start_date": "2025-01-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(campaign["status"], "draft");
    let cid = campaign["id"].as_i64().unwrap();

    let (status, body) = post(
        &app,
        &format!("/campaigns/{cid}/suppliers"),
        json!({ "supplier_ids": [a, b, a, 9999] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], 2);

    let (status, _) = put(
        &app,
        &format!("/campaigns/{cid}/suppliers/{a}"),
        json!({ "status": "submitted" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, summary) = get(&app, &format!("/campaigns/{cid}")).await;
    assert_eq!(summary["suppliers_total"], 2);
    assert_eq!(summary["suppliers_responded"], 1);
    assert_eq!(summary["progress"], 50.0);

    let (_, stats) = get(&app, &format!("/campaigns/{cid}/stats")).await;
    assert_eq!(stats["response_rate"], 50.0);

    let (status, row) = post(&app, &format!("/campaigns/{cid}/suppliers/{b}/remind"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["reminders_sent"], 1);
}

#[tokio::test]
async fn test_campaign_rejects_reversed_dates() {
    let app = app();
    let (status, _) = post(
        &app,
        "/campaigns",
        json!({ "name": "Bad", "type": "IMDS", "start_date": "2025-06-01", "end_date": "2025-01-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Submissions
// ============================================================================

#[tokio::test]
async fn test_pcf_validation_flow() {
    let app = app();
    let sid = create_supplier(&app, "Alpha").await;

    let (status, _) = post(
        &app,
        "/pcf",
        json!({ "supplier_id": sid, "product_ref": "P-1", "total_emissions_kgco2e": 0.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, pcf) = post(
        &app,
        "/pcf",
        json!({ "supplier_id": sid, "product_ref": "P-1", "total_emissions_kgco2e": 1250.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = pcf["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::POST, &format!("/pcf/{id}/validate"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["validation_status"], "validated");

    let (_, one) = get(&app, &format!("/pcf?id={id}")).await;
    assert_eq!(one["id"], id);

    let (_, stats) = get(&app, "/dashboard/stats").await;
    assert_eq!(stats["pcf"]["validated"], 1);
    assert_eq!(stats["emissions"]["total_kgco2e"], 1250.5);
}

#[tokio::test]
async fn test_imds_create_and_delete() {
    let app = app();
    let sid = create_supplier(&app, "Alpha").await;

    let (status, imds) = post(
        &app,
        "/imds",
        json!({ "supplier_id": sid, "mds_id": "MDS-1", "part_number": "PN-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = imds["id"].as_i64().unwrap();

    let (status, list) = get(&app, &format!("/imds?supplier_id={sid}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = delete(&app, &format!("/imds?id={id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/imds?id={id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Portal
// ============================================================================

#[tokio::test]
async fn test_portal_token_flow() {
    let app = app();
    let sid = create_supplier(&app, "Valeo").await;

    let (status, issued) = post(
        &app,
        "/portal/tokens",
        json!({ "supplier_id": sid, "contact_email": "c@valeo.example", "contact_name": "Marie" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = issued["token"].as_str().unwrap().to_string();
    assert!(issued["portal_url"].as_str().unwrap().ends_with(&token));
    assert!(issued["invitation"].as_str().unwrap().contains("Bonjour Marie"));

    let (status, access) = get(&app, &format!("/portal/tokens?token={token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(access["supplier_id"], sid);
    assert_eq!(access["use_count"], 1);

    let (status, draft) = post(
        &app,
        "/portal/submissions",
        json!({ "token": token, "submission_type": "pcf", "product_name": "Lamp", "emissions_total": 12.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["status"], "draft");
    assert_eq!(draft["emissions_unit"], "kg CO2e");
    let id = draft["id"].as_i64().unwrap();

    let (status, submitted) = put(
        &app,
        "/portal/submissions",
        json!({ "id": id, "token": token, "status": "submitted" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(submitted["submitted_at"].is_string());

    let (status, _) = put(
        &app,
        "/portal/submissions",
        json!({ "id": id, "token": token, "status": "validated" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reviewed) = put(
        &app,
        "/portal/submissions",
        json!({ "id": id, "status": "validated", "reviewed_by": "quality@sect.local" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["reviewed_by"], "quality@sect.local");

    let (status, mine) = get(&app, &format!("/portal/submissions?token={token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_portal_rejects_bad_tokens() {
    let app = app();
    let a = create_supplier(&app, "Alpha").await;
    let b = create_supplier(&app, "Beta").await;
    let token_a = issue_token(&app, a).await;
    let token_b = issue_token(&app, b).await;

    let (status, _) = get(&app, "/portal/tokens?token=deadbeef").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, sub) = post(
        &app,
        "/portal/submissions",
        json!({ "token": token_a, "submission_type": "imds", "mds_id": "MDS-9" }),
    )
    .await;
    let id = sub["id"].as_i64().unwrap();

    let (status, _) = get(&app, &format!("/portal/submissions?id={id}&token={token_b}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = put(
        &app,
        "/portal/submissions",
        json!({ "id": id, "token": token_b, "notes": "not mine" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, revoked) = send(
        &app,
        Method::DELETE,
        &format!("/portal/tokens?token={token_a}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revoked["is_active"], false);

    let (status, _) = post(
        &app,
        "/portal/submissions",
        json!({ "token": token_a, "submission_type": "imds" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_portal_campaign_token_is_scoped() {
    let app = app();
    let sid = create_supplier(&app, "Alpha").await;
    let (_, campaign) = post(&app, "/campaigns", json!({ "name": "PCF 2025", "type": "PCF" })).await;
    let campaign_id = campaign["id"].as_i64().unwrap();

    let open = issue_token(&app, sid).await;
    let (status, body) = post(
        &app,
        "/portal/tokens",
        json!({ "supplier_id": sid, "campaign_id": campaign_id, "contact_email": "c@x.example" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let scoped = body["token"].as_str().unwrap().to_string();

    let (_, sub) = post(
        &app,
        "/portal/submissions",
        json!({ "token": open, "submission_type": "imds", "mds_id": "MDS-1" }),
    )
    .await;
    let id = sub["id"].as_i64().unwrap();

    let (status, _) = get(&app, &format!("/portal/submissions?id={id}&token={open}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/portal/submissions?id={id}&token={scoped}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = put(
        &app,
        "/portal/submissions",
        json!({ "id": id, "token": scoped, "notes": "other campaign" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_portal_token_expiry_bounds() {
    let app = app();
    let sid = create_supplier(&app, "Alpha").await;
    for days in [0, 366] {
        let (status, _) = post(
            &app,
            "/portal/tokens",
            json!({ "supplier_id": sid, "contact_email": "c@x.example", "expires_days": days }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_enforced_roles_without_header() {
    let mut config = Config::default();
    config.server.enforce_roles = true;
    let app = app_with(config);

    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "email": "viewer@example.com", "name": "V", "role": "viewer" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_enforced_roles_with_accounts() {
    let mut db = Database::open_in_memory().unwrap();
    let mut config = Config::default();
    config.server.enforce_roles = true;

    for (email, role) in [("admin@example.com", "admin"), ("viewer@example.com", "viewer")] {
        db.create_user(sect::entities::user::NewUser {
            email: email.to_string(),
            name: email.to_string(),
            role: Some(role.parse().unwrap()),
            ..Default::default()
        })
        .unwrap();
    }
    let app = router(Arc::new(AppState::new(db, config).unwrap()));

    let body = json!({ "name": "Gated" });
    let (status, _) = send(&app, Method::POST, "/suppliers", Some(body.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/suppliers",
        Some(body.clone()),
        Some("nobody@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body_err) = send(
        &app,
        Method::POST,
        "/suppliers",
        Some(body.clone()),
        Some("viewer@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body_err["error"].as_str().unwrap().contains("suppliers:write"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/suppliers",
        Some(body),
        Some("admin@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Reads stay open
    let (status, list) = get(&app, "/suppliers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_users_lifecycle() {
    let app = app();
    let (status, user) = post(
        &app,
        "/users",
        json!({ "email": "New@Example.com", "name": "New User" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "new@example.com");
    let id = user["id"].as_i64().unwrap();

    let (status, _) = post(&app, "/users", json!({ "email": "new@example.com", "name": "Dup" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, found) = get(&app, "/users?email=new@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], id);

    let (status, updated) = put(&app, "/users", json!({ "id": id, "role": "data_steward" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "data_steward");

    let (status, gone) = delete(&app, &format!("/users?id={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gone["is_active"], false);
}

// ============================================================================
// Dashboard & chat
// ============================================================================

#[tokio::test]
async fn test_dashboard_on_empty_database() {
    let app = app();
    let (status, stats) = get(&app, "/dashboard/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["suppliers"]["total"], 0);

    let (status, trend) = get(&app, "/dashboard/emissions/trend?months=4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trend.as_array().unwrap().len(), 4);

    let (status, _) = get(&app, "/dashboard/emissions/trend?months=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, kpis) = get(&app, "/dashboard/kpis").await;
    assert_eq!(status, StatusCode::OK);
    assert!(kpis["emissions"]["trend"].is_null());

    let (status, activity) = get(&app, "/dashboard/activity?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity, json!([]));
}

#[tokio::test]
async fn test_chat_mock_routes_campaign_question() {
    let app = app();
    let (status, reply) = post(
        &app,
        "/chat",
        json!({ "message": "Comment lancer une campagne PCF ?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let agents = reply["agents_called"].as_array().unwrap();
    assert!(agents.contains(&json!("campaign_manager")));
    assert!(reply["thread_id"].is_string());

    let (status, _) = post(&app, "/chat", json!({ "message": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, graph) = get(&app, "/agents/graph").await;
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 6);
}
