use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use crate::entities::campaign::{
    Campaign, CampaignFilter, CampaignPatch, CampaignStats, CampaignSummary, CampaignSupplier,
    CampaignTotals, Enrollment, NewCampaign, ParticipationUpdate,
};
use crate::entities::user::Permission;
use crate::server::auth::{actor, require};
use crate::server::error::ApiResult;
use crate::server::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CampaignFilter>,
) -> ApiResult<Json<Vec<CampaignSummary>>> {
    Ok(Json(state.db()?.list_campaigns(&filter)?))
}

pub async fn totals(State(state): State<Arc<AppState>>) -> ApiResult<Json<CampaignTotals>> {
    Ok(Json(state.db()?.campaign_totals()?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CampaignSummary>> {
    Ok(Json(state.db()?.campaign_summary(id)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut new): Json<NewCampaign>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let user = require(&state, &headers, Permission::CampaignsWrite)?;
    if new.created_by.is_none() {
        new.created_by = actor(&user);
    }
    let campaign = state.db()?.create_campaign(new)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<CampaignPatch>,
) -> ApiResult<Json<Campaign>> {
    require(&state, &headers, Permission::CampaignsWrite)?;
    Ok(Json(state.db()?.update_campaign(id, patch)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Campaign>> {
    require(&state, &headers, Permission::CampaignsDelete)?;
    Ok(Json(state.db()?.delete_campaign(id)?))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CampaignStats>> {
    Ok(Json(state.db()?.campaign_stats(id)?))
}

pub async fn suppliers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<CampaignSupplier>>> {
    Ok(Json(state.db()?.campaign_suppliers(id)?))
}

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Enrollment>,
) -> ApiResult<Json<Value>> {
    require(&state, &headers, Permission::CampaignsWrite)?;
    let added = state.db()?.add_campaign_suppliers(id, &body.supplier_ids)?;
    Ok(Json(json!({ "campaign_id": id, "added": added })))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, supplier_id)): Path<(i64, i64)>,
    Json(update): Json<ParticipationUpdate>,
) -> ApiResult<Json<CampaignSupplier>> {
    require(&state, &headers, Permission::CampaignsWrite)?;
    Ok(Json(state.db()?.set_supplier_status(id, supplier_id, update)?))
}

pub async fn remind(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, supplier_id)): Path<(i64, i64)>,
) -> ApiResult<Json<CampaignSupplier>> {
    require(&state, &headers, Permission::CampaignsWrite)?;
    Ok(Json(state.db()?.record_reminder(id, supplier_id)?))
}
