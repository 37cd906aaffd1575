//! Supplier portal endpoints
//!
//! Token holders reach these without a back-office account; the token is
//! checked on every call. Issuing, listing and revoking tokens, and reviewing
//! submissions without a token, are back-office operations.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::entities::portal::{
    fingerprint, AccessToken, IssuedToken, NewPortalSubmission, PortalPatch, PortalSubmission,
    SubmissionQuery, SubmissionType, TokenQuery, TokenRequest,
};
use crate::entities::user::Permission;
use crate::server::auth::{actor, require};
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct IssuedTokenResponse {
    #[serde(flatten)]
    pub issued: IssuedToken,
    /// Ready-to-send invitation text
    pub invitation: String,
}

/// `?token=` verifies a token, `?id=` fetches one, otherwise lists
pub async fn get_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Response> {
    let mut db = state.db()?;
    if let Some(token) = query.token.as_deref() {
        let access = db.verify_token(token)?;
        return Ok(Json(access).into_response());
    }
    if let Some(id) = query.id {
        return Ok(Json(db.get_token(id)?).into_response());
    }
    Ok(Json(db.list_tokens(query.supplier_id)?).into_response())
}

pub async fn issue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut req): Json<TokenRequest>,
) -> ApiResult<(StatusCode, Json<IssuedTokenResponse>)> {
    let user = require(&state, &headers, Permission::SuppliersWrite)?;
    if req.created_by.is_none() {
        req.created_by = actor(&user);
    }

    let issued = state.db()?.issue_token(
        req,
        state.config.portal.default_expiry_days,
        &state.config.server.public_url,
    )?;
    tracing::info!(
        token_id = issued.token.id,
        supplier = issued.token.supplier_id,
        fingerprint = %fingerprint(&issued.token.token),
        "portal token issued"
    );

    let invitation = state
        .templates
        .invitation(&issued)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        StatusCode::CREATED,
        Json(IssuedTokenResponse { issued, invitation }),
    ))
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<AccessToken>> {
    require(&state, &headers, Permission::SuppliersWrite)?;
    let revoked = state
        .db()?
        .revoke_token(query.id, query.token.as_deref())?;
    tracing::info!(
        token_id = revoked.id,
        fingerprint = %fingerprint(&revoked.token),
        "portal token revoked"
    );
    Ok(Json(revoked))
}

/// `?token=` lists the token's own submissions; `?id=` fetches one (scoped to
/// the token when both are given); `?supplier_id=` or nothing is the admin list
pub async fn get_submissions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubmissionQuery>,
) -> ApiResult<Response> {
    let db = state.db()?;
    match (query.id, query.token.as_deref()) {
        (Some(id), Some(token)) => Ok(Json(db.get_submission_for_token(token, id)?).into_response()),
        (Some(id), None) => Ok(Json(db.get_submission(id)?).into_response()),
        (None, Some(token)) => Ok(Json(db.list_submissions_for_token(token)?).into_response()),
        (None, None) => Ok(Json(db.list_submissions(query.supplier_id)?).into_response()),
    }
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPortalSubmission>,
) -> ApiResult<(StatusCode, Json<PortalSubmission>)> {
    let submission = state.db()?.create_submission(req)?;
    tracing::info!(
        submission = submission.id,
        supplier = submission.supplier_id,
        kind = %submission.submission_type,
        "portal submission created"
    );
    Ok((StatusCode::CREATED, Json(submission)))
}

/// Supplier edit with `token` in the body, reviewer decision without it
pub async fn update_submission(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut patch): Json<PortalPatch>,
) -> ApiResult<Json<PortalSubmission>> {
    let id = patch
        .id
        .ok_or_else(|| ApiError::bad_request("id is required"))?;

    if patch.token.is_none() {
        let kind = state.db()?.get_submission(id)?.submission_type;
        let permission = match kind {
            SubmissionType::Imds => Permission::ImdsValidate,
            SubmissionType::Pcf => Permission::PcfValidate,
        };
        let user = require(&state, &headers, permission)?;
        if patch.reviewed_by.is_none() {
            patch.reviewed_by = actor(&user);
        }
    }

    Ok(Json(state.db()?.update_submission(id, patch)?))
}
