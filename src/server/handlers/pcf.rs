use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::IdQuery;
use crate::entities::pcf::{
    NewPcfDeclaration, PcfDeclaration, PcfPatch, PcfQuery, ReviewNote, ValidationStatus,
};
use crate::entities::user::Permission;
use crate::server::auth::require;
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

/// `?id=` returns one declaration, otherwise a filtered list
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PcfQuery>,
) -> ApiResult<Response> {
    let db = state.db()?;
    Ok(match query.id {
        Some(id) => Json(db.get_pcf(id)?).into_response(),
        None => Json(db.list_pcf(&query)?).into_response(),
    })
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewPcfDeclaration>,
) -> ApiResult<(StatusCode, Json<PcfDeclaration>)> {
    require(&state, &headers, Permission::PcfWrite)?;
    let declaration = state.db()?.create_pcf(new)?;
    Ok((StatusCode::CREATED, Json(declaration)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<PcfPatch>,
) -> ApiResult<Json<PcfDeclaration>> {
    let permission = match patch.validation_status {
        Some(ValidationStatus::Validated | ValidationStatus::Rejected) => Permission::PcfValidate,
        _ => Permission::PcfWrite,
    };
    require(&state, &headers, permission)?;
    let id = patch
        .id
        .ok_or_else(|| ApiError::bad_request("id is required"))?;
    Ok(Json(state.db()?.update_pcf(id, patch)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<PcfDeclaration>> {
    require(&state, &headers, Permission::PcfWrite)?;
    Ok(Json(state.db()?.delete_pcf(query.require()?)?))
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<ReviewNote>>,
) -> ApiResult<Json<PcfDeclaration>> {
    require(&state, &headers, Permission::PcfValidate)?;
    let notes = body.and_then(|Json(b)| b.notes);
    Ok(Json(state.db()?.validate_pcf(id, notes)?))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<ReviewNote>>,
) -> ApiResult<Json<PcfDeclaration>> {
    require(&state, &headers, Permission::PcfValidate)?;
    let reason = body
        .and_then(|Json(b)| b.reason.or(b.notes))
        .unwrap_or_default();
    Ok(Json(state.db()?.reject_pcf(id, &reason)?))
}
