use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::IdQuery;
use crate::entities::imds::{ImdsPatch, ImdsQuery, ImdsStatus, ImdsSubmission, NewImdsSubmission};
use crate::entities::user::Permission;
use crate::server::auth::require;
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

/// `?id=` returns one submission, otherwise a filtered list
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImdsQuery>,
) -> ApiResult<Response> {
    let db = state.db()?;
    Ok(match query.id {
        Some(id) => Json(db.get_imds(id)?).into_response(),
        None => Json(db.list_imds(&query)?).into_response(),
    })
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewImdsSubmission>,
) -> ApiResult<(StatusCode, Json<ImdsSubmission>)> {
    require(&state, &headers, Permission::ImdsWrite)?;
    let submission = state.db()?.create_imds(new)?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<ImdsPatch>,
) -> ApiResult<Json<ImdsSubmission>> {
    let permission = match patch.status {
        Some(ImdsStatus::Validated | ImdsStatus::Rejected) => Permission::ImdsValidate,
        _ => Permission::ImdsWrite,
    };
    require(&state, &headers, permission)?;
    let id = patch
        .id
        .ok_or_else(|| ApiError::bad_request("id is required"))?;
    Ok(Json(state.db()?.update_imds(id, patch)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<ImdsSubmission>> {
    require(&state, &headers, Permission::ImdsWrite)?;
    Ok(Json(state.db()?.delete_imds(query.require()?)?))
}
