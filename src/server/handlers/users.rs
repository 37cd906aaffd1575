use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::IdQuery;
use crate::entities::user::{NewUser, Permission, User, UserPatch, UserQuery};
use crate::server::auth::require;
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

/// `?email=` (active users only), `?id=`, or every user
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Response> {
    let db = state.db()?;
    if let Some(email) = query.email.as_deref() {
        return Ok(Json(db.get_user_by_email(email)?).into_response());
    }
    if let Some(id) = query.id {
        return Ok(Json(db.get_user(id)?).into_response());
    }
    Ok(Json(db.list_users()?).into_response())
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require(&state, &headers, Permission::UsersWrite)?;
    let user = state.db()?.create_user(new)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<User>> {
    require(&state, &headers, Permission::UsersWrite)?;
    let id = patch
        .id
        .ok_or_else(|| ApiError::bad_request("id is required"))?;
    Ok(Json(state.db()?.update_user(id, patch)?))
}

pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<User>> {
    require(&state, &headers, Permission::UsersWrite)?;
    Ok(Json(state.db()?.deactivate_user(query.require()?)?))
}
