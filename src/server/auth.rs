//! Role checks for mutating endpoints
//!
//! Only active when `server.enforce_roles` is set. The caller names itself
//! with an `x-sect-user: <email>` header; authentication proper is left to
//! whatever sits in front of the API.

use axum::http::HeaderMap;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::core::error::DbError;
use crate::entities::user::{Permission, User};

pub const USER_HEADER: &str = "x-sect-user";

/// Check that the caller may use `permission`.
///
/// Returns the calling user when roles are enforced, `None` otherwise.
pub fn require(state: &AppState, headers: &HeaderMap, permission: Permission) -> ApiResult<Option<User>> {
    if !state.config.server.enforce_roles {
        return Ok(None);
    }

    let email = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::unauthorized(format!("missing {} header", USER_HEADER)))?;

    let user = match state.db()?.get_user_by_email(email) {
        Ok(user) => user,
        Err(DbError::NotFound { .. }) => {
            return Err(ApiError::unauthorized(format!("unknown user {}", email)));
        }
        Err(e) => return Err(e.into()),
    };

    if !user.role.can(permission) {
        tracing::info!(user = %user.email, role = %user.role, %permission, "permission denied");
        return Err(ApiError::forbidden(format!(
            "role {} lacks permission {}",
            user.role, permission
        )));
    }
    Ok(Some(user))
}

/// Email of the caller, for `created_by` columns
pub fn actor(user: &Option<User>) -> Option<String> {
    user.as_ref().map(|u| u.email.clone())
}
