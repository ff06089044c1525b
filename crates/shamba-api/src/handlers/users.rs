//! User Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use shamba_types::UserId;

use crate::dto::UserProfileDto;
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

const NOT_FOUND: &str = "User not found.";

/// Public profile of any user (bearer required)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfileDto),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(_viewer): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfileDto>> {
    let id = UserId::parse(&id).map_err(|_| ApiError::NotFound(NOT_FOUND.to_string()))?;
    let user = state
        .db
        .user_repo()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(UserProfileDto::from(&user)))
}
