//! Authentication Handlers
//!
//! Registration, login and the current-user lookup.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use shamba_db::DbError;
use shamba_types::NewUser;

use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, UserProfileDto};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::state::AppState;

const DUPLICATE_EMAIL: &str = "User with this email already exists";
const NAME_REQUIRED: &str = "Please add a name";

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    // 1. A name of only whitespace counts as missing
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation(NAME_REQUIRED.to_string()));
    }

    // 2. Reject a taken email before paying for a hash
    let existing = state.db.user_repo().find_by_email(&request.email).await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    // 3. Hash password
    state.auth.password.validate_password_strength(&request.password)?;
    let password_hash = state.auth.password.hash_password(&request.password)?;

    // 4. Persist; a concurrent registration can still win the race
    let user = state
        .db
        .user_repo()
        .create(NewUser {
            name,
            email: request.email,
            password_hash,
            phone: request.phone.filter(|p| !p.trim().is_empty()),
        })
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => ApiError::Conflict(DUPLICATE_EMAIL.to_string()),
            other => ApiError::from(other),
        })?;

    // 5. Sign token
    let token = state.auth.issue_token(&user)?;

    metrics::counter!("shamba_users_registered_total").increment(1);
    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token: token.token,
            user: UserProfileDto::from(&user),
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state.auth.login(&request.email, &request.password).await?;
    let token = state.auth.issue_token(&user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Logged in successfully".to_string(),
        token: token.token,
        user: UserProfileDto::from(&user),
    }))
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = UserProfileDto),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfileDto> {
    Json(UserProfileDto::from(&user))
}
