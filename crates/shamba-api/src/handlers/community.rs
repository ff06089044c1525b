//! Community Handlers
//!
//! Discussion board CRUD (author-only mutation) and board statistics.

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use shamba_types::{parse_limit, uploaded_file_name, CommunityStats, PostId};

use crate::assets::{discussion_image_url, FileNaming};
use crate::dto::{CommunityStatsDto, LimitParams, PostDeletedResponse, PostDto, PostListItemDto};
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::form::{FormPayload, DISCUSSION_IMAGE};
use crate::state::AppState;

const NOT_FOUND: &str = "Discussion post not found";

fn post_id(raw: &str) -> ApiResult<PostId> {
    PostId::parse(raw).map_err(|_| ApiError::NotFound(NOT_FOUND.to_string()))
}

/// Save the attachment, if any, and return its `imageUrl`
async fn store_attachment(state: &AppState, payload: &FormPayload) -> ApiResult<Option<String>> {
    match payload.files().first() {
        Some(file) => {
            let name = state.images.save(file, FileNaming::Prefixed("image")).await?;
            Ok(Some(discussion_image_url(&name)))
        }
        None => Ok(None),
    }
}

/// List posts, newest first
#[utoipa::path(
    get,
    path = "/api/community/discussions",
    tag = "Community",
    params(("limit" = Option<String>, Query, description = "Maximum number of posts")),
    responses(
        (status = 200, description = "Posts", body = Vec<PostListItemDto>)
    )
)]
pub async fn list_discussions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<PostListItemDto>>> {
    let posts = state
        .db
        .discussion_repo()
        .list_recent(parse_limit(params.limit.as_deref()))
        .await?;

    Ok(Json(posts.into_iter().map(PostListItemDto::from).collect()))
}

/// Single post
#[utoipa::path(
    get,
    path = "/api/community/discussions/{id}",
    tag = "Community",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = PostDto),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_discussion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PostDto>> {
    let id = post_id(&id)?;
    let found = state
        .db
        .discussion_repo()
        .find_with_author(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(PostDto::from(found)))
}

/// Create a post
#[utoipa::path(
    post,
    path = "/api/community/discussions",
    tag = "Community",
    request_body(content = crate::dto::PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Missing title or content", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_discussion(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    request: Request,
) -> ApiResult<(StatusCode, Json<PostDto>)> {
    let payload = FormPayload::parse(request, &DISCUSSION_IMAGE).await?;
    let uploaded = store_attachment(&state, &payload).await?;

    let result = match payload.post_draft().into_new_post(user.id, uploaded.clone()) {
        Ok(post) => state.db.discussion_repo().create(post).await.map_err(ApiError::from),
        Err(e) => Err(e.into()),
    };
    let created = match result {
        Ok(created) => created,
        Err(e) => {
            state.images.remove_detached(uploaded);
            return Err(e);
        }
    };

    tracing::info!(post_id = %created.post.id, author_id = %user.id, "Discussion post created");

    Ok((StatusCode::CREATED, Json(PostDto::from(created))))
}

/// Update a post (author only)
#[utoipa::path(
    put,
    path = "/api/community/discussions/{id}",
    tag = "Community",
    params(("id" = String, Path, description = "Post id")),
    request_body(content = crate::dto::PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Empty title or content", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_discussion(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult<Json<PostDto>> {
    let id = post_id(&id)?;
    let mut post = state
        .db
        .discussion_repo()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !post.is_authored_by(&user.id) {
        return Err(ApiError::Forbidden(
            "User not authorized to update this post".to_string(),
        ));
    }

    let payload = FormPayload::parse(request, &DISCUSSION_IMAGE).await?;
    let uploaded = store_attachment(&state, &payload).await?;

    let changes = match payload
        .post_draft()
        .into_changes(uploaded.clone(), &post.image_url)
    {
        Ok(changes) => changes,
        Err(e) => {
            state.images.remove_detached(uploaded);
            return Err(e.into());
        }
    };
    let replaced = post.apply(changes, Utc::now());

    let updated = match state.db.discussion_repo().update(&post).await {
        Ok(updated) => updated,
        Err(e) => {
            state.images.remove_detached(uploaded);
            return Err(e.into());
        }
    };
    if let Some(old) = replaced {
        // Only this post's own uploads can be stored under /uploads/
        state.images.remove_detached(uploaded_file_name(&old).map(|_| old.as_str()));
    }

    tracing::info!(post_id = %updated.post.id, "Discussion post updated");

    Ok(Json(PostDto::from(updated)))
}

/// Delete a post (author only)
#[utoipa::path(
    delete,
    path = "/api/community/discussions/{id}",
    tag = "Community",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = PostDeletedResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_discussion(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<PostDeletedResponse>> {
    let id = post_id(&id)?;
    let post = state
        .db
        .discussion_repo()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !post.is_authored_by(&user.id) {
        return Err(ApiError::Forbidden(
            "User not authorized to delete this post".to_string(),
        ));
    }

    if !state.db.discussion_repo().delete(&id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    state.images.remove_detached(post.uploaded_image());

    tracing::info!(post_id = %id, author_id = %user.id, "Discussion post deleted");

    Ok(Json(PostDeletedResponse {
        message: "Discussion post deleted successfully".to_string(),
        id,
    }))
}

/// Board statistics
#[utoipa::path(
    get,
    path = "/api/community/stats",
    tag = "Community",
    responses(
        (status = 200, description = "Statistics", body = CommunityStatsDto)
    )
)]
pub async fn community_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CommunityStatsDto>> {
    let total_posts = state.db.discussion_repo().count().await?;
    let total_members = state.db.user_repo().count().await?;

    Ok(Json(CommunityStats::new(total_posts, total_members).into()))
}
