//! Messaging Handlers

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use shamba_types::{validate_message_content, ListingId, NewMessage};

use crate::dto::{MessageDto, MessageSentResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::form::{FormPayload, NO_UPLOADS};
use crate::state::AppState;

const NOT_FOUND: &str = "Listing not found.";

/// Message a listing's seller
#[utoipa::path(
    post,
    path = "/api/listings/{id}/message",
    tag = "Messages",
    params(("id" = String, Path, description = "Listing id")),
    request_body = crate::dto::SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageSentResponse),
        (status = 400, description = "Empty or oversized content, or own listing", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(listing_id): Path<String>,
    request: Request,
) -> ApiResult<(StatusCode, Json<MessageSentResponse>)> {
    let payload = FormPayload::parse(request, &NO_UPLOADS).await?;
    let content = validate_message_content(payload.text("content").as_deref())?;

    let listing_id =
        ListingId::parse(&listing_id).map_err(|_| ApiError::NotFound(NOT_FOUND.to_string()))?;
    let listing = state
        .db
        .listing_repo()
        .find_by_id(&listing_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let message = NewMessage::to_seller(user.id, &listing, content)?;
    let sent = state.db.message_repo().create(message).await?;

    metrics::counter!("shamba_messages_sent_total").increment(1);
    tracing::info!(
        message_id = %sent.message.id,
        listing_id = %listing.id,
        sender_id = %user.id,
        recipient_id = %sent.message.recipient,
        "Message sent"
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageSentResponse {
            message: "Message sent successfully!".to_string(),
            data: MessageDto::from(sent),
        }),
    ))
}
