//! Messaging DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shamba_types::MessageWithParties;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::UserSummaryDto;

/// Message request body
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Non-empty after trimming, at most 500 characters
    pub content: String,
}

/// Stored message with both parties resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub sender: UserSummaryDto,
    pub recipient: UserSummaryDto,
    pub listing: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<MessageWithParties> for MessageDto {
    fn from(found: MessageWithParties) -> Self {
        Self {
            id: found.message.id.0,
            sender: found.sender.into(),
            recipient: found.recipient.into(),
            listing: found.message.listing.0,
            content: found.message.content,
            created_at: found.message.created_at,
        }
    }
}

/// Send response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageSentResponse {
    pub message: String,
    pub data: MessageDto,
}
