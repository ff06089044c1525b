//! Common DTOs shared across endpoints

use serde::{Deserialize, Serialize};
use shamba_types::{User, UserProfile, UserSummary};
use utoipa::ToSchema;
use uuid::Uuid;

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `?limit=` on list endpoints; non-numeric or non-positive is ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

/// Public profile: identity and contact details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<UserProfile> for UserProfileDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.0,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
        }
    }
}

impl From<&User> for UserProfileDto {
    fn from(user: &User) -> Self {
        user.profile().into()
    }
}

/// Name and email, used for message parties and post authors
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummaryDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<UserSummary> for UserSummaryDto {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id.0,
            name: summary.name,
            email: summary.email,
        }
    }
}

/// Name only, used in the discussion list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorNameDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

impl From<UserSummary> for AuthorNameDto {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id.0,
            name: summary.name,
        }
    }
}
