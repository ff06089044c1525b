//! Community DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shamba_types::{DiscussionPost, PostId, PostWithAuthor};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{AuthorNameDto, UserSummaryDto};

/// Post with its author as `{_id, name, email}`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// `/uploads/<file>`, a caller-supplied URL, or empty
    pub image_url: String,
    pub author: UserSummaryDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostWithAuthor> for PostDto {
    fn from(found: PostWithAuthor) -> Self {
        let DiscussionPost {
            id,
            title,
            content,
            image_url,
            created_at,
            updated_at,
            ..
        } = found.post;
        Self {
            id: id.0,
            title,
            content,
            image_url,
            author: found.author.into(),
            created_at,
            updated_at,
        }
    }
}

/// List entry: author reduced to `{_id, name}`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostListItemDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author: AuthorNameDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostWithAuthor> for PostListItemDto {
    fn from(found: PostWithAuthor) -> Self {
        let PostDto {
            id,
            title,
            content,
            image_url,
            author,
            created_at,
            updated_at,
        } = PostDto::from(found);
        Self {
            id,
            title,
            content,
            image_url,
            author: AuthorNameDto {
                id: author.id,
                name: author.name,
            },
            created_at,
            updated_at,
        }
    }
}

/// Delete response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostDeletedResponse {
    pub message: String,
    #[schema(value_type = String)]
    pub id: PostId,
}

/// Multipart body for create/update (documentation only)
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Used when no file is uploaded; on update, an empty value clears it
    pub image_url: Option<String>,
    /// One jpeg/jpg/png/gif/webp file, 5 MiB max
    #[schema(value_type = String, format = Binary)]
    pub image: Option<String>,
}

/// Community statistics
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStatsDto {
    pub total_posts: u64,
    pub total_members: u64,
    pub active_discussions: u64,
    pub new_posts_this_week: u64,
    pub online_now: u64,
}

impl From<shamba_types::CommunityStats> for CommunityStatsDto {
    fn from(stats: shamba_types::CommunityStats) -> Self {
        Self {
            total_posts: stats.total_posts,
            total_members: stats.total_members,
            active_discussions: stats.active_discussions,
            new_posts_this_week: stats.new_posts_this_week,
            online_now: stats.online_now,
        }
    }
}
