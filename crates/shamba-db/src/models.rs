//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use shamba_types::{
    Category, Condition, DiscussionPost, Listing, ListingId, ListingWithSeller, Message, MessageId,
    MessageWithParties, PostId, PostWithAuthor, User, UserId, UserProfile, UserSummary,
};

use crate::DbError;

// ============================================================================
// User Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ============================================================================
// Listing Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbListing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub is_negotiable: bool,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub images: Vec<String>,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbListing> for Listing {
    type Error = DbError;

    fn try_from(row: DbListing) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: ListingId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            price: row.price,
            is_negotiable: row.is_negotiable,
            category: row.category.parse::<Category>().map_err(DbError::Corrupt)?,
            condition: row.condition.parse::<Condition>().map_err(DbError::Corrupt)?,
            location: row.location,
            images: row.images,
            seller: UserId::from_uuid(row.seller_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Listing joined with its seller's contact columns
#[derive(Debug, Clone, FromRow)]
pub struct DbListingWithSeller {
    #[sqlx(flatten)]
    pub listing: DbListing,
    pub seller_name: String,
    pub seller_email: String,
    pub seller_phone: Option<String>,
}

impl TryFrom<DbListingWithSeller> for ListingWithSeller {
    type Error = DbError;

    fn try_from(row: DbListingWithSeller) -> Result<Self, Self::Error> {
        let listing = Listing::try_from(row.listing)?;
        let seller = UserProfile {
            id: listing.seller,
            name: row.seller_name,
            email: row.seller_email,
            phone: row.seller_phone,
        };
        Ok(ListingWithSeller { listing, seller })
    }
}

// ============================================================================
// Message Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub listing_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbMessage> for Message {
    fn from(row: DbMessage) -> Self {
        Message {
            id: MessageId::from_uuid(row.id),
            sender: UserId::from_uuid(row.sender_id),
            recipient: UserId::from_uuid(row.recipient_id),
            listing: ListingId::from_uuid(row.listing_id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMessageWithParties {
    #[sqlx(flatten)]
    pub message: DbMessage,
    pub sender_name: String,
    pub sender_email: String,
    pub recipient_name: String,
    pub recipient_email: String,
}

impl From<DbMessageWithParties> for MessageWithParties {
    fn from(row: DbMessageWithParties) -> Self {
        let message = Message::from(row.message);
        MessageWithParties {
            sender: UserSummary {
                id: message.sender,
                name: row.sender_name,
                email: row.sender_email,
            },
            recipient: UserSummary {
                id: message.recipient,
                name: row.recipient_name,
                email: row.recipient_email,
            },
            message,
        }
    }
}

// ============================================================================
// Discussion Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbDiscussionPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbDiscussionPost> for DiscussionPost {
    fn from(row: DbDiscussionPost) -> Self {
        DiscussionPost {
            id: PostId::from_uuid(row.id),
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            author: UserId::from_uuid(row.author_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPostWithAuthor {
    #[sqlx(flatten)]
    pub post: DbDiscussionPost,
    pub author_name: String,
    pub author_email: String,
}

impl From<DbPostWithAuthor> for PostWithAuthor {
    fn from(row: DbPostWithAuthor) -> Self {
        let post = DiscussionPost::from(row.post);
        PostWithAuthor {
            author: UserSummary {
                id: post.author,
                name: row.author_name,
                email: row.author_email,
            },
            post,
        }
    }
}
