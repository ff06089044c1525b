//! Store traits
//!
//! Handlers only ever see these traits. PostgreSQL repositories implement
//! them for production; the `mock` feature adds in-memory versions.

use async_trait::async_trait;
use shamba_types::{
    DiscussionPost, Listing, ListingId, ListingQuery, ListingWithSeller, Message,
    MessageWithParties, NewListing, NewMessage, NewPost, NewUser, PostId, PostWithAuthor, User,
    UserId,
};

use crate::DbResult;

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A taken email yields `DbError::Duplicate`.
    async fn create(&self, user: NewUser) -> DbResult<User>;

    async fn find_by_id(&self, id: &UserId) -> DbResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>>;

    async fn count(&self) -> DbResult<u64>;
}

/// Listing store
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create(&self, listing: NewListing) -> DbResult<Listing>;

    async fn find_by_id(&self, id: &ListingId) -> DbResult<Option<Listing>>;

    /// Single listing with the seller's contact details
    async fn find_with_seller(&self, id: &ListingId) -> DbResult<Option<ListingWithSeller>>;

    /// Filtered, ordered and capped per `query`
    async fn search(&self, query: &ListingQuery) -> DbResult<Vec<ListingWithSeller>>;

    /// Persist the mutable fields of `listing`. Fails with `NotFound` when
    /// the row is gone.
    async fn update(&self, listing: &Listing) -> DbResult<Listing>;

    /// Returns whether a row was removed
    async fn delete(&self, id: &ListingId) -> DbResult<bool>;
}

/// Message store
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, message: NewMessage) -> DbResult<MessageWithParties>;

    /// Messages about one listing, oldest first
    async fn for_listing(&self, listing: &ListingId) -> DbResult<Vec<Message>>;
}

/// Discussion store
#[async_trait]
pub trait DiscussionStore: Send + Sync {
    async fn create(&self, post: NewPost) -> DbResult<PostWithAuthor>;

    async fn find_by_id(&self, id: &PostId) -> DbResult<Option<DiscussionPost>>;

    async fn find_with_author(&self, id: &PostId) -> DbResult<Option<PostWithAuthor>>;

    /// Newest first, optionally capped
    async fn list_recent(&self, limit: Option<usize>) -> DbResult<Vec<PostWithAuthor>>;

    async fn update(&self, post: &DiscussionPost) -> DbResult<PostWithAuthor>;

    async fn delete(&self, id: &PostId) -> DbResult<bool>;

    async fn count(&self) -> DbResult<u64>;
}
