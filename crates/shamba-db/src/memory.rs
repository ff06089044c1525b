//! In-memory stores
//!
//! Same traits as the PostgreSQL repositories, backed by maps behind one
//! `RwLock`. Listing search runs `ListingQuery::apply`, which is the
//! reference the SQL compiler follows.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use shamba_types::{
    DiscussionPost, Listing, ListingId, ListingQuery, ListingWithSeller, Message, MessageId,
    MessageWithParties, NewListing, NewMessage, NewPost, NewUser, PostId, PostWithAuthor, User,
    UserId,
};

use crate::store::{DiscussionStore, ListingStore, MessageStore, UserStore};
use crate::{DbError, DbResult};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    listings: HashMap<ListingId, Listing>,
    messages: Vec<Message>,
    posts: HashMap<PostId, DiscussionPost>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps so creation order is never a tie
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn user(&self, id: &UserId) -> DbResult<&User> {
        self.users
            .get(id)
            .ok_or_else(|| DbError::NotFound(format!("User {}", id)))
    }

    fn with_seller(&self, listing: &Listing) -> DbResult<ListingWithSeller> {
        Ok(ListingWithSeller {
            listing: listing.clone(),
            seller: self.user(&listing.seller)?.profile(),
        })
    }

    fn with_author(&self, post: &DiscussionPost) -> DbResult<PostWithAuthor> {
        Ok(PostWithAuthor {
            post: post.clone(),
            author: self.user(&post.author)?.summary(),
        })
    }
}

/// Shared in-memory backing for every store trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> DbResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate(format!("Email {} already exists", user.email)));
        }
        let now = tables.now();
        let user = User {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> DbResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(self.tables.read().await.users.len() as u64)
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn create(&self, listing: NewListing) -> DbResult<Listing> {
        let mut tables = self.tables.write().await;
        tables.user(&listing.seller)?;
        let now = tables.now();
        let listing = listing.into_listing(ListingId::new(), now);
        tables.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn find_by_id(&self, id: &ListingId) -> DbResult<Option<Listing>> {
        Ok(self.tables.read().await.listings.get(id).cloned())
    }

    async fn find_with_seller(&self, id: &ListingId) -> DbResult<Option<ListingWithSeller>> {
        let tables = self.tables.read().await;
        tables
            .listings
            .get(id)
            .map(|listing| tables.with_seller(listing))
            .transpose()
    }

    async fn search(&self, query: &ListingQuery) -> DbResult<Vec<ListingWithSeller>> {
        let tables = self.tables.read().await;
        query
            .apply(tables.listings.values().cloned())
            .iter()
            .map(|listing| tables.with_seller(listing))
            .collect()
    }

    async fn update(&self, listing: &Listing) -> DbResult<Listing> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let stored = tables
            .listings
            .get_mut(&listing.id)
            .ok_or_else(|| DbError::NotFound(format!("Listing {}", listing.id)))?;
        *stored = Listing {
            seller: stored.seller,
            created_at: stored.created_at,
            updated_at: now,
            ..listing.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: &ListingId) -> DbResult<bool> {
        Ok(self.tables.write().await.listings.remove(id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, message: NewMessage) -> DbResult<MessageWithParties> {
        let mut tables = self.tables.write().await;
        let sender = tables.user(&message.sender)?.summary();
        let recipient = tables.user(&message.recipient)?.summary();
        let now = tables.now();
        let message = message.into_message(MessageId::new(), now);
        tables.messages.push(message.clone());
        Ok(MessageWithParties {
            message,
            sender,
            recipient,
        })
    }

    async fn for_listing(&self, listing: &ListingId) -> DbResult<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.listing == *listing)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DiscussionStore for MemoryStore {
    async fn create(&self, post: NewPost) -> DbResult<PostWithAuthor> {
        let mut tables = self.tables.write().await;
        tables.user(&post.author)?;
        let now = tables.now();
        let post = post.into_post(PostId::new(), now);
        tables.posts.insert(post.id, post.clone());
        tables.with_author(&post)
    }

    async fn find_by_id(&self, id: &PostId) -> DbResult<Option<DiscussionPost>> {
        Ok(self.tables.read().await.posts.get(id).cloned())
    }

    async fn find_with_author(&self, id: &PostId) -> DbResult<Option<PostWithAuthor>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(id)
            .map(|post| tables.with_author(post))
            .transpose()
    }

    async fn list_recent(&self, limit: Option<usize>) -> DbResult<Vec<PostWithAuthor>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<&DiscussionPost> = tables.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        posts
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|post| tables.with_author(post))
            .collect()
    }

    async fn update(&self, post: &DiscussionPost) -> DbResult<PostWithAuthor> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let stored = tables
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| DbError::NotFound(format!("Discussion post {}", post.id)))?;
        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.image_url = post.image_url.clone();
        stored.updated_at = now;
        let updated = stored.clone();
        tables.with_author(&updated)
    }

    async fn delete(&self, id: &PostId) -> DbResult<bool> {
        Ok(self.tables.write().await.posts.remove(id).is_some())
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(self.tables.read().await.posts.len() as u64)
    }
}
