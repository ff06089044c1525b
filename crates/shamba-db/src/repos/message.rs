//! Message repository

use async_trait::async_trait;
use sqlx::PgPool;

use shamba_types::{ListingId, Message, MessageId, MessageWithParties, NewMessage};

use crate::store::MessageStore;
use crate::{DbMessage, DbMessageWithParties, DbResult};

/// Message repository
pub struct PgMessageRepo {
    pool: PgPool,
}

impl PgMessageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageRepo {
    async fn create(&self, message: NewMessage) -> DbResult<MessageWithParties> {
        let row = sqlx::query_as::<_, DbMessageWithParties>(
            r#"
            WITH inserted AS (
                INSERT INTO messages (id, sender_id, recipient_id, listing_id, content)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, sender_id, recipient_id, listing_id, content, created_at
            )
            SELECT
                m.id, m.sender_id, m.recipient_id, m.listing_id, m.content, m.created_at,
                s.name AS sender_name, s.email AS sender_email,
                r.name AS recipient_name, r.email AS recipient_email
            FROM inserted m
            JOIN users s ON s.id = m.sender_id
            JOIN users r ON r.id = m.recipient_id
            "#,
        )
        .bind(MessageId::new().0)
        .bind(message.sender.0)
        .bind(message.recipient.0)
        .bind(message.listing.0)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn for_listing(&self, listing: &ListingId) -> DbResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"
            SELECT id, sender_id, recipient_id, listing_id, content, created_at
            FROM messages
            WHERE listing_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(listing.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
