//! Discussion post repository

use async_trait::async_trait;
use sqlx::PgPool;

use shamba_types::{DiscussionPost, NewPost, PostId, PostWithAuthor};

use crate::store::DiscussionStore;
use crate::{DbDiscussionPost, DbError, DbPostWithAuthor, DbResult};

const POST_COLUMNS: &str = "id, title, content, image_url, author_id, created_at, updated_at";

const JOINED_COLUMNS: &str = "p.id, p.title, p.content, p.image_url, p.author_id, p.created_at, \
     p.updated_at, u.name AS author_name, u.email AS author_email";

/// Discussion post repository
pub struct PgDiscussionRepo {
    pool: PgPool,
}

impl PgDiscussionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscussionStore for PgDiscussionRepo {
    async fn create(&self, post: NewPost) -> DbResult<PostWithAuthor> {
        let id = PostId::new();
        sqlx::query(
            r#"
            INSERT INTO discussion_posts (id, title, content, image_url, author_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.0)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.author.0)
        .execute(&self.pool)
        .await?;

        self.find_with_author(&id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Discussion post {}", id)))
    }

    async fn find_by_id(&self, id: &PostId) -> DbResult<Option<DiscussionPost>> {
        let row = sqlx::query_as::<_, DbDiscussionPost>(&format!(
            "SELECT {POST_COLUMNS} FROM discussion_posts WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DiscussionPost::from))
    }

    async fn find_with_author(&self, id: &PostId) -> DbResult<Option<PostWithAuthor>> {
        let row = sqlx::query_as::<_, DbPostWithAuthor>(&format!(
            "SELECT {JOINED_COLUMNS} FROM discussion_posts p JOIN users u ON u.id = p.author_id WHERE p.id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PostWithAuthor::from))
    }

    async fn list_recent(&self, limit: Option<usize>) -> DbResult<Vec<PostWithAuthor>> {
        let limit = limit.and_then(|n| i64::try_from(n).ok());
        let rows = sqlx::query_as::<_, DbPostWithAuthor>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM discussion_posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn update(&self, post: &DiscussionPost) -> DbResult<PostWithAuthor> {
        let result = sqlx::query(
            r#"
            UPDATE discussion_posts
            SET title = $2, content = $3, image_url = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post.id.0)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Discussion post {}", post.id)));
        }

        self.find_with_author(&post.id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Discussion post {}", post.id)))
    }

    async fn delete(&self, id: &PostId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM discussion_posts WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> DbResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM discussion_posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
