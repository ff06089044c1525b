//! User repository

use async_trait::async_trait;
use sqlx::PgPool;

use shamba_types::{NewUser, User, UserId};

use crate::store::UserStore;
use crate::{DbError, DbResult, DbUser};

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, created_at, updated_at";

/// User repository for registration and authentication lookups
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    async fn create(&self, user: NewUser) -> DbResult<User> {
        let email = user.email.clone();
        let row = sqlx::query_as::<_, DbUser>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(UserId::new().0)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_insert(e, "users_email_key", || format!("Email {} already exists", email))
        })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: &UserId) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn count(&self) -> DbResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
