//! Shamba Authentication Layer
//!
//! - **Passwords**: Argon2id hashing with optional pepper
//! - **Tokens**: HS256 JWTs carrying the user id, four-day default lifetime
//! - **Bearer resolution**: `Authorization` header → verified token → live user
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//!   bearer_token ──► JwtService::user_id ──► UserStore::find_by_id
//!        │                   │                        │
//!   MissingToken     InvalidToken/TokenExpired   UserNotFound
//! ```

pub mod bearer;
pub mod config;
pub mod error;
pub mod jwt;
pub mod password;
pub mod types;

pub use bearer::bearer_token;
pub use config::{AuthConfig, JwtConfig, PasswordConfig, PLACEHOLDER_SECRET};
pub use error::{AuthError, AuthResult};
pub use jwt::JwtService;
pub use password::PasswordService;
pub use types::*;

use std::sync::Arc;

use http::HeaderMap;
use shamba_db::Database;
use shamba_types::User;

/// Main authentication service
#[derive(Clone)]
pub struct AuthService {
    pub jwt: JwtService,
    pub password: PasswordService,
    db: Arc<Database>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: Arc<Database>, config: AuthConfig) -> Self {
        Self {
            jwt: JwtService::new(config.jwt.clone()),
            password: PasswordService::new(config.password.clone()),
            db,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Resolve the request's bearer token to a live user
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthResult<User> {
        let token = bearer_token(headers)?;
        let user_id = self.jwt.user_id(token)?;

        let user = self
            .db
            .user_repo()
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::debug!(user_id = %user.id, "Bearer token accepted");
        Ok(user)
    }

    /// Check credentials. Unknown email and wrong password are the same
    /// error.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let Some(user) = self.db.user_repo().find_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.password.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Sign a token for a user
    pub fn issue_token(&self, user: &User) -> AuthResult<IssuedToken> {
        self.jwt.issue(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;
    use http::HeaderValue;
    use shamba_types::{NewUser, UserId};

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt: JwtConfig {
                secret: "unit-test-secret".to_string(),
                ..Default::default()
            },
            password: PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                ..Default::default()
            },
        }
    }

    async fn service_with_user() -> (AuthService, User) {
        let db = Arc::new(Database::new_mock());
        let auth = AuthService::new(db.clone(), test_config());
        let hash = auth.password.hash_password("shamba123").unwrap();
        let user = db
            .user_repo()
            .create(NewUser {
                name: "Achieng".to_string(),
                email: "achieng@example.com".to_string(),
                password_hash: hash,
                phone: None,
            })
            .await
            .unwrap();
        (auth, user)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_authenticate_resolves_user() {
        let (auth, user) = service_with_user().await;
        let token = auth.issue_token(&user).unwrap();

        let found = auth.authenticate(&bearer(&token.token)).await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_orphaned_token() {
        let (auth, _) = service_with_user().await;
        let token = auth.jwt.issue(UserId::new()).unwrap();

        let result = auth.authenticate(&bearer(&token.token)).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let (auth, _) = service_with_user().await;

        let wrong_password = auth.login("achieng@example.com", "nope123").await.unwrap_err();
        let unknown_email = auth.login("nobody@example.com", "shamba123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_login_success() {
        let (auth, user) = service_with_user().await;
        let found = auth.login("achieng@example.com", "shamba123").await.unwrap();
        assert_eq!(found.id, user.id);
    }
}
