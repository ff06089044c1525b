//! JWT Token Service
//!
//! HS256 bearer tokens carrying the user id as `sub`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use shamba_types::UserId;

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{IssuedToken, TokenClaims};

/// JWT service for token management
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Sign a token for `user_id`
    pub fn issue(&self, user_id: UserId) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let lifetime = Duration::from_std(self.config.token_lifetime)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.issue_at(user_id, now.timestamp(), (now + lifetime).timestamp())
    }

    fn issue_at(&self, user_id: UserId, iat: i64, exp: i64) -> AuthResult<IssuedToken> {
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat,
            exp,
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to encode token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Verify signature, issuer and expiry
    pub fn validate(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Validate and return the user id the token was issued to
    pub fn user_id(&self, token: &str) -> AuthResult<UserId> {
        let claims = self.validate(token)?;
        UserId::parse(&claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}
