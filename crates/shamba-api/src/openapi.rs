//! OpenAPI Documentation
//!
//! OpenAPI 3.0 document for the Shamba marketplace API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::dto;
use crate::error::ErrorResponse;
use crate::handlers;

/// Shamba API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shamba API",
        description = "Classifieds marketplace for farm produce, livestock and equipment, with buyer-to-seller messaging and a community board.",
        version = "1.0.0"
    ),
    servers(
        (url = "http://localhost:5000", description = "Local Development")
    ),
    paths(
        // Health
        handlers::health::health_check,
        handlers::health::readiness_check,
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        // Listings
        handlers::listings::search_listings,
        handlers::listings::my_listings,
        handlers::listings::get_listing,
        handlers::listings::create_listing,
        handlers::listings::update_listing,
        handlers::listings::delete_listing,
        // Messages
        handlers::messages::send_message,
        // Users
        handlers::users::get_user,
        // Community
        handlers::community::list_discussions,
        handlers::community::get_discussion,
        handlers::community::create_discussion,
        handlers::community::update_discussion,
        handlers::community::delete_discussion,
        handlers::community::community_stats,
    ),
    components(
        schemas(
            // Common
            ErrorResponse,
            dto::MessageResponse,
            dto::UserProfileDto,
            dto::UserSummaryDto,
            dto::AuthorNameDto,
            handlers::health::HealthResponse,
            handlers::health::ReadinessResponse,
            handlers::health::ComponentStatus,
            // Auth
            dto::RegisterRequest,
            dto::LoginRequest,
            dto::AuthResponse,
            // Listings
            dto::ListingDto,
            dto::ListingForm,
            dto::ListingUpdatedResponse,
            // Messages
            dto::SendMessageRequest,
            dto::MessageDto,
            dto::MessageSentResponse,
            // Community
            dto::PostDto,
            dto::PostListItemDto,
            dto::PostForm,
            dto::PostDeletedResponse,
            dto::CommunityStatsDto,
        )
    ),
    tags(
        (name = "Health", description = "Service health and readiness"),
        (name = "Authentication", description = "Registration, login and current user"),
        (name = "Listings", description = "Marketplace listings and search"),
        (name = "Messages", description = "Buyer-to-seller messages"),
        (name = "Users", description = "Public user profiles"),
        (name = "Community", description = "Discussion board")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// The OpenAPI document as JSON
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Shamba API");
        assert_eq!(doc.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/listings",
            "/api/listings/{id}",
            "/api/listings/{id}/message",
            "/api/community/stats",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_json() {
        let json = openapi_json().unwrap();
        assert!(json.contains("Shamba API"));
        assert!(json.contains("bearer_auth"));
    }
}
