//! API Routes
//!
//! Route definitions for all API endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Routes mounted under `/api`
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/listings", listing_routes())
        .nest("/users", user_routes())
        .nest("/community", community_routes())
}

/// Authentication routes
fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

/// Listing routes, including the buyer-to-seller message endpoint
fn listing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::listings::search_listings).post(handlers::listings::create_listing),
        )
        // Static segment wins over `/:id`
        .route("/my", get(handlers::listings::my_listings))
        .route(
            "/:id",
            get(handlers::listings::get_listing)
                .put(handlers::listings::update_listing)
                .delete(handlers::listings::delete_listing),
        )
        .route("/:id/message", post(handlers::messages::send_message))
}

/// User profile routes
fn user_routes() -> Router<Arc<AppState>> {
    Router::new().route("/:id", get(handlers::users::get_user))
}

/// Community discussion routes
fn community_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/discussions",
            get(handlers::community::list_discussions)
                .post(handlers::community::create_discussion),
        )
        .route(
            "/discussions/:id",
            get(handlers::community::get_discussion)
                .put(handlers::community::update_discussion)
                .delete(handlers::community::delete_discussion),
        )
        .route("/stats", get(handlers::community::community_stats))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
