//! API Handlers
//!
//! Request handlers for all API endpoints.

pub mod auth;
pub mod community;
pub mod health;
pub mod listings;
pub mod messages;
pub mod users;
