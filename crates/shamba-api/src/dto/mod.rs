//! Data Transfer Objects
//!
//! Request and response types for API endpoints. Identifiers are exposed
//! as `_id` for client compatibility.

pub mod auth;
pub mod common;
pub mod discussion;
pub mod listing;
pub mod message;

pub use auth::*;
pub use common::*;
pub use discussion::*;
pub use listing::*;
pub use message::*;
