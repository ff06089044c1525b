//! Shamba Types - Canonical domain types for the farm marketplace
//!
//! This crate contains the foundational types for Shamba with zero
//! dependencies on other shamba crates. It defines:
//!
//! - Identity types (UserId, ListingId, MessageId, PostId)
//! - Users and their public projections
//! - Listings, their closed category/condition sets and field rules
//! - The listing query engine (search params → typed query → matches/order)
//! - Buyer-to-seller messages
//! - Community discussion posts and board statistics
//!
//! # Invariants
//!
//! 1. A listing belongs to exactly one seller; only that seller mutates it
//! 2. Prices are never negative
//! 3. A message is never addressed to the sender's own listing
//! 4. Credential hashes never leave the persistence/auth layers

pub mod identity;
pub mod user;
pub mod listing;
pub mod query;
pub mod message;
pub mod discussion;
pub mod error;

pub use identity::*;
pub use user::*;
pub use listing::*;
pub use query::*;
pub use message::*;
pub use discussion::*;
pub use error::*;
