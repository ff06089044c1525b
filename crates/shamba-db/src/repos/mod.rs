//! PostgreSQL repository implementations

mod user;
mod listing;
mod message;
mod discussion;

pub use user::PgUserRepo;
pub use listing::PgListingRepo;
pub use message::PgMessageRepo;
pub use discussion::PgDiscussionRepo;
