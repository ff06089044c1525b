//! Buyer-to-seller messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationErrors};
use crate::identity::{ListingId, MessageId, UserId};
use crate::listing::Listing;
use crate::user::UserSummary;

/// Maximum message length in characters, counted before trimming
pub const MAX_MESSAGE_LEN: usize = 500;

/// A persisted message about a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub recipient: UserId,
    pub listing: ListingId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Validated message ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: UserId,
    pub recipient: UserId,
    pub listing: ListingId,
    pub content: String,
}

impl NewMessage {
    /// Address a message to the listing's seller.
    ///
    /// Fails when the sender is that seller.
    pub fn to_seller(sender: UserId, listing: &Listing, content: String) -> Result<Self> {
        if listing.is_owned_by(&sender) {
            let mut errors = ValidationErrors::new();
            errors.push("You cannot send a message to yourself about your own listing.");
            return Err(errors);
        }
        Ok(Self {
            sender,
            recipient: listing.seller,
            listing: listing.id,
            content,
        })
    }

    pub fn into_message(self, id: MessageId, now: DateTime<Utc>) -> Message {
        Message {
            id,
            sender: self.sender,
            recipient: self.recipient,
            listing: self.listing,
            content: self.content,
            created_at: now,
        }
    }
}

/// A message together with both parties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithParties {
    pub message: Message,
    pub sender: UserSummary,
    pub recipient: UserSummary,
}

/// Check raw message content and return it trimmed.
pub fn validate_message_content(raw: Option<&str>) -> Result<String> {
    let mut errors = ValidationErrors::new();
    let content = raw.unwrap_or_default();
    if content.trim().is_empty() {
        errors.push("Message content cannot be empty.");
    } else if content.chars().count() > MAX_MESSAGE_LEN {
        errors.push(format!(
            "Message content too long (max {} characters).",
            MAX_MESSAGE_LEN
        ));
    }
    errors.into_result(content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Category, Condition};
    use rust_decimal::Decimal;

    fn listing_of(seller: UserId) -> Listing {
        let now = Utc::now();
        Listing {
            id: ListingId::new(),
            title: "Knapsack sprayer".to_string(),
            description: "16 litre".to_string(),
            price: Decimal::from(3500),
            is_negotiable: true,
            category: Category::More,
            condition: Condition::New,
            location: "Kisumu".to_string(),
            images: vec![],
            seller,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_content_trimmed() {
        assert_eq!(
            validate_message_content(Some("  Is it available?  ")).unwrap(),
            "Is it available?"
        );
    }

    #[test]
    fn test_empty_content_rejected() {
        for raw in [None, Some(""), Some("   \n")] {
            let err = validate_message_content(raw).unwrap_err();
            assert_eq!(err.messages(), &["Message content cannot be empty.".to_string()]);
        }
    }

    #[test]
    fn test_length_limit() {
        assert!(validate_message_content(Some(&"a".repeat(500))).is_ok());
        let err = validate_message_content(Some(&"a".repeat(501))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Message content too long (max 500 characters)."
        );
    }

    #[test]
    fn test_recipient_is_seller() {
        let seller = UserId::new();
        let buyer = UserId::new();
        let listing = listing_of(seller);

        let message = NewMessage::to_seller(buyer, &listing, "Hi".to_string()).unwrap();
        assert_eq!(message.recipient, seller);
        assert_eq!(message.listing, listing.id);
    }

    #[test]
    fn test_self_message_rejected() {
        let seller = UserId::new();
        let listing = listing_of(seller);
        assert!(NewMessage::to_seller(seller, &listing, "Hi".to_string()).is_err());
    }
}
