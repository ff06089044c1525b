//! Listing DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shamba_types::{Listing, ListingWithSeller};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::UserProfileDto;
use crate::extractors::RequestOrigin;

/// Seller as stored (id) or resolved (profile)
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SellerRef {
    Id(Uuid),
    Profile(UserProfileDto),
}

/// Listing as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub is_negotiable: bool,
    pub category: String,
    pub condition: String,
    pub location: String,
    /// Absolute image URLs
    pub images: Vec<String>,
    /// Seller id, or `{_id, name, email, phone}` when resolved
    #[schema(value_type = Object)]
    pub seller: SellerRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingDto {
    fn build(listing: Listing, seller: SellerRef, origin: &RequestOrigin) -> Self {
        Self {
            id: listing.id.0,
            title: listing.title,
            description: listing.description,
            price: listing.price,
            is_negotiable: listing.is_negotiable,
            category: listing.category.to_string(),
            condition: listing.condition.to_string(),
            location: listing.location,
            images: listing.images.iter().map(|path| origin.url(path)).collect(),
            seller,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }

    /// Seller left as the owner id (create/update responses)
    pub fn owned(listing: Listing, origin: &RequestOrigin) -> Self {
        let seller = SellerRef::Id(listing.seller.0);
        Self::build(listing, seller, origin)
    }

    /// Seller resolved to contact details (search/detail)
    pub fn populated(found: ListingWithSeller, origin: &RequestOrigin) -> Self {
        let seller = SellerRef::Profile(found.seller.into());
        Self::build(found.listing, seller, origin)
    }
}

/// Update response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingUpdatedResponse {
    pub message: String,
    pub listing: ListingDto,
}

/// Multipart body for create/update (documentation only)
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingForm {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Non-negative number
    pub price: Option<String>,
    /// `true` marks the price negotiable
    pub is_negotiable: Option<String>,
    /// One of the fixed categories, e.g. `Tractors and Machinery`
    pub category: Option<String>,
    /// `New`, `Used - Like New`, `Used - Good`, `Used - Fair` or `For Parts`
    pub condition: Option<String>,
    pub location: Option<String>,
    /// Update only: stored paths or URLs of images to keep; repeatable
    pub existing_images: Option<Vec<String>>,
    /// Up to five jpeg/jpg/png/gif files, 5 MiB each
    pub images: Option<Vec<String>>,
}
