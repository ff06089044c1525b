//! Listing Handlers
//!
//! Search, detail, and owner-only create/update/delete. Update and delete
//! hold the listing's lock from load to store write, and ownership is
//! settled before the body is read.

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use shamba_types::{ImagePlan, ListingId, ListingQuery, ListingSearchParams, parse_limit};

use crate::assets::{listing_image_path, stored_path, FileNaming};
use crate::dto::{ListingDto, ListingUpdatedResponse, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, RequestOrigin};
use crate::form::{FormPayload, LISTING_IMAGES};
use crate::state::AppState;

const NOT_FOUND: &str = "Listing not found";
const MISSING_FIELDS: &str =
    "Missing required fields: title, location, category, description, and price are mandatory.";

fn listing_id(raw: &str) -> ApiResult<ListingId> {
    ListingId::parse(raw).map_err(|_| ApiError::NotFound(NOT_FOUND.to_string()))
}

/// Search listings
#[utoipa::path(
    get,
    path = "/api/listings",
    tag = "Listings",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive substring of title, description or location"),
        ("category" = Option<String>, Query, description = "Exact category; empty means all"),
        ("minPrice" = Option<String>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<String>, Query, description = "Inclusive upper price bound"),
        ("sortBy" = Option<String>, Query, description = "priceAsc, priceDesc or newest (default)"),
        ("limit" = Option<String>, Query, description = "Maximum number of results")
    ),
    responses(
        (status = 200, description = "Matching listings", body = Vec<ListingDto>)
    )
)]
pub async fn search_listings(
    State(state): State<Arc<AppState>>,
    origin: RequestOrigin,
    Query(params): Query<ListingSearchParams>,
) -> ApiResult<Json<Vec<ListingDto>>> {
    let query = ListingQuery::from_params(&params);
    let found = state.db.listing_repo().search(&query).await?;

    tracing::debug!(
        results = found.len(),
        sort = query.sort.as_str(),
        "Listing search"
    );

    Ok(Json(
        found
            .into_iter()
            .map(|l| ListingDto::populated(l, &origin))
            .collect(),
    ))
}

/// The caller's own listings, newest first
#[utoipa::path(
    get,
    path = "/api/listings/my",
    tag = "Listings",
    params(("limit" = Option<String>, Query, description = "Maximum number of results")),
    responses(
        (status = 200, description = "Caller's listings", body = Vec<ListingDto>),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_listings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    origin: RequestOrigin,
    Query(params): Query<ListingSearchParams>,
) -> ApiResult<Json<Vec<ListingDto>>> {
    let query = ListingQuery::for_seller(user.id).with_limit(parse_limit(params.limit.as_deref()));
    let found = state.db.listing_repo().search(&query).await?;

    Ok(Json(
        found
            .into_iter()
            .map(|l| ListingDto::populated(l, &origin))
            .collect(),
    ))
}

/// Single listing
#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = ListingDto),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    origin: RequestOrigin,
    Path(id): Path<String>,
) -> ApiResult<Json<ListingDto>> {
    let id = listing_id(&id)?;
    let found = state
        .db
        .listing_repo()
        .find_with_seller(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(ListingDto::populated(found, &origin)))
}

/// Create a listing
#[utoipa::path(
    post,
    path = "/api/listings",
    tag = "Listings",
    request_body(content = crate::dto::ListingForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Listing created", body = ListingDto),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    origin: RequestOrigin,
    request: Request,
) -> ApiResult<(StatusCode, Json<ListingDto>)> {
    let payload = FormPayload::parse(request, &LISTING_IMAGES).await?;
    let draft = payload.listing_draft();

    if !draft.missing_required().is_empty() {
        return Err(ApiError::BadRequest(MISSING_FIELDS.to_string()));
    }

    // Validate before anything is written to disk
    let mut new_listing = draft
        .into_new_listing(user.id, Vec::new())
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let stored: Vec<String> = state
        .images
        .save_all(payload.files(), FileNaming::Original)
        .await?
        .iter()
        .map(|name| listing_image_path(name))
        .collect();
    new_listing.images = stored.clone();

    let listing = match state.db.listing_repo().create(new_listing).await {
        Ok(listing) => listing,
        Err(e) => {
            state.images.remove_detached(&stored);
            return Err(e.into());
        }
    };

    metrics::counter!("shamba_listings_created_total").increment(1);
    tracing::info!(
        listing_id = %listing.id,
        seller_id = %user.id,
        images = listing.images.len(),
        "Listing created"
    );

    Ok((StatusCode::CREATED, Json(ListingDto::owned(listing, &origin))))
}

/// Update a listing (owner only)
///
/// `existingImages` lists the stored images to keep; every other stored
/// image is removed and new uploads are appended after the kept ones.
#[utoipa::path(
    put,
    path = "/api/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    request_body(content = crate::dto::ListingForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Listing updated", body = ListingUpdatedResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not the seller", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    origin: RequestOrigin,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult<Json<ListingUpdatedResponse>> {
    let id = listing_id(&id)?;
    let _guard = state.listing_locks.lock(id).await;

    let mut listing = state
        .db
        .listing_repo()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !listing.is_owned_by(&user.id) {
        return Err(ApiError::Forbidden(
            "Not authorized to update this listing. You are not the owner.".to_string(),
        ));
    }

    let payload = FormPayload::parse(request, &LISTING_IMAGES).await?;
    let changes = payload
        .listing_draft()
        .into_changes()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let retain: Vec<String> = payload
        .all("existingImages")
        .iter()
        .map(|reference| stored_path(reference))
        .collect();

    let uploaded: Vec<String> = state
        .images
        .save_all(payload.files(), FileNaming::Original)
        .await?
        .iter()
        .map(|name| listing_image_path(name))
        .collect();

    let plan = ImagePlan::reconcile(&listing.images, &retain, uploaded.clone());
    listing.apply(changes, plan.images, Utc::now());

    let updated = match state.db.listing_repo().update(&listing).await {
        Ok(updated) => updated,
        Err(e) => {
            state.images.remove_detached(&uploaded);
            return Err(e.into());
        }
    };
    state.images.remove_detached(&plan.removed);

    tracing::info!(
        listing_id = %updated.id,
        added = uploaded.len(),
        removed = plan.removed.len(),
        "Listing updated"
    );

    Ok(Json(ListingUpdatedResponse {
        message: "Listing updated successfully".to_string(),
        listing: ListingDto::owned(updated, &origin),
    }))
}

/// Delete a listing and its image files (owner only)
#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    tag = "Listings",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not the seller", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = listing_id(&id)?;
    let _guard = state.listing_locks.lock(id).await;

    let listing = state
        .db
        .listing_repo()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !listing.is_owned_by(&user.id) {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this listing. You are not the owner.".to_string(),
        ));
    }

    if !state.db.listing_repo().delete(&id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    state.images.remove_detached(&listing.images);

    tracing::info!(listing_id = %id, seller_id = %user.id, "Listing deleted");

    Ok(Json(MessageResponse::new("Listing deleted successfully")))
}
