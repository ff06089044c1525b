//! Marketplace listings
//!
//! A listing is an item for sale owned by exactly one seller. Category and
//! condition are closed sets; their wire strings are exact and
//! case-sensitive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationErrors};
use crate::identity::{ListingId, UserId};
use crate::user::UserProfile;

/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 1000;
/// Maximum number of images accepted per create/update request
pub const MAX_IMAGES_PER_REQUEST: usize = 5;

/// Listing category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Tractors and Machinery")]
    TractorsAndMachinery,
    #[serde(rename = "Fertilizers")]
    Fertilizers,
    #[serde(rename = "Crop Seeds")]
    CropSeeds,
    #[serde(rename = "Irrigation Systems")]
    IrrigationSystems,
    #[serde(rename = "Veggies")]
    Veggies,
    #[serde(rename = "More")]
    More,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::TractorsAndMachinery,
        Category::Fertilizers,
        Category::CropSeeds,
        Category::IrrigationSystems,
        Category::Veggies,
        Category::More,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TractorsAndMachinery => "Tractors and Machinery",
            Self::Fertilizers => "Fertilizers",
            Self::CropSeeds => "Crop Seeds",
            Self::IrrigationSystems => "Irrigation Systems",
            Self::Veggies => "Veggies",
            Self::More => "More",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("`{}` is not a valid category", s))
    }
}

/// Physical condition of the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Used - Like New")]
    UsedLikeNew,
    #[default]
    #[serde(rename = "Used - Good")]
    UsedGood,
    #[serde(rename = "Used - Fair")]
    UsedFair,
    #[serde(rename = "For Parts")]
    ForParts,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::New,
        Condition::UsedLikeNew,
        Condition::UsedGood,
        Condition::UsedFair,
        Condition::ForParts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::UsedLikeNew => "Used - Like New",
            Self::UsedGood => "Used - Good",
            Self::UsedFair => "Used - Fair",
            Self::ForParts => "For Parts",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("`{}` is not a valid condition", s))
    }
}

/// A persisted listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub is_negotiable: bool,
    pub category: Category,
    pub condition: Condition,
    pub location: String,
    /// Stored paths relative to the server root, e.g. `uploads/plough-1.jpg`
    pub images: Vec<String>,
    pub seller: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Ownership compares identifiers, never display names or emails.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.seller == *user
    }

    /// Apply validated changes and the reconciled image list
    pub fn apply(&mut self, changes: ListingChanges, images: Vec<String>, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(is_negotiable) = changes.is_negotiable {
            self.is_negotiable = is_negotiable;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(condition) = changes.condition {
            self.condition = condition;
        }
        if let Some(location) = changes.location {
            self.location = location;
        }
        self.images = images;
        self.updated_at = now;
    }
}

/// A listing with its seller's contact details resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ListingWithSeller {
    pub listing: Listing,
    pub seller: UserProfile,
}

/// Validated input for a new listing
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub is_negotiable: bool,
    pub category: Category,
    pub condition: Condition,
    pub location: String,
    pub images: Vec<String>,
    pub seller: UserId,
}

impl NewListing {
    /// Materialize as a stored listing with a fresh identifier
    pub fn into_listing(self, id: ListingId, now: DateTime<Utc>) -> Listing {
        Listing {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            is_negotiable: self.is_negotiable,
            category: self.category,
            condition: self.condition,
            location: self.location,
            images: self.images,
            seller: self.seller,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_negotiable: Option<bool>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub location: Option<String>,
}

/// Untyped listing fields as they arrive in a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub is_negotiable: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
}

impl ListingDraft {
    /// Names of creation fields that are absent or blank.
    ///
    /// Price only counts as missing when the field is absent entirely; a
    /// present but unparseable price is a validation failure instead.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.is_empty());
        let mut missing = Vec::new();
        if blank(&self.title) {
            missing.push("title");
        }
        if blank(&self.location) {
            missing.push("location");
        }
        if blank(&self.category) {
            missing.push("category");
        }
        if blank(&self.description) {
            missing.push("description");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        missing
    }

    /// Validate every field for creation and build the insert payload
    pub fn into_new_listing(self, seller: UserId, images: Vec<String>) -> Result<NewListing> {
        let mut errors = ValidationErrors::new();

        let title = check_title(self.title.as_deref(), &mut errors);
        let description = check_description(self.description.as_deref(), &mut errors);
        let price = check_price(self.price.as_deref(), &mut errors);
        let category = check_category(self.category.as_deref(), &mut errors);
        let condition = match self.condition.as_deref().filter(|c| !c.is_empty()) {
            Some(raw) => check_condition(raw, &mut errors),
            None => Some(Condition::default()),
        };
        let location = check_location(self.location.as_deref(), &mut errors);
        let is_negotiable = parse_flag(self.is_negotiable.as_deref());

        match (title, description, price, category, condition, location) {
            (Some(title), Some(description), Some(price), Some(category), Some(condition), Some(location))
                if errors.is_empty() =>
            {
                Ok(NewListing {
                    title,
                    description,
                    price,
                    is_negotiable,
                    category,
                    condition,
                    location,
                    images,
                    seller,
                })
            }
            _ => Err(errors),
        }
    }

    /// Validate only the supplied fields for an update
    pub fn into_changes(self) -> Result<ListingChanges> {
        let mut errors = ValidationErrors::new();
        let mut changes = ListingChanges::default();

        if let Some(raw) = self.title.as_deref() {
            changes.title = check_title(Some(raw), &mut errors);
        }
        if let Some(raw) = self.description.as_deref() {
            changes.description = check_description(Some(raw), &mut errors);
        }
        if let Some(raw) = self.price.as_deref() {
            changes.price = check_price(Some(raw), &mut errors);
        }
        if let Some(raw) = self.is_negotiable.as_deref() {
            changes.is_negotiable = Some(parse_flag(Some(raw)));
        }
        if let Some(raw) = self.category.as_deref() {
            changes.category = check_category(Some(raw), &mut errors);
        }
        if let Some(raw) = self.condition.as_deref().filter(|c| !c.is_empty()) {
            changes.condition = check_condition(raw, &mut errors);
        }
        if let Some(raw) = self.location.as_deref() {
            changes.location = check_location(Some(raw), &mut errors);
        }

        errors.into_result(changes)
    }
}

fn required_trimmed(raw: Option<&str>, missing: &str, errors: &mut ValidationErrors) -> Option<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Some(value.to_string()),
        None => {
            errors.push(missing);
            None
        }
    }
}

fn check_title(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<String> {
    let title = required_trimmed(raw, "Please add a title for the listing", errors)?;
    if title.chars().count() > MAX_TITLE_LEN {
        errors.push(format!("Title cannot be more than {} characters", MAX_TITLE_LEN));
        return None;
    }
    Some(title)
}

fn check_description(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<String> {
    let description = required_trimmed(raw, "Please add a description", errors)?;
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(format!(
            "Description cannot be more than {} characters",
            MAX_DESCRIPTION_LEN
        ));
        return None;
    }
    Some(description)
}

fn check_location(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<String> {
    required_trimmed(raw, "Please add a location", errors)
}

fn check_price(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<Decimal> {
    let Some(raw) = raw else {
        errors.push("Please add a price");
        return None;
    };
    match parse_decimal(raw) {
        Some(price) if price.is_sign_negative() && !price.is_zero() => {
            errors.push("Price cannot be negative");
            None
        }
        Some(price) => Some(price),
        None => {
            errors.push("Price must be a number");
            None
        }
    }
}

fn check_category(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<Category> {
    match raw.filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse().map_err(|e: String| errors.push(e)).ok(),
        None => {
            errors.push("Please select a category");
            None
        }
    }
}

fn check_condition(raw: &str, errors: &mut ValidationErrors) -> Option<Condition> {
    raw.parse().map_err(|e: String| errors.push(e)).ok()
}

/// Checkbox-style flag: only the literal `true` is truthy.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(str::trim) == Some("true")
}

/// Parse a decimal from user input, tolerating surrounding whitespace.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Outcome of reconciling a listing's images on update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlan {
    /// New image list: retained paths in caller order, then uploads
    pub images: Vec<String>,
    /// Previously stored paths that are no longer referenced
    pub removed: Vec<String>,
}

impl ImagePlan {
    /// Reconcile the stored image set against the caller's retain list.
    ///
    /// Retain entries that are not currently on the listing are dropped, as
    /// are duplicates, so a caller can never attach a path it does not own.
    pub fn reconcile(current: &[String], retain: &[String], uploaded: Vec<String>) -> Self {
        let mut images: Vec<String> = Vec::with_capacity(retain.len() + uploaded.len());
        for path in retain {
            if current.contains(path) && !images.contains(path) {
                images.push(path.clone());
            }
        }
        let removed = current
            .iter()
            .filter(|path| !images.contains(path))
            .cloned()
            .collect();
        images.extend(uploaded);
        Self { images, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ListingDraft {
        ListingDraft {
            title: Some("Tractor".to_string()),
            description: Some("Good condition".to_string()),
            price: Some("5000".to_string()),
            is_negotiable: None,
            category: Some("Tractors and Machinery".to_string()),
            condition: None,
            location: Some("Nairobi".to_string()),
        }
    }

    #[test]
    fn test_category_wire_strings() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
        assert!("tractors and machinery".parse::<Category>().is_err());
    }

    #[test]
    fn test_new_listing_defaults() {
        let seller = UserId::new();
        let listing = draft().into_new_listing(seller, vec![]).unwrap();
        assert_eq!(listing.condition, Condition::UsedGood);
        assert!(!listing.is_negotiable);
        assert_eq!(listing.price, Decimal::from(5000));
        assert_eq!(listing.seller, seller);
    }

    #[test]
    fn test_missing_required_fields() {
        let empty = ListingDraft::default();
        assert_eq!(
            empty.missing_required(),
            vec!["title", "location", "category", "description", "price"]
        );

        let mut blank_title = draft();
        blank_title.title = Some(String::new());
        assert_eq!(blank_title.missing_required(), vec!["title"]);
        assert!(draft().missing_required().is_empty());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut bad = draft();
        bad.title = Some("x".repeat(101));
        bad.price = Some("-1".to_string());
        bad.category = Some("Boats".to_string());

        let errors = bad.into_new_listing(UserId::new(), vec![]).unwrap_err();
        assert_eq!(
            errors.messages(),
            &[
                "Title cannot be more than 100 characters".to_string(),
                "Price cannot be negative".to_string(),
                "`Boats` is not a valid category".to_string(),
            ]
        );
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut padded = draft();
        padded.title = Some("  Tractor  ".to_string());
        padded.location = Some(" Nakuru ".to_string());
        let listing = padded.into_new_listing(UserId::new(), vec![]).unwrap();
        assert_eq!(listing.title, "Tractor");
        assert_eq!(listing.location, "Nakuru");
    }

    #[test]
    fn test_zero_price_allowed() {
        let mut free = draft();
        free.price = Some("0".to_string());
        assert!(free.into_new_listing(UserId::new(), vec![]).is_ok());
    }

    #[test]
    fn test_changes_only_touch_supplied_fields() {
        let changes = ListingDraft {
            price: Some("750.50".to_string()),
            is_negotiable: Some("true".to_string()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();

        assert_eq!(changes.price, Some(Decimal::new(75050, 2)));
        assert_eq!(changes.is_negotiable, Some(true));
        assert!(changes.title.is_none());
        assert!(changes.category.is_none());
    }

    #[test]
    fn test_changes_reject_blank_title() {
        let result = ListingDraft {
            title: Some("   ".to_string()),
            ..Default::default()
        }
        .into_changes();
        assert!(result.is_err());
    }

    #[test]
    fn test_image_plan_keeps_caller_order_then_uploads() {
        let current = vec![
            "uploads/a.jpg".to_string(),
            "uploads/b.jpg".to_string(),
            "uploads/c.jpg".to_string(),
        ];
        let retain = vec!["uploads/c.jpg".to_string(), "uploads/a.jpg".to_string()];
        let plan = ImagePlan::reconcile(&current, &retain, vec!["uploads/d.jpg".to_string()]);

        assert_eq!(
            plan.images,
            vec!["uploads/c.jpg", "uploads/a.jpg", "uploads/d.jpg"]
        );
        assert_eq!(plan.removed, vec!["uploads/b.jpg"]);
    }

    #[test]
    fn test_image_plan_ignores_foreign_and_duplicate_paths() {
        let current = vec!["uploads/a.jpg".to_string()];
        let retain = vec![
            "uploads/a.jpg".to_string(),
            "uploads/a.jpg".to_string(),
            "../etc/passwd".to_string(),
        ];
        let plan = ImagePlan::reconcile(&current, &retain, vec![]);
        assert_eq!(plan.images, vec!["uploads/a.jpg"]);
        assert!(plan.removed.is_empty());
    }

    #[test]
    fn test_image_plan_empty_retain_removes_everything() {
        let current = vec!["uploads/a.jpg".to_string(), "uploads/b.jpg".to_string()];
        let plan = ImagePlan::reconcile(&current, &[], vec![]);
        assert!(plan.images.is_empty());
        assert_eq!(plan.removed, current);
    }
}
