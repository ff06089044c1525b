//! Listing query engine
//!
//! Turns the loose query-string parameters of a listing search into a typed
//! [`ListingQuery`]. `ListingQuery::matches` and [`SortBy::compare`] define
//! filter and order semantics; store implementations must agree with them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::identity::UserId;
use crate::listing::{parse_decimal, Listing};

/// Raw search parameters exactly as they arrive on the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<String>,
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
}

impl SortBy {
    /// Unknown or absent values fall back to newest-first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("priceAsc") => Self::PriceAsc,
            Some("priceDesc") => Self::PriceDesc,
            _ => Self::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
            Self::Newest => "newest",
        }
    }

    /// Total order over listings. Equal prices fall back to newest first,
    /// then identifier.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let newest = b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id));
        match self {
            Self::PriceAsc => a.price.cmp(&b.price).then(newest),
            Self::PriceDesc => b.price.cmp(&a.price).then(newest),
            Self::Newest => newest,
        }
    }
}

/// Inclusive price bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRange {
    pub fn contains(&self, price: Decimal) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Typed listing query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    /// Case-insensitive substring over title, description and location
    pub search: Option<String>,
    /// Exact category wire string. A value outside the closed set is kept
    /// and simply matches nothing.
    pub category: Option<String>,
    pub price: PriceRange,
    /// Restrict to one seller's listings
    pub seller: Option<UserId>,
    pub sort: SortBy,
    pub limit: Option<usize>,
}

impl ListingQuery {
    /// Build a query from raw parameters. Malformed numbers are ignored
    /// rather than rejected.
    pub fn from_params(params: &ListingSearchParams) -> Self {
        Self {
            search: non_empty(params.search.as_deref()),
            category: non_empty(params.category.as_deref()),
            price: PriceRange {
                min: params.min_price.as_deref().and_then(parse_decimal),
                max: params.max_price.as_deref().and_then(parse_decimal),
            },
            seller: None,
            sort: SortBy::parse(params.sort_by.as_deref()),
            limit: parse_limit(params.limit.as_deref()),
        }
    }

    /// All listings of one seller, newest first
    pub fn for_seller(seller: UserId) -> Self {
        Self {
            seller: Some(seller),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Does a listing pass every filter? Filters are ANDed; only the search
    /// clause ORs across its three fields.
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(seller) = &self.seller {
            if listing.seller != *seller {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if listing.category.as_str() != category {
                return false;
            }
        }
        if !self.price.contains(listing.price) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let needle = term.to_lowercase();
                [&listing.title, &listing.description, &listing.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Filter, order and cap an in-memory collection
    pub fn apply<I>(&self, listings: I) -> Vec<Listing>
    where
        I: IntoIterator<Item = Listing>,
    {
        let mut found: Vec<Listing> = listings.into_iter().filter(|l| self.matches(l)).collect();
        found.sort_by(|a, b| self.sort.compare(a, b));
        if let Some(limit) = self.limit {
            found.truncate(limit);
        }
        found
    }
}

/// Positive integer cap; anything else means "no cap".
pub fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ListingId;
    use crate::listing::{Category, Condition};
    use chrono::{Duration, TimeZone, Utc};

    fn listing(title: &str, price: i64, category: Category, age_minutes: i64) -> Listing {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let at = base - Duration::minutes(age_minutes);
        Listing {
            id: ListingId::new(),
            title: title.to_string(),
            description: "Well kept".to_string(),
            price: Decimal::from(price),
            is_negotiable: false,
            category,
            condition: Condition::UsedGood,
            location: "Eldoret".to_string(),
            images: vec![],
            seller: UserId::new(),
            created_at: at,
            updated_at: at,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ListingSearchParams {
        let mut p = ListingSearchParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "search" => p.search = v,
                "category" => p.category = v,
                "minPrice" => p.min_price = v,
                "maxPrice" => p.max_price = v,
                "sortBy" => p.sort_by = v,
                "limit" => p.limit = v,
                _ => unreachable!(),
            }
        }
        p
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing("Massey Ferguson tractor", 150, Category::TractorsAndMachinery, 30),
            listing("DAP fertilizer 50kg", 100, Category::Fertilizers, 10),
            listing("Drip kit", 250, Category::IrrigationSystems, 20),
            listing("Maize seed", 200, Category::CropSeeds, 0),
        ]
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!(SortBy::parse(Some("priceAsc")), SortBy::PriceAsc);
        assert_eq!(SortBy::parse(Some("priceDesc")), SortBy::PriceDesc);
        assert_eq!(SortBy::parse(Some("newest")), SortBy::Newest);
        assert_eq!(SortBy::parse(Some("PRICEASC")), SortBy::Newest);
        assert_eq!(SortBy::parse(None), SortBy::Newest);
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let found = ListingQuery::default().apply(sample());
        let titles: Vec<_> = found.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Maize seed", "DAP fertilizer 50kg", "Drip kit", "Massey Ferguson tractor"]
        );
    }

    #[test]
    fn test_price_range_is_inclusive_and_sorted() {
        let query = ListingQuery::from_params(&params(&[
            ("sortBy", "priceAsc"),
            ("minPrice", "100"),
            ("maxPrice", "200"),
        ]));
        let prices: Vec<_> = query.apply(sample()).iter().map(|l| l.price).collect();
        assert_eq!(
            prices,
            vec![Decimal::from(100), Decimal::from(150), Decimal::from(200)]
        );
    }

    #[test]
    fn test_price_desc_non_increasing() {
        let query = ListingQuery::from_params(&params(&[("sortBy", "priceDesc")]));
        let found = query.apply(sample());
        assert!(found.windows(2).all(|w| w[0].price >= w[1].price));
    }

    #[test]
    fn test_invalid_price_bound_is_ignored() {
        let query = ListingQuery::from_params(&params(&[("minPrice", "cheap"), ("maxPrice", "200")]));
        assert_eq!(query.price.min, None);
        assert_eq!(query.price.max, Some(Decimal::from(200)));
        assert_eq!(query.apply(sample()).len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_over_three_fields() {
        let query = ListingQuery::from_params(&params(&[("search", "MAIZE")]));
        assert_eq!(query.apply(sample()).len(), 1);

        let by_location = ListingQuery::from_params(&params(&[("search", "eldo")]));
        assert_eq!(by_location.apply(sample()).len(), 4);

        let by_description = ListingQuery::from_params(&params(&[("search", "well KEPT")]));
        assert_eq!(by_description.apply(sample()).len(), 4);
    }

    #[test]
    fn test_category_exact_match() {
        let query = ListingQuery::from_params(&params(&[("category", "Crop Seeds")]));
        let found = query.apply(sample());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, Category::CropSeeds);

        let wrong_case = ListingQuery::from_params(&params(&[("category", "crop seeds")]));
        assert!(wrong_case.apply(sample()).is_empty());

        let empty = ListingQuery::from_params(&params(&[("category", "")]));
        assert_eq!(empty.apply(sample()).len(), 4);
    }

    #[test]
    fn test_filters_are_anded() {
        let query = ListingQuery::from_params(&params(&[
            ("search", "fertilizer"),
            ("category", "Crop Seeds"),
        ]));
        assert!(query.apply(sample()).is_empty());
    }

    #[test]
    fn test_price_ties_break_by_newest() {
        let older = listing("Older", 100, Category::More, 60);
        let newer = listing("Newer", 100, Category::More, 5);
        let found = ListingQuery::from_params(&params(&[("sortBy", "priceAsc")]))
            .apply(vec![older, newer]);
        assert_eq!(found[0].title, "Newer");
    }

    #[test]
    fn test_seller_scope_and_limit() {
        let mut listings = sample();
        let seller = listings[0].seller;
        listings[2].seller = seller;

        let mine = ListingQuery::for_seller(seller).apply(listings.clone());
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|l| l.seller == seller));

        let capped = ListingQuery::default().with_limit(Some(1)).apply(listings);
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(Some("5")), Some(5));
        assert_eq!(parse_limit(Some("0")), None);
        assert_eq!(parse_limit(Some("-3")), None);
        assert_eq!(parse_limit(Some("ten")), None);
        assert_eq!(parse_limit(None), None);
    }
}
