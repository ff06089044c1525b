//! Listing repository

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use shamba_types::{Listing, ListingId, ListingQuery, ListingWithSeller, NewListing, SortBy};

use crate::store::ListingStore;
use crate::{DbError, DbListing, DbListingWithSeller, DbResult};

const LISTING_COLUMNS: &str = "id, title, description, price, is_negotiable, category, condition, \
     location, images, seller_id, created_at, updated_at";

const JOINED_COLUMNS: &str = "l.id, l.title, l.description, l.price, l.is_negotiable, l.category, \
     l.condition, l.location, l.images, l.seller_id, l.created_at, l.updated_at, \
     u.name AS seller_name, u.email AS seller_email, u.phone AS seller_phone";

/// Listing repository: CRUD plus the compiled search query
pub struct PgListingRepo {
    pool: PgPool,
}

impl PgListingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Compile a typed query into SQL. Clause order mirrors
/// `ListingQuery::matches`.
pub(crate) fn build_search(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {JOINED_COLUMNS} FROM listings l JOIN users u ON u.id = l.seller_id WHERE TRUE"
    ));

    if let Some(seller) = query.seller {
        qb.push(" AND l.seller_id = ").push_bind(seller.0);
    }
    if let Some(category) = &query.category {
        qb.push(" AND l.category = ").push_bind(category.clone());
    }
    if let Some(min) = query.price.min {
        qb.push(" AND l.price >= ").push_bind(min);
    }
    if let Some(max) = query.price.max {
        qb.push(" AND l.price <= ").push_bind(max);
    }
    if let Some(term) = &query.search {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (l.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    qb.push(match query.sort {
        SortBy::PriceAsc => " ORDER BY l.price ASC, l.created_at DESC, l.id ASC",
        SortBy::PriceDesc => " ORDER BY l.price DESC, l.created_at DESC, l.id ASC",
        SortBy::Newest => " ORDER BY l.created_at DESC, l.id ASC",
    });

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    qb
}

/// Escape LIKE metacharacters so the term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ListingStore for PgListingRepo {
    async fn create(&self, listing: NewListing) -> DbResult<Listing> {
        let row = sqlx::query_as::<_, DbListing>(&format!(
            r#"
            INSERT INTO listings
                (id, title, description, price, is_negotiable, category, condition, location, images, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(ListingId::new().0)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.is_negotiable)
        .bind(listing.category.as_str())
        .bind(listing.condition.as_str())
        .bind(&listing.location)
        .bind(&listing.images)
        .bind(listing.seller.0)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &ListingId) -> DbResult<Option<Listing>> {
        let row = sqlx::query_as::<_, DbListing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    async fn find_with_seller(&self, id: &ListingId) -> DbResult<Option<ListingWithSeller>> {
        let row = sqlx::query_as::<_, DbListingWithSeller>(&format!(
            "SELECT {JOINED_COLUMNS} FROM listings l JOIN users u ON u.id = l.seller_id WHERE l.id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ListingWithSeller::try_from).transpose()
    }

    async fn search(&self, query: &ListingQuery) -> DbResult<Vec<ListingWithSeller>> {
        let rows = build_search(query)
            .build_query_as::<DbListingWithSeller>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ListingWithSeller::try_from).collect()
    }

    async fn update(&self, listing: &Listing) -> DbResult<Listing> {
        let row = sqlx::query_as::<_, DbListing>(&format!(
            r#"
            UPDATE listings
            SET title = $2, description = $3, price = $4, is_negotiable = $5,
                category = $6, condition = $7, location = $8, images = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(listing.id.0)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.is_negotiable)
        .bind(listing.category.as_str())
        .bind(listing.condition.as_str())
        .bind(&listing.location)
        .bind(&listing.images)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("Listing {}", listing.id)))?;

        row.try_into()
    }

    async fn delete(&self, id: &ListingId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shamba_types::{ListingSearchParams, UserId};

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("maize"), "maize");
    }

    #[test]
    fn test_build_search_sql() {
        let params = ListingSearchParams {
            search: Some("tractor".to_string()),
            category: Some("Tractors and Machinery".to_string()),
            min_price: Some("100".to_string()),
            max_price: Some("200".to_string()),
            sort_by: Some("priceAsc".to_string()),
            limit: Some("10".to_string()),
        };
        let query = ListingQuery::from_params(&params);
        let qb = build_search(&query);
        let sql = qb.sql();

        assert!(sql.contains("l.category = $1"));
        assert!(sql.contains("l.price >= $2"));
        assert!(sql.contains("l.price <= $3"));
        assert!(sql.contains("l.title ILIKE $4 OR l.description ILIKE $5 OR l.location ILIKE $6"));
        assert!(sql.contains("ORDER BY l.price ASC, l.created_at DESC"));
        assert!(sql.ends_with("LIMIT $7"));
    }

    #[test]
    fn test_build_search_seller_scope() {
        let query = ListingQuery::for_seller(UserId::new());
        let qb = build_search(&query);
        let sql = qb.sql();
        assert!(sql.contains("l.seller_id = $1"));
        assert!(sql.contains("ORDER BY l.created_at DESC"));
        assert!(!sql.contains("LIMIT"));
    }
}
