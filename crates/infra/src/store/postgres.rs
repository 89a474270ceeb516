//! Postgres-backed market store.
//!
//! ## The purchase transaction
//!
//! `place_order` runs one transaction built around a conditional decrement:
//!
//! ```sql
//! UPDATE listings
//!    SET stock = stock - $qty,
//!        status = CASE WHEN stock = $qty THEN 'sold' ELSE status END
//!  WHERE id = $id AND stock >= $qty
//! RETURNING price
//! ```
//!
//! The `stock >= $qty` guard makes the stock check and the decrement a single
//! statement, so two concurrent buyers can never both pass the check for the
//! same last unit: one of them matches zero rows. A zero-row result is then
//! disambiguated (listing absent vs. short on stock) by a follow-up read in
//! the same transaction. The order insert commits together with the
//! decrement, or not at all.
//!
//! ## Error mapping
//!
//! | SQLx error | PostgreSQL code | StoreError | Scenario |
//! |------------|-----------------|------------|----------|
//! | Database | `55P03` | `Timeout` | `lock_timeout` elapsed waiting on a row |
//! | Database | `57014` | `Timeout` | `statement_timeout` cancelled the statement |
//! | PoolTimedOut | n/a | `Timeout` | no connection became available |
//! | anything else | any | `Backend` | connectivity, constraint, corrupt rows |
//!
//! ## Thread safety
//!
//! Uses the SQLx connection pool, which is `Send + Sync`; the store can be
//! shared freely behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use pawmart_catalog::{Listing, ListingFilter, ListingStatus, Page, SortOrder};
use pawmart_core::{DomainError, ListingId, Money, OrderId, UserId};
use pawmart_orders::{NewOrder, Order, OrderStatus, Quantity};

use super::r#trait::{MarketStore, PlaceOrderError, StoreError};

/// How long a purchase may wait on a contended listing row before failing
/// with a timeout instead of hanging.
const LOCK_TIMEOUT: &str = "2s";
const STATEMENT_TIMEOUT: &str = "5s";

const LISTING_COLUMNS: &str = "id, seller_id, title, species, breed, description, location, \
                               price, stock, status, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, buyer_id, listing_id, quantity, total_price, status, created_at";

/// Postgres-backed implementation of [`MarketStore`].
///
/// Schema lives in `schema.sql` next to this crate's manifest.
#[derive(Debug, Clone)]
pub struct PostgresMarketStore {
    pool: Arc<PgPool>,
}

impl PostgresMarketStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with bounded pool acquisition.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // 55P03 lock_not_available, 57014 query_canceled (statement_timeout).
            Some("55P03") | Some("57014") => {
                StoreError::Timeout(format!("{operation}: {}", db.message()))
            }
            _ => StoreError::Backend(format!("{operation}: {err}")),
        },
        sqlx::Error::PoolTimedOut => {
            StoreError::Timeout(format!("{operation}: connection pool timed out"))
        }
        _ => StoreError::Backend(format!("{operation}: {err}")),
    }
}

fn corrupt_row(what: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt {what} row: {detail}"))
}

fn listing_from_row(row: &PgRow) -> Result<Listing, StoreError> {
    let status: String = row
        .try_get("status")
        .map_err(|e| corrupt_row("listing", e))?;
    let status: ListingStatus = status.parse().map_err(|e| corrupt_row("listing", e))?;

    Ok(Listing {
        id: ListingId::from_uuid(row.try_get("id").map_err(|e| corrupt_row("listing", e))?),
        seller_id: UserId::from_uuid(
            row.try_get("seller_id")
                .map_err(|e| corrupt_row("listing", e))?,
        ),
        title: row.try_get("title").map_err(|e| corrupt_row("listing", e))?,
        species: row
            .try_get("species")
            .map_err(|e| corrupt_row("listing", e))?,
        breed: row.try_get("breed").map_err(|e| corrupt_row("listing", e))?,
        description: row
            .try_get("description")
            .map_err(|e| corrupt_row("listing", e))?,
        location: row
            .try_get("location")
            .map_err(|e| corrupt_row("listing", e))?,
        price: Money::from_cents(row.try_get("price").map_err(|e| corrupt_row("listing", e))?),
        stock: row.try_get("stock").map_err(|e| corrupt_row("listing", e))?,
        status,
        created_at: row
            .try_get("created_at")
            .map_err(|e| corrupt_row("listing", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| corrupt_row("listing", e))?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.try_get("status").map_err(|e| corrupt_row("order", e))?;
    let status: OrderStatus = status.parse().map_err(|e| corrupt_row("order", e))?;
    let quantity: i64 = row
        .try_get("quantity")
        .map_err(|e| corrupt_row("order", e))?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id").map_err(|e| corrupt_row("order", e))?),
        buyer_id: UserId::from_uuid(
            row.try_get("buyer_id")
                .map_err(|e| corrupt_row("order", e))?,
        ),
        listing_id: ListingId::from_uuid(
            row.try_get("listing_id")
                .map_err(|e| corrupt_row("order", e))?,
        ),
        quantity: Quantity::new(quantity).map_err(|e| corrupt_row("order", e))?,
        total_price: Money::from_cents(
            row.try_get("total_price")
                .map_err(|e| corrupt_row("order", e))?,
        ),
        status,
        created_at: row
            .try_get("created_at")
            .map_err(|e| corrupt_row("order", e))?,
    })
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
    #[instrument(skip(self, listing), fields(listing_id = %listing.id), err)]
    async fn insert_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO listings
                (id, seller_id, title, species, breed, description, location,
                 price, stock, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(listing.id.as_uuid())
        .bind(listing.seller_id.as_uuid())
        .bind(&listing.title)
        .bind(&listing.species)
        .bind(listing.breed.as_deref())
        .bind(listing.description.as_deref())
        .bind(listing.location.as_deref())
        .bind(listing.price.cents())
        .bind(listing.stock)
        .bind(listing.status.as_str())
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_listing", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(listing_id = %id), err)]
    async fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_listing", e))?;

        row.as_ref().map(listing_from_row).transpose()
    }

    #[instrument(skip(self, filter), err)]
    async fn search_listings(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE status = 'available'"
        ));

        if let Some(species) = &filter.species {
            qb.push(" AND LOWER(species) = LOWER(");
            qb.push_bind(species);
            qb.push(")");
        }
        if let Some(needle) = &filter.search {
            let pattern = format!("%{needle}%");
            qb.push(" AND (title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR breed ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ");
            qb.push_bind(min.cents());
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ");
            qb.push_bind(max.cents());
        }

        qb.push(match filter.sort {
            SortOrder::Newest => " ORDER BY created_at DESC",
            SortOrder::Oldest => " ORDER BY created_at ASC",
            SortOrder::PriceAsc => " ORDER BY price ASC",
            SortOrder::PriceDesc => " ORDER BY price DESC",
        });

        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("search_listings", e))?;

        rows.iter().map(listing_from_row).collect()
    }

    #[instrument(
        skip(self),
        fields(
            listing_id = %draft.listing_id,
            buyer_id = %draft.buyer_id,
            quantity = draft.quantity.get()
        ),
        err
    )]
    async fn place_order(&self, draft: NewOrder) -> Result<Order, PlaceOrderError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("place_order.begin", e))?;

        // Bounded waits: a contended listing row fails the purchase with a
        // timeout instead of hanging the request.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{LOCK_TIMEOUT}'"))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("place_order.lock_timeout", e))?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{STATEMENT_TIMEOUT}'"
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("place_order.statement_timeout", e))?;

        // Check-and-decrement in one statement; `stock` on the right-hand
        // side reads the pre-update value, so the listing sells out exactly
        // when the old stock equals the purchased quantity.
        let quantity = draft.quantity.get();
        let updated = sqlx::query(
            r#"
            UPDATE listings
               SET stock = stock - $2,
                   status = CASE WHEN stock = $2 THEN 'sold' ELSE status END,
                   updated_at = NOW()
             WHERE id = $1 AND stock >= $2
            RETURNING price
            "#,
        )
        .bind(draft.listing_id.as_uuid())
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("place_order.decrement", e))?;

        let price = match updated {
            Some(row) => Money::from_cents(
                row.try_get("price")
                    .map_err(|e| corrupt_row("listing", e))?,
            ),
            None => {
                // Zero rows matched: absent listing or not enough stock.
                // Dropping `tx` rolls the transaction back.
                let stock: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM listings WHERE id = $1")
                        .bind(draft.listing_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| map_sqlx_error("place_order.recheck", e))?;

                return Err(match stock {
                    None => DomainError::NotFound.into(),
                    Some(available) => {
                        DomainError::insufficient_stock(available, quantity).into()
                    }
                });
            }
        };

        let order = draft.into_order(price)?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, buyer_id, listing_id, quantity, total_price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.buyer_id.as_uuid())
        .bind(order.listing_id.as_uuid())
        .bind(order.quantity.get())
        .bind(order.total_price.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("place_order.insert", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("place_order.commit", e))?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_order", e))?;

        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(skip(self), fields(buyer_id = %buyer_id), err)]
    async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(buyer_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_buyer", e))?;

        rows.iter().map(order_from_row).collect()
    }
}
