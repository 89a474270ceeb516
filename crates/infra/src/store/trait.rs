use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use pawmart_catalog::{Listing, ListingFilter, Page};
use pawmart_core::{DomainError, ListingId, OrderId, UserId};
use pawmart_orders::{NewOrder, Order};

/// Storage operation error.
///
/// Infrastructure failures only (connectivity, timeouts, corrupt rows).
/// Business failures — listing absent, insufficient stock — are
/// `DomainError`s and travel through [`PlaceOrderError`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A bounded lock or statement wait elapsed before the operation could
    /// complete. The caller may retry; nothing was written.
    #[error("storage operation timed out: {0}")]
    Timeout(String),

    /// Any other storage failure. The operation has no effect.
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Failure placing an order: either the business rules said no, or storage
/// failed. Both leave no partial writes behind.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transactional store for listings and orders.
///
/// ## The atomic unit
///
/// `place_order` is the one write path with a concurrency obligation. An
/// implementation must execute the stock check, the stock decrement, the
/// `sold` transition, and the order insert as a single atomic unit: for N
/// concurrent calls against a listing with stock S, at most S total quantity
/// may ever be sold, and a failed call must leave neither an order row nor a
/// partial decrement behind.
///
/// ## Bounded waits
///
/// No operation may block indefinitely. Implementations contending on a row
/// must bound the wait and surface [`StoreError::Timeout`] rather than hang.
///
/// ## Price snapshot
///
/// The unit price used for the order total is read *inside* the atomic unit,
/// so a concurrent price change can never produce a total that matches
/// neither the old nor the new price.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Persist a freshly built listing.
    async fn insert_listing(&self, listing: &Listing) -> Result<(), StoreError>;

    /// Look up a listing by id.
    async fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError>;

    /// Search available listings, filtered, sorted, and paginated.
    async fn search_listings(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, StoreError>;

    /// Atomically validate stock, snapshot the price, insert the order, and
    /// decrement the listing (see trait docs).
    async fn place_order(&self, draft: NewOrder) -> Result<Order, PlaceOrderError>;

    /// Look up an order by id.
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// A buyer's order history, newest first.
    async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError>;
}

#[async_trait]
impl<S> MarketStore for Arc<S>
where
    S: MarketStore + ?Sized,
{
    async fn insert_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        (**self).insert_listing(listing).await
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError> {
        (**self).fetch_listing(id).await
    }

    async fn search_listings(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, StoreError> {
        (**self).search_listings(filter, page).await
    }

    async fn place_order(&self, draft: NewOrder) -> Result<Order, PlaceOrderError> {
        (**self).place_order(draft).await
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).fetch_order(id).await
    }

    async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        (**self).orders_for_buyer(buyer_id).await
    }
}
