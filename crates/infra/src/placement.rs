//! Order placement (application-level orchestration).
//!
//! Sits between the HTTP layer and the store. Input policy (quantity
//! resolution) is applied here, in pure domain code; the store owns the
//! atomic check-decrement-insert unit. Reads go straight to the store.

use chrono::{DateTime, Utc};

use pawmart_core::{ListingId, UserId};
use pawmart_orders::{NewOrder, Order, Quantity};

use crate::store::{MarketStore, PlaceOrderError};

/// The purchase entry point.
///
/// Generic over the store so tests can run against the in-memory
/// implementation and production against Postgres, without touching this
/// code.
#[derive(Debug, Clone)]
pub struct OrderPlacement<S> {
    store: S,
}

impl<S: MarketStore> OrderPlacement<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Place an order for `quantity` units of a listing.
    ///
    /// An omitted quantity means one; an explicit non-positive quantity is
    /// rejected before storage is touched. Everything after that is the
    /// store's atomic unit: on any failure, no order exists and no stock
    /// moved.
    pub async fn place(
        &self,
        buyer_id: UserId,
        listing_id: ListingId,
        quantity: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Order, PlaceOrderError> {
        let quantity = Quantity::resolve(quantity)?;
        let draft = NewOrder::new(buyer_id, listing_id, quantity, now);

        let order = self.store.place_order(draft).await?;

        tracing::info!(
            order_id = %order.id,
            listing_id = %listing_id,
            buyer_id = %buyer_id,
            quantity = quantity.get(),
            total_price = %order.total_price,
            "order placed"
        );

        Ok(order)
    }
}
