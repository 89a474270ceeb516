use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pawmart_core::{DomainError, DomainResult, ListingId, Money, OrderId, UserId};

/// Order status lifecycle.
///
/// Orders are created `Pending`. Later transitions (payment, cancellation)
/// are driven by external fulfillment events, not by this flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Units requested in a purchase. Always positive.
///
/// An *omitted* quantity means one; an explicit zero or negative quantity is
/// rejected rather than silently bumped to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self(value))
    }

    /// Resolve a request-level quantity: `None` defaults to one.
    pub fn resolve(value: Option<i64>) -> DomainResult<Self> {
        match value {
            None => Ok(Self::ONE),
            Some(v) => Self::new(v),
        }
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// A buyer's purchase record against a listing.
///
/// `total_price` is a snapshot of `listing price * quantity` taken when the
/// order was placed; later price changes never affect it. Orders are
/// immutable once created, apart from externally driven status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub listing_id: ListingId,
    pub quantity: Quantity,
    pub total_price: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A purchase attempt that has passed input validation but not yet been
/// committed against storage. The storage layer snapshots the listing price
/// and turns this into an [`Order`] inside the atomic decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub listing_id: ListingId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        buyer_id: UserId,
        listing_id: ListingId,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            buyer_id,
            listing_id,
            quantity,
            created_at: now,
        }
    }

    /// Finalize against the snapshot unit price taken inside the atomic unit.
    pub fn into_order(self, unit_price: Money) -> DomainResult<Order> {
        let total_price = unit_price.checked_mul(self.quantity.get())?;
        Ok(Order {
            id: self.id,
            buyer_id: self.buyer_id,
            listing_id: self.listing_id,
            quantity: self.quantity,
            total_price,
            status: OrderStatus::Pending,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn omitted_quantity_defaults_to_one() {
        assert_eq!(Quantity::resolve(None).unwrap(), Quantity::ONE);
    }

    #[test]
    fn explicit_nonpositive_quantity_is_rejected() {
        assert!(Quantity::resolve(Some(0)).is_err());
        assert!(Quantity::resolve(Some(-3)).is_err());
    }

    #[test]
    fn order_snapshots_price_at_placement() {
        let draft = NewOrder::new(
            UserId::new(),
            ListingId::new(),
            Quantity::new(3).unwrap(),
            Utc::now(),
        );
        let order = draft.into_order(Money::from_cents(100)).unwrap();
        assert_eq!(order.total_price, Money::from_cents(300));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.id, draft.id);
    }

    #[test]
    fn overflowing_total_aborts_the_order() {
        let draft = NewOrder::new(
            UserId::new(),
            ListingId::new(),
            Quantity::new(3).unwrap(),
            Utc::now(),
        );
        assert!(draft.into_order(Money::from_cents(i64::MAX)).is_err());
    }

    proptest! {
        #[test]
        fn resolved_quantities_are_always_positive(v in proptest::option::of(-1000i64..1000)) {
            match Quantity::resolve(v) {
                Ok(q) => prop_assert!(q.get() > 0),
                Err(_) => prop_assert!(matches!(v, Some(n) if n <= 0)),
            }
        }
    }
}
