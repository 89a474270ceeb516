use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pawmart_core::{DomainError, DomainResult, ListingId, Money, UserId};

/// Listing availability lifecycle.
///
/// The only transition in the purchase path is `Available -> Sold`, taken
/// exactly when stock reaches zero. Relisting is a seller action outside this
/// flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
        }
    }
}

impl core::str::FromStr for ListingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ListingStatus::Available),
            "sold" => Ok(ListingStatus::Sold),
            other => Err(DomainError::validation(format!(
                "unknown listing status: {other}"
            ))),
        }
    }
}

/// A marketplace listing: one animal (or batch of animals) offered by a seller.
///
/// Invariants: `stock >= 0` always, and `status == Sold` iff `stock == 0`.
/// The storage layer enforces both atomically on the purchase path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: UserId,
    pub title: String,
    pub species: String,
    pub breed: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Unit price in the smallest currency unit.
    pub price: Money,
    pub stock: i64,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of reserving stock for a purchase: the level the listing drops to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub remaining: i64,
    pub status: ListingStatus,
}

impl Listing {
    pub fn is_available(&self) -> bool {
        matches!(self.status, ListingStatus::Available)
    }

    /// Decide the stock transition for a purchase of `quantity` units.
    ///
    /// Pure decision logic: nothing is mutated. The returned level is what the
    /// listing must drop to if the purchase commits. `quantity` must already
    /// be positive (see `pawmart-orders::Quantity`).
    pub fn reserve(&self, quantity: i64) -> DomainResult<StockLevel> {
        debug_assert!(quantity > 0);
        if self.stock < quantity {
            return Err(DomainError::insufficient_stock(self.stock, quantity));
        }
        let remaining = self.stock - quantity;
        let status = if remaining == 0 {
            ListingStatus::Sold
        } else {
            self.status
        };
        Ok(StockLevel { remaining, status })
    }

    /// Apply a previously decided reservation.
    pub fn apply(&mut self, level: StockLevel, now: DateTime<Utc>) {
        self.stock = level.remaining;
        self.status = level.status;
        self.updated_at = now;
    }
}

/// Seller input for creating a listing, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub seller_id: UserId,
    pub title: String,
    pub species: String,
    pub breed: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Money,
    /// Zero or negative means "one": a seller creating a listing always has
    /// at least the animal being listed.
    pub stock: i64,
}

impl NewListing {
    /// Validate and build the listing. New listings always start `Available`.
    pub fn build(self, id: ListingId, now: DateTime<Utc>) -> DomainResult<Listing> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        if self.species.trim().is_empty() {
            return Err(DomainError::validation("species cannot be empty"));
        }
        if !self.price.is_positive() {
            return Err(DomainError::validation("price must be positive"));
        }
        let stock = if self.stock <= 0 { 1 } else { self.stock };

        Ok(Listing {
            id,
            seller_id: self.seller_id,
            title: self.title,
            species: self.species,
            breed: self.breed,
            description: self.description,
            location: self.location,
            price: self.price,
            stock,
            status: ListingStatus::Available,
            created_at: now,
            updated_at: now,
        })
    }
}
