//! Fixed-point money.
//!
//! Amounts are stored in the smallest currency unit (e.g. cents). Floats are
//! never used for prices: the original data model carried `f64` prices, which
//! cannot represent currency exactly.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// An amount of money in the smallest currency unit (cents).
///
/// Compared and serialized by value (`#[serde(transparent)]`), so it reads and
/// writes as a plain integer on the wire and in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Snapshot total for a purchase: unit price times quantity.
    ///
    /// Overflow aborts the purchase rather than wrapping.
    pub fn checked_mul(&self, quantity: i64) -> DomainResult<Money> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or_else(|| DomainError::validation("total price overflows"))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
