//! `pawmart-infra` — storage boundary and the order-placement flow.
//!
//! The one piece of this system that needs a shared-resource discipline is
//! order placement: the stock check, the order insert, and the stock
//! decrement must be a single atomic unit so that concurrent buyers cannot
//! oversell a listing. The [`store::MarketStore`] trait owns that unit; the
//! Postgres implementation enforces it with a conditional `UPDATE` inside a
//! transaction, the in-memory implementation with a single lock.

pub mod placement;
pub mod store;

pub use placement::OrderPlacement;
pub use store::{InMemoryMarketStore, MarketStore, PlaceOrderError, PostgresMarketStore, StoreError};
