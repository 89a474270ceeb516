//! Storage boundary for listings and orders.

mod in_memory;
mod postgres;
mod r#trait;

pub use in_memory::InMemoryMarketStore;
pub use postgres::PostgresMarketStore;
pub use r#trait::{MarketStore, PlaceOrderError, StoreError};
