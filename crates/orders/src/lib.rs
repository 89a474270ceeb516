//! `pawmart-orders` — purchase records.
//!
//! Pure domain: order state, quantity policy, and snapshot pricing. The
//! transactional placement flow lives in `pawmart-infra`.

pub mod order;

pub use order::{NewOrder, Order, OrderStatus, Quantity};
