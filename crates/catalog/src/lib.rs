//! `pawmart-catalog` — marketplace listings.
//!
//! Pure domain: listing state, stock arithmetic, and search parameters.
//! No IO; storage lives in `pawmart-infra`.

pub mod filter;
pub mod listing;

pub use filter::{ListingFilter, Page, SortOrder};
pub use listing::{Listing, ListingStatus, NewListing, StockLevel};
