//! `pawmart-auth` — bearer-token validation boundary.
//!
//! Tokens are *validated* here, never issued: issuance belongs to the account
//! service that owns user credentials. This crate is decoupled from HTTP.

pub mod claims;
pub mod token;

pub use claims::{Claims, TokenError};
pub use token::{Hs256TokenValidator, TokenValidator};
