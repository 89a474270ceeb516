use serde::Deserialize;

use pawmart_catalog::{Listing, ListingFilter, Page, SortOrder};
use pawmart_core::Money;
use pawmart_orders::Order;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    pub species: String,
    pub breed: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Unit price in the smallest currency unit (cents).
    pub price: i64,
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub listing_id: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchListingsQuery {
    pub species: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchListingsQuery {
    pub fn into_filter(self) -> (ListingFilter, Page) {
        let filter = ListingFilter {
            species: self.species,
            search: self.search,
            min_price: self.min_price.map(Money::from_cents),
            max_price: self.max_price.map(Money::from_cents),
            sort: self
                .sort
                .as_deref()
                .map(SortOrder::parse_lenient)
                .unwrap_or_default(),
        };
        (filter, Page::normalize(self.page, self.limit))
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn listing_to_json(l: &Listing) -> serde_json::Value {
    serde_json::json!({
        "id": l.id.to_string(),
        "seller_id": l.seller_id.to_string(),
        "title": l.title,
        "species": l.species,
        "breed": l.breed,
        "description": l.description,
        "location": l.location,
        "price": l.price.cents(),
        "stock": l.stock,
        "status": l.status.as_str(),
        "created_at": l.created_at.to_rfc3339(),
        "updated_at": l.updated_at.to_rfc3339(),
    })
}

pub fn order_to_json(o: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": o.id.to_string(),
        "buyer_id": o.buyer_id.to_string(),
        "listing_id": o.listing_id.to_string(),
        "quantity": o.quantity.get(),
        "total_price": o.total_price.cents(),
        "status": o.status.as_str(),
        "created_at": o.created_at.to_rfc3339(),
    })
}
