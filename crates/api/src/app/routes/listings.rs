use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use pawmart_catalog::NewListing;
use pawmart_core::{ListingId, Money};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::{auth_middleware, AuthState};

/// Browsing is public; creating a listing requires an authenticated seller,
/// mirroring the split of the marketplace route groups.
pub fn router(auth_state: AuthState) -> Router {
    let auth = axum::middleware::from_fn_with_state(auth_state, auth_middleware);

    Router::new()
        .route(
            "/marketplace/listings",
            post(create_listing).route_layer(auth).get(search_listings),
        )
        .route("/marketplace/listings/:id", get(get_listing))
}

pub async fn create_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<crate::context::BuyerContext>,
    Json(body): Json<dto::CreateListingRequest>,
) -> axum::response::Response {
    let input = NewListing {
        seller_id: seller.user_id(),
        title: body.title,
        species: body.species,
        breed: body.breed,
        description: body.description,
        location: body.location,
        price: Money::from_cents(body.price),
        stock: body.stock.unwrap_or(0),
    };

    let listing = match input.build(ListingId::new(), Utc::now()) {
        Ok(l) => l,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    if let Err(e) = services.store().insert_listing(&listing).await {
        return errors::store_error_to_response(&e);
    }

    (StatusCode::CREATED, Json(dto::listing_to_json(&listing))).into_response()
}

pub async fn get_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ListingId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid listing id"),
    };

    match services.store().fetch_listing(id).await {
        Ok(Some(listing)) => {
            (StatusCode::OK, Json(dto::listing_to_json(&listing))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "listing not found"),
        Err(e) => errors::store_error_to_response(&e),
    }
}

pub async fn search_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchListingsQuery>,
) -> axum::response::Response {
    let (filter, page) = query.into_filter();

    match services.store().search_listings(&filter, page).await {
        Ok(listings) => {
            let items = listings
                .iter()
                .map(dto::listing_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(&e),
    }
}
