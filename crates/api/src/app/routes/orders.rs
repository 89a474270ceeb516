use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use pawmart_core::{ListingId, OrderId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route(
            "/marketplace/orders",
            post(place_order).get(list_orders),
        )
        .route("/marketplace/orders/:id", get(get_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<crate::context::BuyerContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let listing_id: ListingId = match body.listing_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid listing id"),
    };

    match services
        .placement()
        .place(buyer.user_id(), listing_id, body.quantity, Utc::now())
        .await
    {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::place_order_error_to_response(&e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<crate::context::BuyerContext>,
) -> axum::response::Response {
    match services.store().orders_for_buyer(buyer.user_id()).await {
        Ok(orders) => {
            let items = orders.iter().map(dto::order_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(&e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<crate::context::BuyerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.store().fetch_order(id).await {
        // Orders are visible to their buyer only; anyone else sees not-found
        // rather than learning the order exists.
        Ok(Some(order)) if order.buyer_id == buyer.user_id() => {
            (StatusCode::OK, Json(dto::order_to_json(&order))).into_response()
        }
        Ok(_) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::store_error_to_response(&e),
    }
}
