use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pawmart_core::DomainError;
use pawmart_infra::{PlaceOrderError, StoreError};

pub fn place_order_error_to_response(err: &PlaceOrderError) -> axum::response::Response {
    match err {
        PlaceOrderError::Domain(e) => domain_error_to_response(e),
        PlaceOrderError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: &DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg.clone())
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg.clone()),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_stock", err.to_string())
        }
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg.clone())
        }
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
    }
}

pub fn store_error_to_response(err: &StoreError) -> axum::response::Response {
    match err {
        StoreError::Timeout(msg) => json_error(StatusCode::GATEWAY_TIMEOUT, "timeout", msg.clone()),
        StoreError::Backend(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg.clone())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
