use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(buyer): Extension<crate::context::BuyerContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": buyer.user_id().to_string(),
    }))
}
