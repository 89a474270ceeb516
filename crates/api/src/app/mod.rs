//! HTTP API application wiring (Axum router + service wiring).
//!
//! Folder layout:
//! - `services.rs`: storage wiring (Postgres or in-memory) + placement service
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub async fn build_app(config: &Config) -> Result<Router> {
    let validator = Arc::new(pawmart_auth::Hs256TokenValidator::new(
        config.jwt_secret.as_bytes(),
    ));
    let auth_state = middleware::AuthState { validator };
    let auth = axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::auth_middleware,
    );

    let services = Arc::new(services::build_services(config).await?);

    // Buyer-scoped routes: require a valid bearer token.
    let protected = Router::new()
        .route("/whoami", get(routes::system::whoami))
        .merge(routes::orders::router())
        .route_layer(auth);

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::listings::router(auth_state))
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new());

    Ok(app)
}
