#[tokio::main]
async fn main() {
    pawmart_observability::init();

    let config = pawmart_api::config::Config::from_env();

    let app = pawmart_api::app::build_app(&config)
        .await
        .expect("failed to build application");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
