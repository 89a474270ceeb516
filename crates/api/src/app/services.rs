use std::sync::Arc;

use anyhow::{Context, Result};

use pawmart_infra::{InMemoryMarketStore, MarketStore, OrderPlacement, PostgresMarketStore};

use crate::config::Config;

/// Shared per-process services, injected into handlers as an `Extension`.
pub struct AppServices {
    store: Arc<dyn MarketStore>,
    placement: OrderPlacement<Arc<dyn MarketStore>>,
}

impl AppServices {
    pub fn with_store(store: Arc<dyn MarketStore>) -> Self {
        Self {
            placement: OrderPlacement::new(Arc::clone(&store)),
            store,
        }
    }

    /// Direct store access for read paths.
    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    /// The transactional purchase entry point.
    pub fn placement(&self) -> &OrderPlacement<Arc<dyn MarketStore>> {
        &self.placement
    }
}

/// Wire the storage backend from configuration.
pub async fn build_services(config: &Config) -> Result<AppServices> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresMarketStore::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            tracing::info!("using Postgres market store");
            Ok(AppServices::with_store(Arc::new(store)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory market store");
            Ok(AppServices::with_store(Arc::new(InMemoryMarketStore::new())))
        }
    }
}
