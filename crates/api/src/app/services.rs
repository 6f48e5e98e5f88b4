//! Storage selection and service wiring.
//!
//! The store is opened here, once, and handed to every service; nothing in
//! the cart core reaches for a global connection.

use std::sync::Arc;
use std::time::Duration;

use stockcart_infra::{
    AppConfig, CartLedger, CartStore, CatalogService, InMemoryCartStore, PostgresCartStore,
    ReservationCoordinator, StorageConfig, StoreError,
};

/// Type-erased store shared by all services.
pub type SharedStore = Arc<dyn CartStore>;

#[derive(Debug, Clone)]
enum Backend {
    InMemory,
    Postgres(PostgresCartStore),
}

pub struct AppServices {
    pub coordinator: ReservationCoordinator<SharedStore>,
    pub ledger: CartLedger<SharedStore>,
    pub catalog: CatalogService<SharedStore>,
    backend: Backend,
}

impl AppServices {
    fn wire(store: SharedStore, backend: Backend) -> Self {
        Self {
            coordinator: ReservationCoordinator::new(store.clone()),
            ledger: CartLedger::new(store.clone()),
            catalog: CatalogService::new(store),
            backend,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(lock_timeout: Duration) -> Arc<Self> {
        let store: SharedStore = Arc::new(InMemoryCartStore::with_lock_timeout(lock_timeout));
        Arc::new(Self::wire(store, Backend::InMemory))
    }

    /// Postgres wiring; the schema is created if missing.
    pub async fn postgres(
        database_url: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> Result<Arc<Self>, StoreError> {
        let pg = PostgresCartStore::connect(database_url, max_connections, lock_timeout).await?;
        pg.migrate().await?;
        let store: SharedStore = Arc::new(pg.clone());
        Ok(Arc::new(Self::wire(store, Backend::Postgres(pg))))
    }

    /// Release storage resources. Called once by the entry point on shutdown.
    pub async fn close(&self) {
        match &self.backend {
            Backend::InMemory => {}
            Backend::Postgres(pg) => pg.close().await,
        }
    }
}

pub async fn build_services(config: &AppConfig) -> Result<Arc<AppServices>, StoreError> {
    match &config.storage {
        StorageConfig::InMemory => {
            tracing::warn!("USE_PERSISTENT_STORES not set; cart and catalog live in memory only");
            Ok(AppServices::in_memory(config.lock_timeout))
        }
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            tracing::info!(max_connections, "connecting to postgres");
            AppServices::postgres(database_url, *max_connections, config.lock_timeout).await
        }
    }
}
