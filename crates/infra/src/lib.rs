//! Infrastructure layer: storage backends, the cart/catalog services built on
//! them, and configuration.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod reservation;
pub mod store;

pub use catalog::CatalogService;
pub use config::{AppConfig, ConfigError, StorageConfig};
pub use ledger::CartLedger;
pub use reservation::ReservationCoordinator;
pub use store::{AtomicUnit, CartStore, InMemoryCartStore, PostgresCartStore, StoreError};
