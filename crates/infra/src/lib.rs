//! Infrastructure layer: storage backends, the ledgers and engines built on
//! them, configuration and service wiring.
//!
//! Components receive an explicit storage handle (`Arc<S>` where `S` implements
//! the store traits) at construction; there is no process-wide state.

pub mod campaign_engine;
pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory_ledger;
pub mod order_engine;
pub mod pricing_ledger;
pub mod reporting;
pub mod services;
pub mod store;

pub use campaign_engine::{CampaignEngine, CampaignFailure, CampaignOutcome};
pub use catalog::CatalogService;
pub use config::{Config, ConfigError, DatabaseConfig};
pub use error::{EngineError, EngineResult};
pub use inventory_ledger::InventoryLedger;
pub use order_engine::{OrderEngine, PlacedOrder};
pub use pricing_ledger::PricingLedger;
pub use reporting::{ReportingService, DEFAULT_TREND_DAYS};
pub use services::{build_services, Services, ServicesError};
