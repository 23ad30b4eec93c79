//! Inventory domain module.
//!
//! Per-product stock levels, thresholds and the derived stock status. Pure
//! business rules; the transactional ledger lives in `pricewise-infra`.

pub mod record;
pub mod status;

pub use record::{InventoryRecord, StockLevels, StockThresholds, ensure_positive_quantity};
pub use status::{StockStatus, classify};
