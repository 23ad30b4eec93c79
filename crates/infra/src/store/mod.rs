//! Storage boundary for the catalog, inventory, pricing and order data.
//!
//! The traits in [`r#trait`] are the only way the ledgers and engines touch
//! storage. Every multi-write operation is a single atomic unit inside the
//! backend: a Postgres transaction, or one write-lock critical section in the
//! in-memory store.

pub mod in_memory;
#[cfg(test)]
pub(crate) mod interleaved;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{
    CatalogStore, CategoryShare, CommerceStore, DashboardStats, InventoryListing, InventoryStore,
    ListedItem, OrderListing, OrderStore, PriceTrend, PricingStore, ProductDetails, ReportingStore,
    StoreError, StoreResult,
};
