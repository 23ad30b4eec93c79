//! Service wiring: one storage handle shared by every component.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use crate::campaign_engine::CampaignEngine;
use crate::catalog::CatalogService;
use crate::config::{Config, DatabaseConfig};
use crate::inventory_ledger::InventoryLedger;
use crate::order_engine::OrderEngine;
use crate::pricing_ledger::PricingLedger;
use crate::reporting::ReportingService;
use crate::store::{CommerceStore, InMemoryStore, PostgresStore, StoreError};

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("failed to connect to Postgres: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to prepare schema: {0}")]
    Schema(#[source] StoreError),
}

pub struct Services<S: ?Sized> {
    pub catalog: CatalogService<S>,
    pub inventory: InventoryLedger<S>,
    pub pricing: PricingLedger<S>,
    pub orders: OrderEngine<S>,
    pub campaigns: CampaignEngine<S>,
    pub reporting: ReportingService<S>,
}

impl<S> Services<S>
where
    S: CommerceStore + ?Sized,
{
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            catalog: CatalogService::new(Arc::clone(&store), config.default_thresholds),
            inventory: InventoryLedger::new(Arc::clone(&store)),
            pricing: PricingLedger::new(Arc::clone(&store)),
            orders: OrderEngine::new(Arc::clone(&store)),
            campaigns: CampaignEngine::new(Arc::clone(&store)),
            reporting: ReportingService::new(store),
        }
    }
}

/// Build services on Postgres when configured, otherwise in memory.
pub async fn build_services(config: &Config) -> Result<Services<dyn CommerceStore>, ServicesError> {
    let store: Arc<dyn CommerceStore> = match &config.database {
        Some(database) => Arc::new(connect_postgres(database).await?),
        None => {
            info!("using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };
    Ok(Services::new(store, config))
}

async fn connect_postgres(database: &DatabaseConfig) -> Result<PostgresStore, ServicesError> {
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(database.connect_timeout)
        .connect(&database.url)
        .await
        .map_err(ServicesError::Connect)?;

    let store = PostgresStore::new(pool);
    store.ensure_schema().await.map_err(ServicesError::Schema)?;
    info!(max_connections = database.max_connections, "using Postgres store");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewise_catalog::NewProduct;
    use pricewise_core::Money;
    use pricewise_sales::RequestedItem;

    #[tokio::test]
    async fn in_memory_services_share_one_store() {
        let services = build_services(&Config::default()).await.unwrap();

        let product = services
            .catalog
            .create_product(NewProduct::new("Pen", Money::from_minor(150)))
            .await
            .unwrap();
        services.inventory.restock(product.id, 5).await.unwrap();
        let customer = services
            .orders
            .register_customer("Kim", "kim@example.com")
            .await
            .unwrap();
        let placed = services
            .orders
            .place_order(customer.id, "addr", vec![RequestedItem::new(product.id, 2)])
            .await
            .unwrap();

        assert_eq!(placed.total, Money::from_minor(300));
        assert_eq!(services.inventory.get_stock(product.id).await.unwrap().stock_quantity, 3);
        assert_eq!(services.reporting.dashboard_stats().await.unwrap().total_orders, 1);
    }
}
