use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use pricewise_infra::store::{CategoryShare, DashboardStats, InventoryListing};
use pricewise_infra::{build_services, Config};

#[derive(Debug, Serialize)]
struct Summary {
    dashboard: DashboardStats,
    categories: Vec<CategoryShare>,
    low_stock: Vec<InventoryListing>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricewise_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    let services = build_services(&config)
        .await
        .context("failed to build services")?;

    let low_stock = services.inventory.low_stock().await?;
    for row in &low_stock {
        // Alert hook: downstream consumers pick these up from the log stream.
        warn!(
            product_id = %row.product_id,
            title = %row.title,
            stock = row.stock_quantity,
            low_threshold = row.thresholds.low(),
            "stock below threshold"
        );
    }
    info!(count = low_stock.len(), "stock-alert sweep finished");

    let summary = Summary {
        dashboard: services.reporting.dashboard_stats().await?,
        categories: services.reporting.category_distribution().await?,
        low_stock,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
