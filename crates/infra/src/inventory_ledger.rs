//! Inventory ledger: per-product stock with low/high thresholds.
//!
//! Every mutation is a single atomic store operation; the ledger itself keeps
//! no state and takes no locks.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use pricewise_core::{DomainError, ProductId};
use pricewise_inventory::{InventoryRecord, StockLevels, StockStatus};

use crate::error::{EngineError, EngineResult};
use crate::store::{InventoryListing, InventoryStore};

pub use pricewise_inventory::classify;

pub struct InventoryLedger<S: ?Sized> {
    store: Arc<S>,
}

impl<S> InventoryLedger<S>
where
    S: InventoryStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stock and thresholds of one product.
    pub async fn get_stock(&self, product_id: ProductId) -> EngineResult<InventoryRecord> {
        self.store
            .inventory(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("inventory for product", product_id).into())
    }

    /// Take `quantity` units if and only if that many are on hand.
    ///
    /// On `InsufficientStock` the error carries the available quantity and the
    /// record is unchanged.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn reserve(&self, product_id: ProductId, quantity: i64) -> EngineResult<InventoryRecord> {
        match self.store.reserve(product_id, quantity).await {
            Ok(record) => {
                info!(remaining = record.stock_quantity, "stock reserved");
                Ok(record)
            }
            Err(err) => {
                let err = EngineError::from(err);
                if let EngineError::InsufficientStock { available, .. } = &err {
                    warn!(requested = quantity, available, "reservation rejected");
                }
                Err(err)
            }
        }
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn restock(&self, product_id: ProductId, quantity: i64) -> EngineResult<InventoryRecord> {
        let record = self
            .store
            .restock(product_id, quantity, Utc::now().date_naive())
            .await?;
        info!(stock = record.stock_quantity, "restocked");
        Ok(record)
    }

    /// Administrative correction: overwrite quantity and thresholds.
    #[instrument(skip(self, levels), fields(product_id = %product_id, quantity = levels.quantity), err)]
    pub async fn set_levels(&self, product_id: ProductId, levels: StockLevels) -> EngineResult<InventoryRecord> {
        let record = self
            .store
            .set_levels(product_id, levels, Utc::now().date_naive())
            .await?;
        info!(status = %record.status(), "stock levels set");
        Ok(record)
    }

    /// All inventory rows with their stock status, lowest stock first.
    pub async fn inventory_report(&self) -> EngineResult<Vec<InventoryListing>> {
        Ok(self.store.inventory_listing().await?)
    }

    /// Products below their low-stock threshold, lowest stock first.
    pub async fn low_stock(&self) -> EngineResult<Vec<InventoryListing>> {
        let mut listing = self.inventory_report().await?;
        listing.retain(|row| row.status == StockStatus::Low);
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CatalogStore, InMemoryStore};
    use pricewise_catalog::NewProduct;
    use pricewise_core::Money;
    use pricewise_inventory::StockThresholds;
    use proptest::prelude::*;

    async fn ledger_with_product(stock: i64) -> (InventoryLedger<InMemoryStore>, ProductId) {
        let store = Arc::new(InMemoryStore::new());
        let id = ProductId::new();
        let product = NewProduct::new("Notebook", Money::from_major(3))
            .into_product(id, Utc::now())
            .unwrap();
        let mut record = InventoryRecord::empty(id, StockThresholds::default(), Utc::now().date_naive());
        record.stock_quantity = stock;
        store.insert_product(&product, &record).await.unwrap();
        (InventoryLedger::new(store), id)
    }

    #[test]
    fn classify_below_low_threshold_is_low() {
        assert_eq!(classify(5, 10, 100), StockStatus::Low);
    }

    #[tokio::test]
    async fn reserve_rejects_overdraw_and_reports_available() {
        let (ledger, id) = ledger_with_product(2).await;
        let err = ledger.reserve(id, 3).await.unwrap_err();
        match err {
            EngineError::InsufficientStock { available: 2, requested: 3, .. } => {}
            other => panic!("Expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(ledger.get_stock(id).await.unwrap().stock_quantity, 2);
    }

    #[tokio::test]
    async fn restock_requires_positive_quantity() {
        let (ledger, id) = ledger_with_product(0).await;
        let err = ledger.restock(id, 0).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert_eq!(ledger.restock(id, 7).await.unwrap().stock_quantity, 7);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (ledger, _) = ledger_with_product(1).await;
        let err = ledger.get_stock(ProductId::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn low_stock_lists_only_low_rows() {
        let (ledger, id) = ledger_with_product(4).await;
        let low = ledger.low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product_id, id);

        ledger
            .set_levels(id, StockLevels::new(40, StockThresholds::default()).unwrap())
            .await
            .unwrap();
        assert!(ledger.low_stock().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() {
        let (ledger, id) = ledger_with_product(10).await;
        let ledger = Arc::new(ledger);
        let mut handles = Vec::new();
        for _ in 0..25 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move { ledger.reserve(id, 1).await.is_ok() }));
        }
        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 10);
        assert_eq!(ledger.get_stock(id).await.unwrap().stock_quantity, 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Reserve(i64),
        Restock(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(1i64..20).prop_map(Op::Reserve), (1i64..20).prop_map(Op::Restock)]
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

        #[test]
        fn stock_never_goes_negative(initial in 0i64..30, ops in prop::collection::vec(op(), 0..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let (ledger, id) = ledger_with_product(initial).await;
                let mut expected = initial;
                for op in ops {
                    match op {
                        Op::Reserve(q) => {
                            let result = ledger.reserve(id, q).await;
                            if q <= expected {
                                prop_assert!(result.is_ok());
                                expected -= q;
                            } else {
                                prop_assert!(result.is_err());
                            }
                        }
                        Op::Restock(q) => {
                            ledger.restock(id, q).await.unwrap();
                            expected += q;
                        }
                    }
                    let stock = ledger.get_stock(id).await.unwrap().stock_quantity;
                    prop_assert!(stock >= 0);
                    prop_assert_eq!(stock, expected);
                }
                Ok(())
            })?;
        }
    }
}
