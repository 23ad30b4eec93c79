//! Pricing ledger: current price per product plus its append-only history.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use pricewise_core::{DomainError, Money, ProductId};
use pricewise_pricing::{Discount, PriceChange, PriceChangeReason, PriceHistoryEntry};

use crate::error::EngineResult;
use crate::store::PricingStore;

pub struct PricingLedger<S: ?Sized> {
    store: Arc<S>,
}

impl<S> PricingLedger<S>
where
    S: PricingStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn current_price(&self, product_id: ProductId) -> EngineResult<Money> {
        self.store
            .current_price(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", product_id).into())
    }

    /// Set a new current price and append the history entry in one atomic unit.
    ///
    /// Rejects negative prices and prices equal to the current one.
    #[instrument(skip(self), fields(product_id = %product_id, new_price = %new_price, reason = %reason), err)]
    pub async fn change_price(
        &self,
        product_id: ProductId,
        new_price: Money,
        reason: PriceChangeReason,
    ) -> EngineResult<PriceHistoryEntry> {
        let change = PriceChange::new(product_id, new_price, reason)?;
        let entry = self.store.change_price(&change, Utc::now()).await?;
        info!(
            history_entry_id = %entry.id,
            old_price = %entry.old_price,
            sequence = entry.sequence,
            "price changed"
        );
        Ok(entry)
    }

    /// Campaign discount computed from the price current at write time.
    ///
    /// `None` when the discount does not move the price.
    #[instrument(skip(self, discount), fields(product_id = %product_id, basis_points = discount.basis_points()), err)]
    pub async fn apply_discount(
        &self,
        product_id: ProductId,
        discount: Discount,
    ) -> EngineResult<Option<PriceHistoryEntry>> {
        let entry = self.store.apply_discount(product_id, discount, Utc::now()).await?;
        if let Some(entry) = &entry {
            info!(
                history_entry_id = %entry.id,
                old_price = %entry.old_price,
                new_price = %entry.new_price,
                sequence = entry.sequence,
                "discount applied"
            );
        }
        Ok(entry)
    }

    /// Newest first; every product when `product_id` is `None`.
    pub async fn price_history(&self, product_id: Option<ProductId>) -> EngineResult<Vec<PriceHistoryEntry>> {
        Ok(self.store.price_history(product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::{CatalogStore, InMemoryStore};
    use pricewise_catalog::NewProduct;
    use pricewise_inventory::{InventoryRecord, StockThresholds};

    async fn ledger_with_product(price: i64) -> (PricingLedger<InMemoryStore>, ProductId) {
        let store = Arc::new(InMemoryStore::new());
        let id = ProductId::new();
        let product = NewProduct::new("Stapler", Money::from_major(price))
            .into_product(id, Utc::now())
            .unwrap();
        let record = InventoryRecord::empty(id, StockThresholds::default(), Utc::now().date_naive());
        store.insert_product(&product, &record).await.unwrap();
        (PricingLedger::new(store), id)
    }

    #[tokio::test]
    async fn change_price_updates_price_and_appends_one_entry() {
        let (ledger, id) = ledger_with_product(20).await;
        let entry = ledger
            .change_price(id, Money::from_minor(1750), PriceChangeReason::ManualUpdate)
            .await
            .unwrap();

        assert_eq!(ledger.current_price(id).await.unwrap(), Money::from_minor(1750));
        let history = ledger.price_history(Some(id)).await.unwrap();
        assert_eq!(history, vec![entry.clone()]);
        assert_eq!(entry.old_price, Money::from_major(20));
        assert_eq!(entry.reason, PriceChangeReason::ManualUpdate);
    }

    #[tokio::test]
    async fn rejected_changes_leave_no_history() {
        let (ledger, id) = ledger_with_product(20).await;

        let err = ledger
            .change_price(id, Money::from_minor(-1), PriceChangeReason::Inflation)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let err = ledger
            .change_price(id, Money::from_major(20), PriceChangeReason::Inflation)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(msg) if msg.contains("already")));

        assert!(ledger.price_history(Some(id)).await.unwrap().is_empty());
        assert_eq!(ledger.current_price(id).await.unwrap(), Money::from_major(20));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (ledger, _) = ledger_with_product(5).await;
        let err = ledger
            .change_price(ProductId::new(), Money::from_major(1), PriceChangeReason::LowStock)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "product", .. }));
    }

    #[tokio::test]
    async fn discount_applies_to_the_price_current_at_write_time() {
        let (ledger, id) = ledger_with_product(100).await;
        ledger
            .change_price(id, Money::from_major(200), PriceChangeReason::ManualUpdate)
            .await
            .unwrap();

        let ten_percent = Discount::from_percentage(10.0).unwrap();
        let entry = ledger.apply_discount(id, ten_percent).await.unwrap().unwrap();
        assert_eq!(entry.old_price, Money::from_major(200));
        assert_eq!(entry.new_price, Money::from_major(180));
        assert_eq!(entry.reason, PriceChangeReason::Campaign);
        assert_eq!(entry.sequence, 2);

        let nothing = Discount::from_percentage(0.0).unwrap();
        assert_eq!(ledger.apply_discount(id, nothing).await.unwrap(), None);
        assert_eq!(ledger.price_history(Some(id)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn history_reconstructs_the_price_curve() {
        let (ledger, id) = ledger_with_product(10).await;
        for (price, reason) in [
            (12, PriceChangeReason::DemandIncrease),
            (9, PriceChangeReason::Campaign),
            (11, PriceChangeReason::Inflation),
        ] {
            ledger.change_price(id, Money::from_major(price), reason).await.unwrap();
        }

        let mut history = ledger.price_history(Some(id)).await.unwrap();
        history.reverse();
        for pair in history.windows(2) {
            assert_eq!(pair[0].new_price, pair[1].old_price);
            assert!(pair[0].changed_at <= pair[1].changed_at);
            assert!(pair[0].sequence < pair[1].sequence);
        }
        assert_eq!(history.last().unwrap().new_price, ledger.current_price(id).await.unwrap());
    }
}
