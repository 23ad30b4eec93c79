//! Campaign engine: percentage discount over every product in a category.
//!
//! Best-effort batch. The category scan only selects products; each discounted
//! price is computed from the price the store holds when it writes, together
//! with its history entry. A failure on one product is logged and recorded in
//! the outcome while the rest of the batch carries on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use pricewise_core::{CategoryId, ProductId};
use pricewise_pricing::Discount;

use crate::error::EngineResult;
use crate::pricing_ledger::PricingLedger;
use crate::store::{CatalogStore, PricingStore};

/// Per-product failure inside a campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignFailure {
    pub product_id: ProductId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignOutcome {
    /// Products whose price was lowered.
    pub discounted: usize,
    /// Products the discount would not move (0% or a zero price).
    pub unchanged: usize,
    pub failed: Vec<CampaignFailure>,
}

pub struct CampaignEngine<S: ?Sized> {
    store: Arc<S>,
    pricing: PricingLedger<S>,
}

impl<S> CampaignEngine<S>
where
    S: CatalogStore + PricingStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            pricing: PricingLedger::new(Arc::clone(&store)),
            store,
        }
    }

    /// Discount every product in `category_id` by `discount_percentage` (0..=100).
    ///
    /// An unknown or empty category discounts nothing and is not an error.
    #[instrument(skip(self), fields(category_id = %category_id), err)]
    pub async fn apply_campaign(
        &self,
        category_id: CategoryId,
        discount_percentage: f64,
    ) -> EngineResult<CampaignOutcome> {
        let discount = Discount::from_percentage(discount_percentage)?;
        let products = self.store.products_in_category(category_id).await?;

        let mut outcome = CampaignOutcome::default();
        for product in products {
            match self.pricing.apply_discount(product.id, discount).await {
                Ok(Some(_)) => outcome.discounted += 1,
                Ok(None) => outcome.unchanged += 1,
                Err(err) => {
                    warn!(product_id = %product.id, error = %err, "campaign price change failed");
                    outcome.failed.push(CampaignFailure {
                        product_id: product.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            discounted = outcome.discounted,
            unchanged = outcome.unchanged,
            failed = outcome.failed.len(),
            "campaign applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::interleaved::InterleavedStore;
    use crate::store::InMemoryStore;
    use chrono::Utc;
    use pricewise_catalog::{Category, NewProduct};
    use pricewise_core::Money;
    use pricewise_inventory::{InventoryRecord, StockThresholds};
    use pricewise_pricing::{PriceChange, PriceChangeReason};

    async fn seed(store: &InMemoryStore, category: Option<CategoryId>, price_minor: i64) -> ProductId {
        let id = ProductId::new();
        let mut new_product = NewProduct::new("Chair", Money::from_minor(price_minor));
        if let Some(category) = category {
            new_product = new_product.with_category(category);
        }
        let product = new_product.into_product(id, Utc::now()).unwrap();
        let record = InventoryRecord::empty(id, StockThresholds::default(), Utc::now().date_naive());
        store.insert_product(&product, &record).await.unwrap();
        id
    }

    async fn category(store: &InMemoryStore) -> CategoryId {
        let category = Category::new("Furniture", None).unwrap();
        store.insert_category(&category).await.unwrap();
        category.id
    }

    #[tokio::test]
    async fn ten_percent_off_a_category() {
        let store = Arc::new(InMemoryStore::new());
        let c = category(&store).await;
        let a = seed(&store, Some(c), 10_000).await;
        let b = seed(&store, Some(c), 5_000).await;
        let outside = seed(&store, None, 7_000).await;

        let engine = CampaignEngine::new(Arc::clone(&store));
        let outcome = engine.apply_campaign(c, 10.0).await.unwrap();
        assert_eq!(outcome.discounted, 2);
        assert!(outcome.failed.is_empty());

        assert_eq!(store.current_price(a).await.unwrap(), Some(Money::from_minor(9_000)));
        assert_eq!(store.current_price(b).await.unwrap(), Some(Money::from_minor(4_500)));
        assert_eq!(store.current_price(outside).await.unwrap(), Some(Money::from_minor(7_000)));

        let history = store.price_history(None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.reason == PriceChangeReason::Campaign));
    }

    #[tokio::test]
    async fn empty_or_unknown_category_discounts_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let c = category(&store).await;
        let engine = CampaignEngine::new(Arc::clone(&store));

        assert_eq!(engine.apply_campaign(c, 25.0).await.unwrap(), CampaignOutcome::default());
        assert_eq!(
            engine.apply_campaign(CategoryId::new(), 25.0).await.unwrap(),
            CampaignOutcome::default()
        );
    }

    #[tokio::test]
    async fn out_of_range_discount_is_invalid_input() {
        let store = Arc::new(InMemoryStore::new());
        let c = category(&store).await;
        seed(&store, Some(c), 1_000).await;
        let engine = CampaignEngine::new(Arc::clone(&store));

        for pct in [-1.0, 100.5, f64::NAN] {
            let err = engine.apply_campaign(c, pct).await.unwrap_err();
            assert!(matches!(err, EngineError::InvalidInput(_)));
        }
        assert!(store.price_history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_percent_leaves_prices_and_history_alone() {
        let store = Arc::new(InMemoryStore::new());
        let c = category(&store).await;
        seed(&store, Some(c), 1_000).await;
        let engine = CampaignEngine::new(Arc::clone(&store));

        let outcome = engine.apply_campaign(c, 0.0).await.unwrap();
        assert_eq!(outcome.discounted, 0);
        assert_eq!(outcome.unchanged, 1);
        assert!(store.price_history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_product_does_not_abort_the_batch() {
        let store = Arc::new(InMemoryStore::new());
        let c = category(&store).await;
        seed(&store, Some(c), 2_000).await;
        seed(&store, Some(c), 4_000).await;
        let engine = CampaignEngine::new(Arc::clone(&store));

        store.inject_write_failure();
        let outcome = engine.apply_campaign(c, 50.0).await.unwrap();

        assert_eq!(outcome.discounted, 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(store.price_history(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn discount_uses_the_price_written_after_the_category_scan() {
        let inner = Arc::new(InMemoryStore::new());
        let c = category(&inner).await;
        let product = seed(&inner, Some(c), 10_000).await;

        let store = Arc::new(InterleavedStore::new(Arc::clone(&inner)));
        store.after_category_scan(move |inner| async move {
            let change = PriceChange::new(product, Money::from_minor(20_000), PriceChangeReason::ManualUpdate).unwrap();
            inner.change_price(&change, Utc::now()).await.unwrap();
        });

        let engine = CampaignEngine::new(Arc::clone(&store));
        let outcome = engine.apply_campaign(c, 10.0).await.unwrap();
        assert_eq!(outcome.discounted, 1);

        assert_eq!(inner.current_price(product).await.unwrap(), Some(Money::from_minor(18_000)));
        let history = inner.price_history(Some(product)).await.unwrap();
        assert_eq!(history.len(), 2);
        let campaign = &history[0];
        assert_eq!(campaign.reason, PriceChangeReason::Campaign);
        assert_eq!(campaign.old_price, Money::from_minor(20_000));
        assert_eq!(campaign.new_price, Money::from_minor(18_000));
        assert_eq!(campaign.sequence, 2);
    }
}
