//! Catalog service: products, categories and suppliers.
//!
//! A product update that carries a new current price records it in the price
//! history with reason `manual_update`, in the same store unit as the rest of
//! the update, so every price the catalog ever showed has a history entry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use pricewise_catalog::{
    Category, CategorySummary, NewProduct, Product, ProductFilter, ProductListing, ProductPatch,
    ProductRemoval, Supplier, SupplierPatch, SupplierSummary,
};
use pricewise_core::{CategoryId, DomainError, ProductId, SupplierId};
use pricewise_inventory::{InventoryRecord, StockThresholds};
use pricewise_pricing::{PriceChange, PriceChangeReason};

use crate::error::EngineResult;
use crate::store::{CatalogStore, ProductDetails};

pub struct CatalogService<S: ?Sized> {
    store: Arc<S>,
    default_thresholds: StockThresholds,
}

impl<S> CatalogService<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>, default_thresholds: StockThresholds) -> Self {
        Self {
            store,
            default_thresholds,
        }
    }

    #[instrument(skip(self, description), err)]
    pub async fn create_category(&self, name: &str, description: Option<String>) -> EngineResult<Category> {
        let category = Category::new(name, description)?;
        self.store.insert_category(&category).await?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    pub async fn categories(&self) -> EngineResult<Vec<CategorySummary>> {
        Ok(self.store.categories().await?)
    }

    #[instrument(skip(self, details), err)]
    pub async fn create_supplier(&self, company_name: &str, details: SupplierPatch) -> EngineResult<Supplier> {
        let mut supplier = Supplier::new(company_name)?;
        details.apply(&mut supplier)?;
        self.store.insert_supplier(&supplier).await?;
        info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn supplier(&self, id: SupplierId) -> EngineResult<Supplier> {
        self.store
            .supplier(id)
            .await?
            .ok_or_else(|| DomainError::not_found("supplier", id).into())
    }

    pub async fn suppliers(&self) -> EngineResult<Vec<SupplierSummary>> {
        Ok(self.store.suppliers().await?)
    }

    #[instrument(skip(self, patch), fields(supplier_id = %id), err)]
    pub async fn update_supplier(&self, id: SupplierId, patch: SupplierPatch) -> EngineResult<Supplier> {
        let mut supplier = self.supplier(id).await?;
        patch.apply(&mut supplier)?;
        if !self.store.update_supplier(&supplier).await? {
            return Err(DomainError::not_found("supplier", id).into());
        }
        Ok(supplier)
    }

    /// Delete a supplier; its products stay and lose the reference.
    #[instrument(skip(self), fields(supplier_id = %id), err)]
    pub async fn delete_supplier(&self, id: SupplierId) -> EngineResult<()> {
        if !self.store.delete_supplier(id).await? {
            return Err(DomainError::not_found("supplier", id).into());
        }
        info!("supplier deleted");
        Ok(())
    }

    /// Create a product and its empty inventory record together.
    #[instrument(skip(self, new_product), fields(title = %new_product.title), err)]
    pub async fn create_product(&self, new_product: NewProduct) -> EngineResult<Product> {
        new_product.validate()?;
        self.ensure_references(new_product.category_id, new_product.supplier_id)
            .await?;

        let now = Utc::now();
        let product = new_product.into_product(ProductId::new(), now)?;
        let inventory = InventoryRecord::empty(product.id, self.default_thresholds, now.date_naive());
        self.store.insert_product(&product, &inventory).await?;
        info!(product_id = %product.id, price = %product.current_price, "product created");
        Ok(product)
    }

    pub async fn product(&self, id: ProductId) -> EngineResult<ProductDetails> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id).into())
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> EngineResult<Vec<ProductListing>> {
        filter.validate()?;
        Ok(self.store.products(filter).await?)
    }

    /// Apply a partial update.
    ///
    /// Descriptive fields, base price, the active flag and a different current
    /// price are written as one unit; the price change is recorded with reason
    /// `manual_update`. On any failure the product is left as it was.
    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> EngineResult<ProductDetails> {
        patch.validate()?;
        let mut product = self.product(id).await?.product;
        self.ensure_references(patch.category_id, patch.supplier_id)
            .await?;

        let price_change = patch
            .current_price
            .filter(|price| *price != product.current_price)
            .map(|price| PriceChange::new(id, price, PriceChangeReason::ManualUpdate))
            .transpose()?;
        if !patch.touches_details() && price_change.is_none() {
            return self.product(id).await;
        }

        patch.apply_details(&mut product);
        if !self
            .store
            .update_product(&product, price_change.as_ref(), Utc::now())
            .await?
        {
            return Err(DomainError::not_found("product", id).into());
        }
        info!(price_changed = price_change.is_some(), "product updated");
        self.product(id).await
    }

    /// Deactivate a product that appears on any order, delete it otherwise.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete_product(&self, id: ProductId) -> EngineResult<ProductRemoval> {
        let removal = self
            .store
            .remove_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))?;
        info!(?removal, "product removed");
        Ok(removal)
    }

    async fn ensure_references(
        &self,
        category_id: Option<CategoryId>,
        supplier_id: Option<SupplierId>,
    ) -> EngineResult<()> {
        if let Some(category_id) = category_id {
            if self.store.category(category_id).await?.is_none() {
                return Err(DomainError::not_found("category", category_id).into());
            }
        }
        if let Some(supplier_id) = supplier_id {
            self.supplier(supplier_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::order_engine::OrderEngine;
    use crate::store::{InMemoryStore, InventoryStore, PricingStore};
    use pricewise_core::Money;
    use pricewise_sales::RequestedItem;

    fn service() -> (Arc<InMemoryStore>, CatalogService<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (Arc::clone(&store), CatalogService::new(store, StockThresholds::default()))
    }

    #[tokio::test]
    async fn created_product_has_empty_inventory_and_names() {
        let (_, catalog) = service();
        let category = catalog.create_category("Electronics", None).await.unwrap();
        let supplier = catalog
            .create_supplier("Acme", SupplierPatch::default())
            .await
            .unwrap();

        let product = catalog
            .create_product(
                NewProduct::new("Headphones", Money::from_major(80))
                    .with_category(category.id)
                    .with_supplier(supplier.id),
            )
            .await
            .unwrap();

        let details = catalog.product(product.id).await.unwrap();
        assert_eq!(details.category_name.as_deref(), Some("Electronics"));
        assert_eq!(details.supplier_name.as_deref(), Some("Acme"));
        assert_eq!(details.inventory.as_ref().unwrap().stock_quantity, 0);
        assert_eq!(details.product.current_price, Money::from_major(80));
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() {
        let (_, catalog) = service();
        let err = catalog
            .create_product(NewProduct::new("Orphan", Money::from_major(1)).with_category(CategoryId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "category", .. }));
    }

    #[tokio::test]
    async fn price_edits_go_through_the_history() {
        let (store, catalog) = service();
        let product = catalog
            .create_product(NewProduct::new("Mug", Money::from_major(8)))
            .await
            .unwrap();

        let patch = ProductPatch {
            title: Some("Large Mug".to_string()),
            current_price: Some(Money::from_major(9)),
            ..ProductPatch::default()
        };
        let details = catalog.update_product(product.id, patch).await.unwrap();
        assert_eq!(details.product.title, "Large Mug");
        assert_eq!(details.product.current_price, Money::from_major(9));

        let history = store.price_history(Some(product.id)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, PriceChangeReason::ManualUpdate);

        let same_price = ProductPatch {
            current_price: Some(Money::from_major(9)),
            ..ProductPatch::default()
        };
        catalog.update_product(product.id, same_price).await.unwrap();
        assert_eq!(store.price_history(Some(product.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_price_change_leaves_details_untouched() {
        let (store, catalog) = service();
        let product = catalog
            .create_product(NewProduct::new("Mug", Money::from_major(8)).with_description("stoneware"))
            .await
            .unwrap();

        store.inject_write_failure();
        let patch = ProductPatch {
            title: Some("Large Mug".to_string()),
            description: Some("porcelain".to_string()),
            current_price: Some(Money::from_major(12)),
            ..ProductPatch::default()
        };
        let err = catalog.update_product(product.id, patch).await.unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));

        let details = catalog.product(product.id).await.unwrap();
        assert_eq!(details.product.title, "Mug");
        assert_eq!(details.product.description.as_deref(), Some("stoneware"));
        assert_eq!(details.product.current_price, Money::from_major(8));
        assert!(store.price_history(Some(product.id)).await.unwrap().is_empty());

        let err = catalog
            .update_product(
                ProductId::new(),
                ProductPatch {
                    current_price: Some(Money::from_major(1)),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "product", .. }));
    }

    #[tokio::test]
    async fn filter_by_category_price_and_search() {
        let (_, catalog) = service();
        let kitchen = catalog.create_category("Kitchen", None).await.unwrap();
        catalog
            .create_product(NewProduct::new("Chef Knife", Money::from_major(45)).with_category(kitchen.id))
            .await
            .unwrap();
        catalog
            .create_product(
                NewProduct::new("Cutting Board", Money::from_major(20))
                    .with_category(kitchen.id)
                    .with_description("Oak, for knife work"),
            )
            .await
            .unwrap();
        catalog
            .create_product(NewProduct::new("Desk", Money::from_major(200)))
            .await
            .unwrap();

        let filter = ProductFilter::new().in_category(kitchen.id).search("KNIFE");
        let titles: Vec<String> = catalog
            .list_products(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.product.title)
            .collect();
        assert_eq!(titles, vec!["Chef Knife", "Cutting Board"]);

        let cheap = ProductFilter::new().price_between(None, Some(Money::from_major(30)));
        assert_eq!(catalog.list_products(&cheap).await.unwrap().len(), 1);

        let inverted = ProductFilter::new().price_between(Some(Money::from_major(5)), Some(Money::from_major(1)));
        assert!(matches!(
            catalog.list_products(&inverted).await.unwrap_err(),
            EngineError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn ordered_products_are_deactivated_not_deleted() {
        let (store, catalog) = service();
        let kept = catalog
            .create_product(NewProduct::new("Lamp", Money::from_major(30)))
            .await
            .unwrap();
        let dropped = catalog
            .create_product(NewProduct::new("Bulb", Money::from_major(2)))
            .await
            .unwrap();
        store.restock(kept.id, 5, Utc::now().date_naive()).await.unwrap();

        let orders = OrderEngine::new(Arc::clone(&store));
        let customer = orders.register_customer("Lin", "lin@example.com").await.unwrap();
        orders
            .place_order(customer.id, "addr", vec![RequestedItem::new(kept.id, 1)])
            .await
            .unwrap();

        assert_eq!(catalog.delete_product(kept.id).await.unwrap(), ProductRemoval::Deactivated);
        assert!(!catalog.product(kept.id).await.unwrap().product.is_active);

        assert_eq!(catalog.delete_product(dropped.id).await.unwrap(), ProductRemoval::Deleted);
        assert!(matches!(
            catalog.product(dropped.id).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
        assert!(store.inventory(dropped.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_supplier_detaches_its_products() {
        let (_, catalog) = service();
        let supplier = catalog
            .create_supplier("Globex", SupplierPatch::default())
            .await
            .unwrap();
        let product = catalog
            .create_product(NewProduct::new("Gizmo", Money::from_major(5)).with_supplier(supplier.id))
            .await
            .unwrap();
        assert_eq!(catalog.suppliers().await.unwrap()[0].product_count, 1);

        catalog.delete_supplier(supplier.id).await.unwrap();
        let details = catalog.product(product.id).await.unwrap();
        assert_eq!(details.product.supplier_id, None);
        assert!(matches!(
            catalog.delete_supplier(supplier.id).await.unwrap_err(),
            EngineError::NotFound { entity: "supplier", .. }
        ));
    }
}
