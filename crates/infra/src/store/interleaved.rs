//! Test store that runs another writer's operation between an engine's read
//! and its following write.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pricewise_catalog::{
    Category, CategorySummary, Product, ProductFilter, ProductListing, ProductRemoval, Supplier,
    SupplierSummary,
};
use pricewise_core::{CategoryId, CustomerId, Money, OrderId, ProductId, SupplierId};
use pricewise_inventory::InventoryRecord;
use pricewise_pricing::{Discount, PriceChange, PriceHistoryEntry};
use pricewise_sales::{Customer, Order, OrderFilter, OrderStatus, ProductSnapshot};

use super::r#trait::{CatalogStore, OrderListing, OrderStore, PricingStore, ProductDetails, StoreResult};
use super::InMemoryStore;

type Interleaving = Box<dyn FnOnce(Arc<InMemoryStore>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Delegates to an [`InMemoryStore`]; a registered interleaving runs once,
/// right after the read it is attached to has returned.
pub struct InterleavedStore {
    inner: Arc<InMemoryStore>,
    after_category_scan: Mutex<Option<Interleaving>>,
    after_snapshot: Mutex<Option<Interleaving>>,
}

impl InterleavedStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            after_category_scan: Mutex::new(None),
            after_snapshot: Mutex::new(None),
        }
    }

    pub fn after_category_scan<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<InMemoryStore>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self.after_category_scan.lock().unwrap() = Some(Box::new(move |store| Box::pin(f(store))));
    }

    pub fn after_snapshot<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<InMemoryStore>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self.after_snapshot.lock().unwrap() = Some(Box::new(move |store| Box::pin(f(store))));
    }

    async fn run(&self, slot: &Mutex<Option<Interleaving>>) {
        let interleaving = slot.lock().unwrap().take();
        if let Some(interleaving) = interleaving {
            interleaving(Arc::clone(&self.inner)).await;
        }
    }
}

#[async_trait]
impl CatalogStore for InterleavedStore {
    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.inner.insert_category(category).await
    }

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.inner.category(id).await
    }

    async fn categories(&self) -> StoreResult<Vec<CategorySummary>> {
        self.inner.categories().await
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        self.inner.insert_supplier(supplier).await
    }

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        self.inner.supplier(id).await
    }

    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool> {
        self.inner.update_supplier(supplier).await
    }

    async fn suppliers(&self) -> StoreResult<Vec<SupplierSummary>> {
        self.inner.suppliers().await
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        self.inner.delete_supplier(id).await
    }

    async fn insert_product(&self, product: &Product, inventory: &InventoryRecord) -> StoreResult<()> {
        self.inner.insert_product(product, inventory).await
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductDetails>> {
        self.inner.product(id).await
    }

    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&PriceChange>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.inner.update_product(product, price_change, at).await
    }

    async fn products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>> {
        self.inner.products(filter).await
    }

    async fn products_in_category(&self, id: CategoryId) -> StoreResult<Vec<Product>> {
        let products = self.inner.products_in_category(id).await?;
        self.run(&self.after_category_scan).await;
        Ok(products)
    }

    async fn remove_product(&self, id: ProductId) -> StoreResult<Option<ProductRemoval>> {
        self.inner.remove_product(id).await
    }
}

#[async_trait]
impl PricingStore for InterleavedStore {
    async fn current_price(&self, product_id: ProductId) -> StoreResult<Option<Money>> {
        self.inner.current_price(product_id).await
    }

    async fn change_price(&self, change: &PriceChange, at: DateTime<Utc>) -> StoreResult<PriceHistoryEntry> {
        self.inner.change_price(change, at).await
    }

    async fn apply_discount(
        &self,
        product_id: ProductId,
        discount: Discount,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<PriceHistoryEntry>> {
        self.inner.apply_discount(product_id, discount, at).await
    }

    async fn price_history(&self, product_id: Option<ProductId>) -> StoreResult<Vec<PriceHistoryEntry>> {
        self.inner.price_history(product_id).await
    }
}

#[async_trait]
impl OrderStore for InterleavedStore {
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        self.inner.insert_customer(customer).await
    }

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        self.inner.customer(id).await
    }

    async fn customers(&self) -> StoreResult<Vec<Customer>> {
        self.inner.customers().await
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        self.inner.update_customer(customer).await
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        self.inner.delete_customer(id).await
    }

    async fn product_snapshot(&self, product_id: ProductId) -> StoreResult<Option<ProductSnapshot>> {
        let snapshot = self.inner.product_snapshot(product_id).await?;
        self.run(&self.after_snapshot).await;
        Ok(snapshot)
    }

    async fn commit_order(&self, order: &Order) -> StoreResult<()> {
        self.inner.commit_order(order).await
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        self.inner.order(id).await
    }

    async fn orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        self.inner.orders(filter).await
    }

    async fn order_listings(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderListing>> {
        self.inner.order_listings(filter).await
    }

    async fn transition_order(&self, id: OrderId, next: OrderStatus) -> StoreResult<Order> {
        self.inner.transition_order(id, next).await
    }
}
