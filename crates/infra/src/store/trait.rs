use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricewise_catalog::{
    Category, CategorySummary, Product, ProductFilter, ProductListing, ProductRemoval, Supplier,
    SupplierSummary,
};
use pricewise_core::{
    CategoryId, CustomerId, DomainError, Money, OrderId, ProductId, SupplierId,
};
use pricewise_inventory::{InventoryRecord, StockLevels, StockStatus, StockThresholds};
use pricewise_pricing::{Discount, PriceChange, PriceHistoryEntry};
use pricewise_sales::{Customer, Order, OrderFilter, OrderStatus, ProductSnapshot};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// `Rejected` carries a business rule the backend detected inside a
/// transaction (e.g. stock taken by a concurrent order between validation and
/// commit). Everything else is an infrastructure failure; the transaction has
/// been rolled back when any of these is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("storage backend error in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("corrupt row in {operation}: {message}")]
    Corrupt {
        operation: &'static str,
        message: String,
    },

    #[error("connection pool closed")]
    PoolClosed,
}

impl StoreError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }

    pub fn corrupt(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            operation,
            message: message.into(),
        }
    }
}

/// Product with display names and its inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product: Product,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
    pub inventory: Option<InventoryRecord>,
}

impl ProductDetails {
    pub fn stock_status(&self) -> Option<StockStatus> {
        self.inventory.as_ref().map(InventoryRecord::status)
    }
}

/// One row of the inventory report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryListing {
    pub product_id: ProductId,
    pub title: String,
    pub current_price: Money,
    pub stock_quantity: i64,
    pub thresholds: StockThresholds,
    pub last_restock_date: NaiveDate,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_orders: i64,
    /// Sum of totals of `completed` orders.
    pub total_revenue: Money,
    pub low_stock_count: i64,
    /// Mean current price, rounded to the minor unit.
    pub average_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category_id: CategoryId,
    pub name: String,
    pub product_count: i64,
}

/// Price movement aggregated per calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTrend {
    pub date: NaiveDate,
    pub changes: i64,
    /// Mean of `new_price - old_price`, rounded to the minor unit.
    pub average_change: Money,
}

/// One order as shown in order overviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListing {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub customer_name: String,
    pub items: Vec<ListedItem>,
    /// Distinct supplier names of the ordered products, sorted.
    pub suppliers: Vec<String>,
}

impl OrderListing {
    /// `"Hammer x2, Saw x1"`, in line order.
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{} x{}", item.title, item.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedItem {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: i64,
}

/// Products, categories and suppliers.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    /// All categories with product counts, in creation order.
    async fn categories(&self) -> StoreResult<Vec<CategorySummary>>;

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()>;

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>>;

    /// Returns `false` when the supplier does not exist.
    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool>;

    async fn suppliers(&self) -> StoreResult<Vec<SupplierSummary>>;

    /// Delete a supplier and detach its products in one atomic unit.
    ///
    /// Returns `false` when the supplier does not exist.
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool>;

    /// Insert a product together with its inventory record (atomic).
    async fn insert_product(&self, product: &Product, inventory: &InventoryRecord) -> StoreResult<()>;

    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductDetails>>;

    /// Persist descriptive fields, base price and active flag, plus an
    /// optional current price change with its history entry, as one unit.
    ///
    /// `current_price` is only written through `price_change`; a change to
    /// the price the product already has is skipped. Returns `false` when the
    /// product does not exist.
    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&PriceChange>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>>;

    async fn products_in_category(&self, id: CategoryId) -> StoreResult<Vec<Product>>;

    /// Remove a product: deactivate it if any order line references it,
    /// otherwise delete it with its inventory and price history.
    ///
    /// Returns `None` when the product does not exist.
    async fn remove_product(&self, id: ProductId) -> StoreResult<Option<ProductRemoval>>;
}

/// Per-product stock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn inventory(&self, product_id: ProductId) -> StoreResult<Option<InventoryRecord>>;

    /// Atomically take `quantity` if and only if that much is on hand.
    ///
    /// Rejects with `NotFound` or `InsufficientStock` and writes nothing otherwise.
    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<InventoryRecord>;

    async fn restock(
        &self,
        product_id: ProductId,
        quantity: i64,
        today: NaiveDate,
    ) -> StoreResult<InventoryRecord>;

    /// Overwrite quantity and thresholds, creating the record when missing.
    async fn set_levels(
        &self,
        product_id: ProductId,
        levels: StockLevels,
        today: NaiveDate,
    ) -> StoreResult<InventoryRecord>;

    /// Inventory joined with product title and price, lowest stock first.
    async fn inventory_listing(&self) -> StoreResult<Vec<InventoryListing>>;
}

/// Current prices and the append-only price history.
#[async_trait]
pub trait PricingStore: Send + Sync {
    async fn current_price(&self, product_id: ProductId) -> StoreResult<Option<Money>>;

    /// Update the current price and append the matching history entry in one
    /// atomic unit. `at` is raised to the product's latest entry timestamp if
    /// needed so history stays time-ordered.
    async fn change_price(&self, change: &PriceChange, at: DateTime<Utc>) -> StoreResult<PriceHistoryEntry>;

    /// Discount the product's current price, read under the same lock as the
    /// write, and append a `campaign` history entry.
    ///
    /// Returns `None` and writes nothing when the discount leaves the price
    /// unchanged.
    async fn apply_discount(
        &self,
        product_id: ProductId,
        discount: Discount,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<PriceHistoryEntry>>;

    /// Newest first; all products when `product_id` is `None`.
    async fn price_history(&self, product_id: Option<ProductId>) -> StoreResult<Vec<PriceHistoryEntry>>;
}

/// Customers and orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()>;

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    /// In registration order.
    async fn customers(&self) -> StoreResult<Vec<Customer>>;

    /// Email and phone number stay unique across customers.
    ///
    /// Returns `false` when the customer does not exist.
    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool>;

    /// Delete a customer without orders. A customer with any order is
    /// rejected with `InvalidInput` so order history is never destroyed.
    ///
    /// Returns `false` when the customer does not exist.
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool>;

    /// Current price and stock of one product, read together.
    async fn product_snapshot(&self, product_id: ProductId) -> StoreResult<Option<ProductSnapshot>>;

    /// Persist the order, its lines and every stock decrement as one unit.
    ///
    /// A decrement that would go negative rejects the whole commit with
    /// `InsufficientStock`; nothing is written.
    async fn commit_order(&self, order: &Order) -> StoreResult<()>;

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Newest first.
    async fn orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    /// Orders with customer name, line titles and supplier names, newest first.
    async fn order_listings(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderListing>>;

    /// Move an order to `next` under the lifecycle rules, serialized with
    /// other transitions of the same order.
    async fn transition_order(&self, id: OrderId, next: OrderStatus) -> StoreResult<Order>;
}

/// Aggregations for dashboards. No isolation guarantees beyond a single query.
#[async_trait]
pub trait ReportingStore: Send + Sync {
    async fn dashboard_stats(&self) -> StoreResult<DashboardStats>;

    /// Product count per category, largest first.
    async fn category_distribution(&self) -> StoreResult<Vec<CategoryShare>>;

    /// One row per day with price changes, newest first, at most `days` rows.
    async fn price_trends(&self, days: u32) -> StoreResult<Vec<PriceTrend>>;
}

/// Everything the services need from one backend.
pub trait CommerceStore:
    CatalogStore + InventoryStore + PricingStore + OrderStore + ReportingStore
{
}

impl<S> CommerceStore for S where
    S: CatalogStore + InventoryStore + PricingStore + OrderStore + ReportingStore
{
}
