use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use pricewise_catalog::{
    Category, CategorySummary, Product, ProductFilter, ProductListing, ProductRemoval, Supplier,
    SupplierSummary,
};
use pricewise_core::{
    CategoryId, CustomerId, DomainError, Entity, Money, OrderId, ProductId, SupplierId,
};
use pricewise_inventory::{InventoryRecord, StockLevels, StockStatus};
use pricewise_pricing::{Discount, PriceChange, PriceChangeReason, PriceHistoryEntry};
use pricewise_sales::{Customer, Order, OrderFilter, OrderStatus, ProductSnapshot};

use super::r#trait::{
    CatalogStore, CategoryShare, DashboardStats, InventoryListing, InventoryStore, ListedItem,
    OrderListing, OrderStore, PriceTrend, PricingStore, ProductDetails, ReportingStore, StoreError,
    StoreResult,
};

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    products: BTreeMap<ProductId, Product>,
    inventory: HashMap<ProductId, InventoryRecord>,
    price_history: Vec<PriceHistoryEntry>,
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<OrderId, Order>,
}

impl State {
    fn details(&self, product: &Product) -> ProductDetails {
        ProductDetails {
            product: product.clone(),
            category_name: product
                .category_id
                .and_then(|id| self.categories.get(&id))
                .map(|c| c.name.clone()),
            supplier_name: product
                .supplier_id
                .and_then(|id| self.suppliers.get(&id))
                .map(|s| s.company_name.clone()),
            inventory: self.inventory.get(&product.id).cloned(),
        }
    }

    /// Write `change` and its history entry. The caller has validated it.
    fn append_price_change(
        &mut self,
        change: &PriceChange,
        old_price: Money,
        at: DateTime<Utc>,
    ) -> PriceHistoryEntry {
        let last = self
            .price_history
            .iter()
            .filter(|e| e.product_id == change.product_id)
            .max_by_key(|e| e.sequence);
        let sequence = last.map_or(1, |e| e.sequence + 1);
        let changed_at = last.map_or(at, |e| at.max(e.changed_at));

        let entry = change.record(old_price, sequence, changed_at);
        if let Some(product) = self.products.get_mut(&change.product_id) {
            product.current_price = change.new_price;
        }
        self.price_history.push(entry.clone());
        entry
    }

    fn ensure_contact_unique(&self, customer: &Customer) -> Result<(), DomainError> {
        for other in self.customers.values().filter(|c| c.id != customer.id) {
            if other.email == customer.email {
                return Err(DomainError::invalid_input(format!(
                    "email address {} is already registered",
                    customer.email
                )));
            }
            if customer.phone_number.is_some() && other.phone_number == customer.phone_number {
                return Err(DomainError::invalid_input(format!(
                    "phone number {} is already registered",
                    customer.phone_number.as_deref().unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    fn listing(&self, order: &Order) -> OrderListing {
        let mut suppliers = BTreeSet::new();
        let items = order
            .lines
            .iter()
            .map(|line| {
                let product = self.products.get(&line.product_id);
                if let Some(name) = product
                    .and_then(|p| p.supplier_id)
                    .and_then(|id| self.suppliers.get(&id))
                    .map(|s| s.company_name.clone())
                {
                    suppliers.insert(name);
                }
                ListedItem {
                    product_id: line.product_id,
                    title: product.map(|p| p.title.clone()).unwrap_or_default(),
                    quantity: line.quantity,
                }
            })
            .collect();
        OrderListing {
            order_id: order.id,
            placed_at: order.placed_at,
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address.clone(),
            customer_name: self
                .customers
                .get(&order.customer_id)
                .map(|c| c.full_name.clone())
                .unwrap_or_default(),
            items,
            suppliers: suppliers.into_iter().collect(),
        }
    }

    fn is_ordered(&self, product_id: ProductId) -> bool {
        self.orders
            .values()
            .any(|o| o.lines.iter().any(|l| l.product_id == product_id))
    }
}

/// In-memory store for tests/dev.
///
/// All tables sit behind one `RwLock`. Write operations run every check first
/// and mutate only once all of them have passed, inside a single write-lock
/// critical section, so each operation is atomic and concurrent operations
/// serialize.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_next_write: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write operation fail with a backend error before it
    /// changes anything (fault injection for tests/dev).
    pub fn inject_write_failure(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn read(&self, operation: &'static str) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::backend(operation, "lock poisoned"))
    }

    fn write(&self, operation: &'static str) -> StoreResult<RwLockWriteGuard<'_, State>> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::backend(operation, "injected write failure"));
        }
        self.state
            .write()
            .map_err(|_| StoreError::backend(operation, "lock poisoned"))
    }
}

fn put<E>(table: &mut BTreeMap<E::Id, E>, entity: &E)
where
    E: Entity + Clone,
    E::Id: Ord,
{
    table.insert(entity.id(), entity.clone());
}

/// Overwrite an existing row; `false` when the id is unknown.
fn replace<E>(table: &mut BTreeMap<E::Id, E>, entity: &E) -> bool
where
    E: Entity + Clone,
    E::Id: Ord,
{
    match table.get_mut(&entity.id()) {
        Some(existing) => {
            *existing = entity.clone();
            true
        }
        None => false,
    }
}

fn rounded_mean(sum: i128, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = i128::from(count);
    let half = count / 2;
    let rounded = if sum >= 0 {
        (sum + half) / count
    } else {
        (sum - half) / count
    };
    rounded as i64
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        let mut state = self.write("insert_category")?;
        put(&mut state.categories, category);
        Ok(())
    }

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read("category")?.categories.get(&id).cloned())
    }

    async fn categories(&self) -> StoreResult<Vec<CategorySummary>> {
        let state = self.read("categories")?;
        Ok(state
            .categories
            .values()
            .map(|c| CategorySummary {
                category: c.clone(),
                product_count: state
                    .products
                    .values()
                    .filter(|p| p.category_id == Some(c.id))
                    .count() as i64,
            })
            .collect())
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        let mut state = self.write("insert_supplier")?;
        put(&mut state.suppliers, supplier);
        Ok(())
    }

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(self.read("supplier")?.suppliers.get(&id).cloned())
    }

    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool> {
        let mut state = self.write("update_supplier")?;
        Ok(replace(&mut state.suppliers, supplier))
    }

    async fn suppliers(&self) -> StoreResult<Vec<SupplierSummary>> {
        let state = self.read("suppliers")?;
        Ok(state
            .suppliers
            .values()
            .map(|s| SupplierSummary {
                supplier: s.clone(),
                product_count: state
                    .products
                    .values()
                    .filter(|p| p.supplier_id == Some(s.id))
                    .count() as i64,
            })
            .collect())
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        let mut state = self.write("delete_supplier")?;
        if state.suppliers.remove(&id).is_none() {
            return Ok(false);
        }
        for product in state.products.values_mut() {
            if product.supplier_id == Some(id) {
                product.supplier_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_product(&self, product: &Product, inventory: &InventoryRecord) -> StoreResult<()> {
        let mut state = self.write("insert_product")?;
        if product.id != inventory.product_id {
            return Err(DomainError::invariant("inventory record belongs to another product").into());
        }
        put(&mut state.products, product);
        state.inventory.insert(product.id, inventory.clone());
        Ok(())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductDetails>> {
        let state = self.read("product")?;
        Ok(state.products.get(&id).map(|p| state.details(p)))
    }

    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&PriceChange>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.write("update_product")?;
        let Some(old_price) = state.products.get(&product.id).map(|p| p.current_price) else {
            return Ok(false);
        };
        let current_price = match price_change {
            Some(change) if change.new_price != old_price => {
                state.append_price_change(change, old_price, at);
                change.new_price
            }
            _ => old_price,
        };
        state.products.insert(
            product.id,
            Product {
                current_price,
                ..product.clone()
            },
        );
        Ok(true)
    }

    async fn products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>> {
        let state = self.read("products")?;
        let mut listings: Vec<ProductListing> = state
            .products
            .values()
            .filter(|p| {
                let stock = state.inventory.get(&p.id).map(|i| i.stock_quantity);
                filter.matches(p, stock)
            })
            .map(|p| {
                let details = state.details(p);
                ProductListing {
                    stock_quantity: details.inventory.map(|i| i.stock_quantity),
                    product: details.product,
                    category_name: details.category_name,
                    supplier_name: details.supplier_name,
                }
            })
            .collect();
        listings.sort_by_key(|l| (l.product.created_at, l.product.id));
        Ok(listings)
    }

    async fn products_in_category(&self, id: CategoryId) -> StoreResult<Vec<Product>> {
        let state = self.read("products_in_category")?;
        Ok(state
            .products
            .values()
            .filter(|p| p.category_id == Some(id))
            .cloned()
            .collect())
    }

    async fn remove_product(&self, id: ProductId) -> StoreResult<Option<ProductRemoval>> {
        let mut state = self.write("remove_product")?;
        if !state.products.contains_key(&id) {
            return Ok(None);
        }
        if state.is_ordered(id) {
            if let Some(product) = state.products.get_mut(&id) {
                product.is_active = false;
            }
            return Ok(Some(ProductRemoval::Deactivated));
        }
        state.products.remove(&id);
        state.inventory.remove(&id);
        state.price_history.retain(|e| e.product_id != id);
        Ok(Some(ProductRemoval::Deleted))
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn inventory(&self, product_id: ProductId) -> StoreResult<Option<InventoryRecord>> {
        Ok(self.read("inventory")?.inventory.get(&product_id).cloned())
    }

    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<InventoryRecord> {
        let mut state = self.write("reserve")?;
        let record = state
            .inventory
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found("inventory for product", product_id))?;
        record.reserve(quantity)?;
        Ok(record.clone())
    }

    async fn restock(
        &self,
        product_id: ProductId,
        quantity: i64,
        today: NaiveDate,
    ) -> StoreResult<InventoryRecord> {
        let mut state = self.write("restock")?;
        let record = state
            .inventory
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found("inventory for product", product_id))?;
        record.restock(quantity, today)?;
        Ok(record.clone())
    }

    async fn set_levels(
        &self,
        product_id: ProductId,
        levels: StockLevels,
        today: NaiveDate,
    ) -> StoreResult<InventoryRecord> {
        let mut state = self.write("set_levels")?;
        if !state.products.contains_key(&product_id) {
            return Err(DomainError::not_found("product", product_id).into());
        }
        let record = state
            .inventory
            .entry(product_id)
            .and_modify(|r| r.apply_levels(levels, today))
            .or_insert_with(|| InventoryRecord::from_levels(product_id, levels, today));
        Ok(record.clone())
    }

    async fn inventory_listing(&self) -> StoreResult<Vec<InventoryListing>> {
        let state = self.read("inventory_listing")?;
        let mut rows: Vec<InventoryListing> = state
            .inventory
            .values()
            .filter_map(|record| {
                let product = state.products.get(&record.product_id)?;
                Some(InventoryListing {
                    product_id: record.product_id,
                    title: product.title.clone(),
                    current_price: product.current_price,
                    stock_quantity: record.stock_quantity,
                    thresholds: record.thresholds,
                    last_restock_date: record.last_restock_date,
                    status: record.status(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.stock_quantity
                .cmp(&b.stock_quantity)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(rows)
    }
}

#[async_trait]
impl PricingStore for InMemoryStore {
    async fn current_price(&self, product_id: ProductId) -> StoreResult<Option<Money>> {
        Ok(self
            .read("current_price")?
            .products
            .get(&product_id)
            .map(|p| p.current_price))
    }

    async fn change_price(&self, change: &PriceChange, at: DateTime<Utc>) -> StoreResult<PriceHistoryEntry> {
        let mut state = self.write("change_price")?;
        let old_price = state
            .products
            .get(&change.product_id)
            .map(|p| p.current_price)
            .ok_or_else(|| DomainError::not_found("product", change.product_id))?;
        change.validate_against(old_price)?;
        Ok(state.append_price_change(change, old_price, at))
    }

    async fn apply_discount(
        &self,
        product_id: ProductId,
        discount: Discount,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<PriceHistoryEntry>> {
        let mut state = self.write("apply_discount")?;
        let old_price = state
            .products
            .get(&product_id)
            .map(|p| p.current_price)
            .ok_or_else(|| DomainError::not_found("product", product_id))?;
        let new_price = discount.apply(old_price)?;
        if new_price == old_price {
            return Ok(None);
        }
        let change = PriceChange::new(product_id, new_price, PriceChangeReason::Campaign)?;
        Ok(Some(state.append_price_change(&change, old_price, at)))
    }

    async fn price_history(&self, product_id: Option<ProductId>) -> StoreResult<Vec<PriceHistoryEntry>> {
        let state = self.read("price_history")?;
        let mut entries: Vec<PriceHistoryEntry> = state
            .price_history
            .iter()
            .filter(|e| product_id.is_none_or(|id| e.product_id == id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.changed_at
                .cmp(&a.changed_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        Ok(entries)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        let mut state = self.write("insert_customer")?;
        state.ensure_contact_unique(customer)?;
        put(&mut state.customers, customer);
        Ok(())
    }

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.read("customer")?.customers.get(&id).cloned())
    }

    async fn customers(&self) -> StoreResult<Vec<Customer>> {
        Ok(self.read("customers")?.customers.values().cloned().collect())
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        let mut state = self.write("update_customer")?;
        if !state.customers.contains_key(&customer.id) {
            return Ok(false);
        }
        state.ensure_contact_unique(customer)?;
        Ok(replace(&mut state.customers, customer))
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        let mut state = self.write("delete_customer")?;
        if !state.customers.contains_key(&id) {
            return Ok(false);
        }
        let orders = state.orders.values().filter(|o| o.customer_id == id).count();
        if orders > 0 {
            return Err(DomainError::invalid_input(format!(
                "customer {id} has {orders} order(s) and cannot be deleted"
            ))
            .into());
        }
        state.customers.remove(&id);
        Ok(true)
    }

    async fn product_snapshot(&self, product_id: ProductId) -> StoreResult<Option<ProductSnapshot>> {
        let state = self.read("product_snapshot")?;
        let Some(product) = state.products.get(&product_id) else {
            return Ok(None);
        };
        let Some(record) = state.inventory.get(&product_id) else {
            return Ok(None);
        };
        Ok(Some(ProductSnapshot {
            product_id,
            unit_price: product.current_price,
            available: record.stock_quantity,
        }))
    }

    async fn commit_order(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.write("commit_order")?;
        if !state.customers.contains_key(&order.customer_id) {
            return Err(DomainError::not_found("customer", order.customer_id).into());
        }

        // Check every decrement before applying any of them.
        let mut remaining = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let record = state
                .inventory
                .get(&line.product_id)
                .ok_or_else(|| DomainError::not_found("product", line.product_id))?;
            remaining.push((line.product_id, record.remaining_after(line.quantity)?));
        }

        for (product_id, stock) in remaining {
            if let Some(record) = state.inventory.get_mut(&product_id) {
                record.stock_quantity = stock;
            }
        }
        put(&mut state.orders, order);
        Ok(())
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read("order")?.orders.get(&id).cloned())
    }

    async fn orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let state = self.read("orders")?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then_with(|| b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn order_listings(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderListing>> {
        let orders = self.orders(filter).await?;
        let state = self.read("order_listings")?;
        Ok(orders.iter().map(|order| state.listing(order)).collect())
    }

    async fn transition_order(&self, id: OrderId, next: OrderStatus) -> StoreResult<Order> {
        let mut state = self.write("transition_order")?;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("order", id))?;
        order.transition(next)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl ReportingStore for InMemoryStore {
    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let state = self.read("dashboard_stats")?;
        let total_revenue = Money::checked_sum(
            state
                .orders
                .values()
                .filter(|o| o.status == OrderStatus::Completed)
                .map(|o| o.total_amount),
        )?;
        let price_sum: i128 = state
            .products
            .values()
            .map(|p| i128::from(p.current_price.minor()))
            .sum();
        Ok(DashboardStats {
            total_products: state.products.len() as i64,
            total_categories: state.categories.len() as i64,
            total_orders: state.orders.len() as i64,
            total_revenue,
            low_stock_count: state
                .inventory
                .values()
                .filter(|r| r.status() == StockStatus::Low)
                .count() as i64,
            average_price: Money::from_minor(rounded_mean(price_sum, state.products.len() as i64)),
        })
    }

    async fn category_distribution(&self) -> StoreResult<Vec<CategoryShare>> {
        let state = self.read("category_distribution")?;
        let mut shares: Vec<CategoryShare> = state
            .categories
            .values()
            .map(|c| CategoryShare {
                category_id: c.id,
                name: c.name.clone(),
                product_count: state
                    .products
                    .values()
                    .filter(|p| p.category_id == Some(c.id))
                    .count() as i64,
            })
            .collect();
        shares.sort_by(|a, b| {
            b.product_count
                .cmp(&a.product_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(shares)
    }

    async fn price_trends(&self, days: u32) -> StoreResult<Vec<PriceTrend>> {
        let state = self.read("price_trends")?;
        let mut by_day: BTreeMap<NaiveDate, (i64, i128)> = BTreeMap::new();
        for entry in &state.price_history {
            let day = by_day.entry(entry.changed_at.date_naive()).or_default();
            day.0 += 1;
            day.1 += i128::from(entry.delta());
        }
        Ok(by_day
            .into_iter()
            .rev()
            .take(days as usize)
            .map(|(date, (changes, delta_sum))| PriceTrend {
                date,
                changes,
                average_change: Money::from_minor(rounded_mean(delta_sum, changes)),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewise_catalog::NewProduct;
    use pricewise_inventory::StockThresholds;
    use pricewise_pricing::PriceChangeReason;
    use pricewise_sales::OrderLine;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    async fn seed_product(store: &InMemoryStore, price: i64, stock: i64) -> ProductId {
        let id = ProductId::new();
        let product = NewProduct::new("Kettle", Money::from_major(price))
            .into_product(id, Utc::now())
            .unwrap();
        let mut inventory = InventoryRecord::empty(id, StockThresholds::default(), today());
        inventory.stock_quantity = stock;
        store.insert_product(&product, &inventory).await.unwrap();
        id
    }

    async fn seed_customer(store: &InMemoryStore) -> CustomerId {
        let customer = Customer::new("Grace Hopper", format!("{}@example.com", CustomerId::new())).unwrap();
        store.insert_customer(&customer).await.unwrap();
        customer.id
    }

    #[tokio::test]
    async fn commit_order_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let customer = seed_customer(&store).await;
        let plenty = seed_product(&store, 10, 50).await;
        let scarce = seed_product(&store, 20, 1).await;

        let order = Order::pending(
            OrderId::new(),
            customer,
            "addr".to_string(),
            vec![
                OrderLine { product_id: plenty, quantity: 5, unit_price: Money::from_major(10) },
                OrderLine { product_id: scarce, quantity: 2, unit_price: Money::from_major(20) },
            ],
            Utc::now(),
        )
        .unwrap();

        let err = store.commit_order(&order).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(DomainError::InsufficientStock { available: 1, .. })
        ));
        assert_eq!(store.inventory(plenty).await.unwrap().unwrap().stock_quantity, 50);
        assert!(store.orders(&OrderFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn price_history_sequence_increases_per_product() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 10, 0).await;
        let at = Utc::now();
        for price in [11, 12, 13] {
            let change = PriceChange::new(product, Money::from_major(price), PriceChangeReason::Inflation).unwrap();
            store.change_price(&change, at).await.unwrap();
        }
        let history = store.price_history(Some(product)).await.unwrap();
        let sequences: Vec<u64> = history.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![3, 2, 1]);
        assert_eq!(history[0].new_price, Money::from_major(13));
    }

    #[tokio::test]
    async fn injected_failure_leaves_state_untouched() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 10, 5).await;
        store.inject_write_failure();
        let err = store.reserve(product, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend { operation: "reserve", .. }));
        assert_eq!(store.inventory(product).await.unwrap().unwrap().stock_quantity, 5);
        store.reserve(product, 1).await.unwrap();
    }

    #[test]
    fn rounded_mean_rounds_half_away_from_zero() {
        assert_eq!(rounded_mean(5, 2), 3);
        assert_eq!(rounded_mean(-5, 2), -3);
        assert_eq!(rounded_mean(4, 3), 1);
        assert_eq!(rounded_mean(0, 0), 0);
    }
}
