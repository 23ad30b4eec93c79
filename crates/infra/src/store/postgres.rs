//! Postgres-backed store.
//!
//! Every multi-row write runs in one transaction. Business rules that depend on
//! current rows (stock, current price, order status) are checked against rows
//! locked with `SELECT ... FOR UPDATE` or enforced by a conditional `UPDATE`,
//! so concurrent writers serialize per row.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Rejected(InvalidInput)` |
//! | Database (foreign key violation) | `23503` | `Rejected(InvalidInput)` |
//! | Database (check constraint violation) | `23514` | `Rejected(InvariantViolation)` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed | N/A | `PoolClosed` |
//! | RowNotFound / Other | N/A | `Backend` |
//!
//! Stock decrements for one order are applied in product id order, so two
//! orders sharing products always lock inventory rows in the same sequence.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{instrument, Span};
use uuid::Uuid;

use pricewise_catalog::{
    Category, CategorySummary, Product, ProductFilter, ProductListing, ProductRemoval, Supplier,
    SupplierSummary,
};
use pricewise_core::{
    CategoryId, CustomerId, DomainError, Money, OrderId, PriceHistoryEntryId, ProductId, SupplierId,
};
use pricewise_inventory::{ensure_positive_quantity, InventoryRecord, StockLevels, StockThresholds};
use pricewise_pricing::{Discount, PriceChange, PriceChangeReason, PriceHistoryEntry};
use pricewise_sales::{
    Customer, CustomerRole, Order, OrderFilter, OrderLine, OrderStatus, ProductSnapshot,
};

use super::r#trait::{
    CatalogStore, CategoryShare, DashboardStats, InventoryListing, InventoryStore, ListedItem,
    OrderListing, OrderStore, PriceTrend, PricingStore, ProductDetails, ReportingStore, StoreError,
    StoreResult,
};

const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.title,
        p.description,
        p.base_price,
        p.current_price,
        p.is_active,
        p.category_id,
        p.supplier_id,
        p.created_at,
        c.name AS category_name,
        s.company_name AS supplier_name,
        i.stock_quantity,
        i.low_stock_threshold,
        i.high_stock_threshold,
        i.last_restock_date
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN suppliers s ON s.id = p.supplier_id
    LEFT JOIN inventory i ON i.product_id = p.id
"#;

const INVENTORY_COLUMNS: &str =
    "product_id, stock_quantity, low_stock_threshold, high_stock_threshold, last_restock_date";

const CUSTOMER_COLUMNS: &str = "id, full_name, email, phone_number, role";

const ORDER_COLUMNS: &str = "id, customer_id, placed_at, status, total_amount, shipping_address";

/// Postgres implementation of every store trait.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

/// Roll back and surface a business rule failure detected inside the transaction.
async fn reject<T>(tx: Transaction<'_, Postgres>, err: DomainError) -> StoreResult<T> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))?;
    Err(err.into())
}

async fn lock_inventory(
    tx: &mut Transaction<'_, Postgres>,
    operation: &'static str,
    product_id: ProductId,
) -> StoreResult<Option<InventoryRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1 FOR UPDATE"
    ))
    .bind(product_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;

    row.map(|row| InventoryRow::decode(operation, &row)?.into_record(operation))
        .transpose()
}

async fn write_inventory(
    tx: &mut Transaction<'_, Postgres>,
    operation: &'static str,
    record: &InventoryRecord,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory (
            product_id,
            stock_quantity,
            low_stock_threshold,
            high_stock_threshold,
            last_restock_date
        )
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id) DO UPDATE SET
            stock_quantity = EXCLUDED.stock_quantity,
            low_stock_threshold = EXCLUDED.low_stock_threshold,
            high_stock_threshold = EXCLUDED.high_stock_threshold,
            last_restock_date = EXCLUDED.last_restock_date
        "#,
    )
    .bind(record.product_id.as_uuid())
    .bind(record.stock_quantity)
    .bind(record.thresholds.low())
    .bind(record.thresholds.high())
    .bind(record.last_restock_date)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(())
}

/// Current price of a product, row-locked until the transaction ends.
async fn lock_price(
    tx: &mut Transaction<'_, Postgres>,
    operation: &'static str,
    product_id: ProductId,
) -> StoreResult<Option<Money>> {
    let price: Option<i64> =
        sqlx::query_scalar("SELECT current_price FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(price.map(Money::from_minor))
}

/// Set the new current price and append its history row. The product row must
/// already be locked by `lock_price`.
async fn append_price_change(
    tx: &mut Transaction<'_, Postgres>,
    change: &PriceChange,
    old_price: Money,
    at: DateTime<Utc>,
) -> StoreResult<PriceHistoryEntry> {
    let last = sqlx::query(
        r#"
        SELECT sequence, changed_at
        FROM price_history
        WHERE product_id = $1
        ORDER BY sequence DESC
        LIMIT 1
        "#,
    )
    .bind(change.product_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("last_price_change", e))?;

    let (sequence, changed_at) = match last {
        Some(row) => {
            let sequence: i64 = get(&row, "change_price", "sequence")?;
            let last_at: DateTime<Utc> = get(&row, "change_price", "changed_at")?;
            (to_sequence("change_price", sequence)? + 1, at.max(last_at))
        }
        None => (1, at),
    };
    let entry = change.record(old_price, sequence, changed_at);

    sqlx::query("UPDATE products SET current_price = $2 WHERE id = $1")
        .bind(change.product_id.as_uuid())
        .bind(change.new_price.minor())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update_price", e))?;

    sqlx::query(
        r#"
        INSERT INTO price_history (
            id,
            product_id,
            sequence,
            old_price,
            new_price,
            reason,
            changed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.product_id.as_uuid())
    .bind(entry.sequence as i64)
    .bind(entry.old_price.minor())
    .bind(entry.new_price.minor())
    .bind(entry.reason.as_str())
    .bind(entry.changed_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_price_history", e))?;

    Ok(entry)
}

async fn load_lines(
    executor: impl sqlx::PgExecutor<'_>,
    operation: &'static str,
    order_ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<OrderLine>>> {
    let rows = sqlx::query(
        r#"
        SELECT order_id, line_no, product_id, quantity, unit_price
        FROM order_lines
        WHERE order_id = ANY($1)
        ORDER BY order_id, line_no
        "#,
    )
    .bind(order_ids)
    .fetch_all(executor)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;

    let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in rows {
        let line = OrderLineRow::decode(operation, &row)?;
        lines.entry(line.order_id).or_default().push(line.into());
    }
    Ok(lines)
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("category", e))?;
        row.map(|row| CategoryRow::decode("category", &row).map(Category::from))
            .transpose()
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn categories(&self) -> StoreResult<Vec<CategorySummary>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.description, COUNT(p.id) AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name, c.description, c.created_at
            ORDER BY c.created_at, c.id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("categories", e))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(CategorySummary {
                category: CategoryRow::decode("categories", &row)?.into(),
                product_count: get(&row, "categories", "product_count")?,
            });
        }
        Span::current().record("rows", summaries.len());
        Ok(summaries)
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, company_name, contact_email, tax_number, address)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.company_name)
        .bind(&supplier.contact_email)
        .bind(&supplier.tax_number)
        .bind(&supplier.address)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query(
            "SELECT id, company_name, contact_email, tax_number, address FROM suppliers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("supplier", e))?;
        row.map(|row| SupplierRow::decode("supplier", &row).map(Supplier::from))
            .transpose()
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET company_name = $2, contact_email = $3, tax_number = $4, address = $5
            WHERE id = $1
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.company_name)
        .bind(&supplier.contact_email)
        .bind(&supplier.tax_number)
        .bind(&supplier.address)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_supplier", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn suppliers(&self) -> StoreResult<Vec<SupplierSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.company_name, s.contact_email, s.tax_number, s.address,
                   COUNT(p.id) AS product_count
            FROM suppliers s
            LEFT JOIN products p ON p.supplier_id = s.id
            GROUP BY s.id
            ORDER BY s.created_at, s.id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("suppliers", e))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(SupplierSummary {
                supplier: SupplierRow::decode("suppliers", &row)?.into(),
                product_count: get(&row, "suppliers", "product_count")?,
            });
        }
        Span::current().record("rows", summaries.len());
        Ok(summaries)
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        let mut tx = self.begin().await?;

        sqlx::query("UPDATE products SET supplier_id = NULL WHERE supplier_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("detach_supplier", e))?;

        let deleted = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_supplier", e))?
            .rows_affected();

        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(false);
        }
        commit(tx).await?;
        Ok(true)
    }

    #[instrument(skip(self, product, inventory), fields(product_id = %product.id), err)]
    async fn insert_product(&self, product: &Product, inventory: &InventoryRecord) -> StoreResult<()> {
        if product.id != inventory.product_id {
            return Err(DomainError::invariant("inventory record belongs to another product").into());
        }
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id,
                title,
                description,
                base_price,
                current_price,
                is_active,
                category_id,
                supplier_id,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.base_price.minor())
        .bind(product.current_price.minor())
        .bind(product.is_active)
        .bind(product.category_id.map(Uuid::from))
        .bind(product.supplier_id.map(Uuid::from))
        .bind(product.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        write_inventory(&mut tx, "insert_inventory", inventory).await?;
        commit(tx).await
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductDetails>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.map(|row| ProductRow::decode("product", &row)?.into_details("product"))
            .transpose()
    }

    #[instrument(skip(self, product, price_change), fields(product_id = %product.id), err)]
    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&PriceChange>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tx = self.begin().await?;

        let Some(old_price) = lock_price(&mut tx, "update_product", product.id).await? else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE products
            SET title = $2,
                description = $3,
                base_price = $4,
                is_active = $5,
                category_id = $6,
                supplier_id = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.base_price.minor())
        .bind(product.is_active)
        .bind(product.category_id.map(Uuid::from))
        .bind(product.supplier_id.map(Uuid::from))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if let Some(change) = price_change.filter(|c| c.new_price != old_price) {
            append_price_change(&mut tx, change, old_price, at).await?;
        }

        commit(tx).await?;
        Ok(true)
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(PRODUCT_SELECT);
        query.push(" WHERE TRUE");
        if let Some(category_id) = filter.category_id {
            query.push(" AND p.category_id = ").push_bind(Uuid::from(category_id));
        }
        if let Some(is_active) = filter.is_active {
            query.push(" AND p.is_active = ").push_bind(is_active);
        }
        if let Some(min) = filter.min_price {
            query.push(" AND p.current_price >= ").push_bind(min.minor());
        }
        if let Some(max) = filter.max_price {
            query.push(" AND p.current_price <= ").push_bind(max.minor());
        }
        if let Some(min) = filter.min_stock {
            query.push(" AND i.stock_quantity >= ").push_bind(min);
        }
        if let Some(max) = filter.max_stock {
            query.push(" AND i.stock_quantity <= ").push_bind(max);
        }
        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", escape_like(&term));
            query
                .push(" AND (LOWER(p.title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(COALESCE(p.description, '')) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        query.push(" ORDER BY p.created_at, p.id");

        let rows = query
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("products", e))?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            let details = ProductRow::decode("products", &row)?.into_details("products")?;
            listings.push(ProductListing {
                stock_quantity: details.inventory.as_ref().map(|i| i.stock_quantity),
                product: details.product,
                category_name: details.category_name,
                supplier_name: details.supplier_name,
            });
        }
        Span::current().record("rows", listings.len());
        Ok(listings)
    }

    #[instrument(skip(self), fields(category_id = %id, rows = tracing::field::Empty), err)]
    async fn products_in_category(&self, id: CategoryId) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "{PRODUCT_SELECT} WHERE p.category_id = $1 ORDER BY p.id"
        ))
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("products_in_category", e))?;

        let products = rows
            .iter()
            .map(|row| {
                ProductRow::decode("products_in_category", row)?
                    .into_details("products_in_category")
                    .map(|d| d.product)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id, removal = tracing::field::Empty), err)]
    async fn remove_product(&self, id: ProductId) -> StoreResult<Option<ProductRemoval>> {
        let mut tx = self.begin().await?;

        let exists = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_product", e))?
            .is_some();
        if !exists {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        }

        let ordered: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_lines WHERE product_id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("product_is_ordered", e))?;

        let removal = if ordered {
            sqlx::query("UPDATE products SET is_active = FALSE WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("deactivate_product", e))?;
            ProductRemoval::Deactivated
        } else {
            for statement in [
                "DELETE FROM price_history WHERE product_id = $1",
                "DELETE FROM inventory WHERE product_id = $1",
                "DELETE FROM products WHERE id = $1",
            ] {
                sqlx::query(statement)
                    .bind(id.as_uuid())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_product", e))?;
            }
            ProductRemoval::Deleted
        };

        commit(tx).await?;
        Span::current().record("removal", tracing::field::debug(removal));
        Ok(Some(removal))
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn inventory(&self, product_id: ProductId) -> StoreResult<Option<InventoryRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1"
        ))
        .bind(product_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory", e))?;
        row.map(|row| InventoryRow::decode("inventory", &row)?.into_record("inventory"))
            .transpose()
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<InventoryRecord> {
        ensure_positive_quantity(quantity)?;
        let mut tx = self.begin().await?;

        let Some(mut record) = lock_inventory(&mut tx, "reserve", product_id).await? else {
            return reject(tx, DomainError::not_found("inventory for product", product_id)).await;
        };
        if let Err(err) = record.reserve(quantity) {
            return reject(tx, err).await;
        }

        write_inventory(&mut tx, "reserve", &record).await?;
        commit(tx).await?;
        Ok(record)
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn restock(
        &self,
        product_id: ProductId,
        quantity: i64,
        today: NaiveDate,
    ) -> StoreResult<InventoryRecord> {
        ensure_positive_quantity(quantity)?;
        let mut tx = self.begin().await?;

        let Some(mut record) = lock_inventory(&mut tx, "restock", product_id).await? else {
            return reject(tx, DomainError::not_found("inventory for product", product_id)).await;
        };
        if let Err(err) = record.restock(quantity, today) {
            return reject(tx, err).await;
        }

        write_inventory(&mut tx, "restock", &record).await?;
        commit(tx).await?;
        Ok(record)
    }

    #[instrument(skip(self, levels), fields(product_id = %product_id, quantity = levels.quantity), err)]
    async fn set_levels(
        &self,
        product_id: ProductId,
        levels: StockLevels,
        today: NaiveDate,
    ) -> StoreResult<InventoryRecord> {
        let mut tx = self.begin().await?;

        let product_exists = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_levels", e))?
            .is_some();
        if !product_exists {
            return reject(tx, DomainError::not_found("product", product_id)).await;
        }

        let record = match lock_inventory(&mut tx, "set_levels", product_id).await? {
            Some(mut record) => {
                record.apply_levels(levels, today);
                record
            }
            None => InventoryRecord::from_levels(product_id, levels, today),
        };

        write_inventory(&mut tx, "set_levels", &record).await?;
        commit(tx).await?;
        Ok(record)
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn inventory_listing(&self) -> StoreResult<Vec<InventoryListing>> {
        let rows = sqlx::query(
            r#"
            SELECT
                i.product_id,
                i.stock_quantity,
                i.low_stock_threshold,
                i.high_stock_threshold,
                i.last_restock_date,
                p.title,
                p.current_price
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            ORDER BY i.stock_quantity ASC, p.title ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_listing", e))?;

        let mut listing = Vec::with_capacity(rows.len());
        for row in rows {
            let record = InventoryRow::decode("inventory_listing", &row)?.into_record("inventory_listing")?;
            listing.push(InventoryListing {
                product_id: record.product_id,
                title: get(&row, "inventory_listing", "title")?,
                current_price: Money::from_minor(get(&row, "inventory_listing", "current_price")?),
                stock_quantity: record.stock_quantity,
                thresholds: record.thresholds,
                last_restock_date: record.last_restock_date,
                status: record.status(),
            });
        }
        Span::current().record("rows", listing.len());
        Ok(listing)
    }
}

#[async_trait]
impl PricingStore for PostgresStore {
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn current_price(&self, product_id: ProductId) -> StoreResult<Option<Money>> {
        let price: Option<i64> = sqlx::query_scalar("SELECT current_price FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("current_price", e))?;
        Ok(price.map(Money::from_minor))
    }

    #[instrument(
        skip(self, change),
        fields(product_id = %change.product_id, new_price = %change.new_price, reason = %change.reason),
        err
    )]
    async fn change_price(&self, change: &PriceChange, at: DateTime<Utc>) -> StoreResult<PriceHistoryEntry> {
        let mut tx = self.begin().await?;

        let Some(old_price) = lock_price(&mut tx, "change_price", change.product_id).await? else {
            return reject(tx, DomainError::not_found("product", change.product_id)).await;
        };
        if let Err(err) = change.validate_against(old_price) {
            return reject(tx, err).await;
        }

        let entry = append_price_change(&mut tx, change, old_price, at).await?;
        commit(tx).await?;
        Ok(entry)
    }

    #[instrument(
        skip(self, discount),
        fields(product_id = %product_id, basis_points = discount.basis_points()),
        err
    )]
    async fn apply_discount(
        &self,
        product_id: ProductId,
        discount: Discount,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<PriceHistoryEntry>> {
        let mut tx = self.begin().await?;

        let Some(old_price) = lock_price(&mut tx, "apply_discount", product_id).await? else {
            return reject(tx, DomainError::not_found("product", product_id)).await;
        };
        let change = match discount
            .apply(old_price)
            .and_then(|new_price| PriceChange::new(product_id, new_price, PriceChangeReason::Campaign))
        {
            Ok(change) if change.new_price == old_price => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Ok(None);
            }
            Ok(change) => change,
            Err(err) => return reject(tx, err).await,
        };

        let entry = append_price_change(&mut tx, &change, old_price, at).await?;
        commit(tx).await?;
        Ok(Some(entry))
    }

    #[instrument(skip(self), fields(product_id = ?product_id, rows = tracing::field::Empty), err)]
    async fn price_history(&self, product_id: Option<ProductId>) -> StoreResult<Vec<PriceHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, sequence, old_price, new_price, reason, changed_at
            FROM price_history
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY changed_at DESC, sequence DESC
            "#,
        )
        .bind(product_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("price_history", e))?;

        let entries = rows
            .iter()
            .map(|row| PriceHistoryRow::decode("price_history", row)?.into_entry("price_history"))
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, customer), fields(customer_id = %customer.id), err)]
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO customers ({CUSTOMER_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
        ))
        .bind(customer.id.as_uuid())
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(customer.role.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_contact_error("insert_customer", customer, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer", e))?;
        row.map(|row| CustomerRow::decode("customer", &row)?.into_customer("customer"))
            .transpose()
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn customers(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at, id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers", e))?;

        let customers = rows
            .iter()
            .map(|row| CustomerRow::decode("customers", row)?.into_customer("customers"))
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", customers.len());
        Ok(customers)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id), err)]
    async fn update_customer(&self, customer: &Customer) -> StoreResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE customers
            SET full_name = $2, email = $3, phone_number = $4, role = $5
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(customer.role.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_contact_error("update_customer", customer, e))?
        .rows_affected();
        Ok(updated > 0)
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        let mut tx = self.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_customer", e))?;
        if locked.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(false);
        }

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        if orders > 0 {
            return reject(
                tx,
                DomainError::invalid_input(format!(
                    "customer {id} has {orders} order(s) and cannot be deleted"
                )),
            )
            .await;
        }

        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        commit(tx).await?;
        Ok(true)
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn product_snapshot(&self, product_id: ProductId) -> StoreResult<Option<ProductSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT p.current_price, i.stock_quantity
            FROM products p
            JOIN inventory i ON i.product_id = p.id
            WHERE p.id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_snapshot", e))?;

        row.map(|row| {
            Ok(ProductSnapshot {
                product_id,
                unit_price: Money::from_minor(get(&row, "product_snapshot", "current_price")?),
                available: get(&row, "product_snapshot", "stock_quantity")?,
            })
        })
        .transpose()
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.id, customer_id = %order.customer_id, lines = order.lines.len()),
        err
    )]
    async fn commit_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.begin().await?;

        let customer_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                .bind(order.customer_id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("commit_order", e))?;
        if !customer_exists {
            return reject(tx, DomainError::not_found("customer", order.customer_id)).await;
        }

        let mut decrements: Vec<&OrderLine> = order.lines.iter().collect();
        decrements.sort_by_key(|line| line.product_id);
        for line in decrements {
            let updated = sqlx::query(
                r#"
                UPDATE inventory
                SET stock_quantity = stock_quantity - $2
                WHERE product_id = $1 AND stock_quantity >= $2
                "#,
            )
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_stock", e))?
            .rows_affected();

            if updated == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock_quantity FROM inventory WHERE product_id = $1")
                        .bind(line.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| map_sqlx_error("decrement_stock", e))?;
                let err = match available {
                    Some(available) => {
                        DomainError::insufficient_stock(line.product_id, line.quantity, available)
                    }
                    None => DomainError::not_found("product", line.product_id),
                };
                return reject(tx, err).await;
            }
        }

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.placed_at)
        .bind(order.status.as_str())
        .bind(order.total_amount.minor())
        .bind(&order.shipping_address)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, line_no, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(line_no as i32)
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price.minor())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }

        commit(tx).await
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("order", e))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let header = OrderRow::decode("order", &row)?;
        let mut lines = load_lines(&*self.pool, "order", &[header.id]).await?;
        let lines = lines.remove(&header.id).unwrap_or_default();
        header.into_order("order", lines).map(Some)
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY placed_at DESC, id DESC
            "#
        ))
        .bind(filter.customer_id.map(Uuid::from))
        .bind(filter.status.map(OrderStatus::as_str))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders", e))?;

        let headers = rows
            .iter()
            .map(|row| OrderRow::decode("orders", row))
            .collect::<StoreResult<Vec<_>>>()?;
        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut lines = load_lines(&*self.pool, "orders", &ids).await?;

        let orders = headers
            .into_iter()
            .map(|h| {
                let order_lines = lines.remove(&h.id).unwrap_or_default();
                h.into_order("orders", order_lines)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", orders.len());
        Ok(orders)
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn order_listings(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderListing>> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.customer_id, o.placed_at, o.status, o.total_amount, o.shipping_address,
                   c.full_name AS customer_name
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE ($1::uuid IS NULL OR o.customer_id = $1)
              AND ($2::text IS NULL OR o.status = $2)
            ORDER BY o.placed_at DESC, o.id DESC
            "#,
        )
        .bind(filter.customer_id.map(Uuid::from))
        .bind(filter.status.map(OrderStatus::as_str))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_listings", e))?;

        let mut headers = Vec::with_capacity(rows.len());
        for row in &rows {
            let header = OrderRow::decode("order_listings", row)?;
            let customer_name: String = get(row, "order_listings", "customer_name")?;
            headers.push((header, customer_name));
        }
        let ids: Vec<Uuid> = headers.iter().map(|(h, _)| h.id).collect();

        let item_rows = sqlx::query(
            r#"
            SELECT l.order_id, l.product_id, l.quantity, p.title, s.company_name
            FROM order_lines l
            LEFT JOIN products p ON p.id = l.product_id
            LEFT JOIN suppliers s ON s.id = p.supplier_id
            WHERE l.order_id = ANY($1)
            ORDER BY l.order_id, l.line_no
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_listings", e))?;

        let mut items: HashMap<Uuid, (Vec<ListedItem>, BTreeSet<String>)> = HashMap::new();
        for row in item_rows {
            let item = ListedItemRow::decode("order_listings", &row)?;
            let (listed, suppliers) = items.entry(item.order_id).or_default();
            if let Some(supplier) = item.supplier_name {
                suppliers.insert(supplier);
            }
            listed.push(ListedItem {
                product_id: ProductId::from_uuid(item.product_id),
                title: item.title.unwrap_or_default(),
                quantity: item.quantity,
            });
        }

        let listings = headers
            .into_iter()
            .map(|(header, customer_name)| {
                let (listed, suppliers) = items.remove(&header.id).unwrap_or_default();
                let order = header.into_order("order_listings", Vec::new())?;
                Ok(OrderListing {
                    order_id: order.id,
                    placed_at: order.placed_at,
                    status: order.status,
                    total_amount: order.total_amount,
                    shipping_address: order.shipping_address,
                    customer_name,
                    items: listed,
                    suppliers: suppliers.into_iter().collect(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", listings.len());
        Ok(listings)
    }

    #[instrument(skip(self), fields(order_id = %id, next = %next), err)]
    async fn transition_order(&self, id: OrderId, next: OrderStatus) -> StoreResult<Order> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_order", e))?;
        let Some(row) = row else {
            return reject(tx, DomainError::not_found("order", id)).await;
        };

        let header = OrderRow::decode("transition_order", &row)?;
        let mut lines = load_lines(&mut *tx, "transition_order", &[header.id]).await?;
        let mut order = header.into_order(
            "transition_order",
            lines.remove(id.as_uuid()).unwrap_or_default(),
        )?;
        if let Err(err) = order.transition(next) {
            return reject(tx, err).await;
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(next.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;

        commit(tx).await?;
        Ok(order)
    }
}

#[async_trait]
impl ReportingStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM categories) AS total_categories,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COALESCE(SUM(total_amount), 0)::BIGINT
                   FROM orders WHERE status = 'completed') AS total_revenue,
                (SELECT COUNT(*) FROM inventory
                   WHERE stock_quantity < low_stock_threshold) AS low_stock_count,
                (SELECT COALESCE(ROUND(AVG(current_price)), 0)::BIGINT
                   FROM products) AS average_price
            "#,
        )
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("dashboard_stats", e))?;

        const OP: &str = "dashboard_stats";
        Ok(DashboardStats {
            total_products: get(&row, OP, "total_products")?,
            total_categories: get(&row, OP, "total_categories")?,
            total_orders: get(&row, OP, "total_orders")?,
            total_revenue: Money::from_minor(get(&row, OP, "total_revenue")?),
            low_stock_count: get(&row, OP, "low_stock_count")?,
            average_price: Money::from_minor(get(&row, OP, "average_price")?),
        })
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn category_distribution(&self) -> StoreResult<Vec<CategoryShare>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, COUNT(p.id) AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY product_count DESC, c.name ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("category_distribution", e))?;

        const OP: &str = "category_distribution";
        let shares = rows
            .iter()
            .map(|row| {
                Ok(CategoryShare {
                    category_id: CategoryId::from_uuid(get(row, OP, "id")?),
                    name: get(row, OP, "name")?,
                    product_count: get(row, OP, "product_count")?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", shares.len());
        Ok(shares)
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn price_trends(&self, days: u32) -> StoreResult<Vec<PriceTrend>> {
        let rows = sqlx::query(
            r#"
            SELECT
                (changed_at AT TIME ZONE 'UTC')::date AS day,
                COUNT(*) AS changes,
                ROUND(AVG(new_price - old_price))::BIGINT AS average_change
            FROM price_history
            GROUP BY day
            ORDER BY day DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(days))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("price_trends", e))?;

        const OP: &str = "price_trends";
        let trends = rows
            .iter()
            .map(|row| {
                Ok(PriceTrend {
                    date: get(row, OP, "day")?,
                    changes: get(row, OP, "changes")?,
                    average_change: Money::from_minor(get(row, OP, "average_change")?),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("rows", trends.len());
        Ok(trends)
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => DomainError::invalid_input(msg).into(),
                // Foreign key violation: a referenced category/supplier/product is gone
                Some("23503") => DomainError::invalid_input(msg).into(),
                // Check constraint violation
                Some("23514") => DomainError::invariant(msg).into(),
                _ => StoreError::backend(operation, db_err.message()),
            }
        }
        sqlx::Error::PoolClosed => StoreError::PoolClosed,
        sqlx::Error::RowNotFound => StoreError::backend(operation, "unexpected row not found"),
        other => StoreError::backend(operation, other.to_string()),
    }
}

/// Name of the unique constraint `err` violated, if it is a unique violation.
fn violated_unique_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Duplicate email or phone number as a business rejection naming the value.
fn map_contact_error(operation: &'static str, customer: &Customer, err: sqlx::Error) -> StoreError {
    match violated_unique_constraint(&err).as_deref() {
        Some("customers_phone_number_key") => DomainError::invalid_input(format!(
            "phone number {} is already registered",
            customer.phone_number.as_deref().unwrap_or_default()
        ))
        .into(),
        Some(_) => DomainError::invalid_input(format!(
            "email address {} is already registered",
            customer.email
        ))
        .into(),
        None => map_sqlx_error(operation, err),
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside a LIKE pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn get<'r, T>(row: &'r PgRow, operation: &'static str, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::corrupt(operation, format!("column {column}: {e}")))
}

fn to_sequence(operation: &'static str, sequence: i64) -> StoreResult<u64> {
    u64::try_from(sequence)
        .map_err(|_| StoreError::corrupt(operation, format!("negative sequence {sequence}")))
}

fn thresholds(operation: &'static str, low: i64, high: i64) -> StoreResult<StockThresholds> {
    StockThresholds::new(low, high).map_err(|e| StoreError::corrupt(operation, e.to_string()))
}

// SQLx row types

trait DecodeRow: for<'r> FromRow<'r, PgRow> {
    fn decode(operation: &'static str, row: &PgRow) -> StoreResult<Self> {
        Self::from_row(row).map_err(|e| StoreError::corrupt(operation, e.to_string()))
    }
}

impl<T> DecodeRow for T where T: for<'r> FromRow<'r, PgRow> {}

#[derive(Debug)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug)]
struct SupplierRow {
    id: Uuid,
    company_name: String,
    contact_email: Option<String>,
    tax_number: Option<String>,
    address: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for SupplierRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SupplierRow {
            id: row.try_get("id")?,
            company_name: row.try_get("company_name")?,
            contact_email: row.try_get("contact_email")?,
            tax_number: row.try_get("tax_number")?,
            address: row.try_get("address")?,
        })
    }
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: SupplierId::from_uuid(row.id),
            company_name: row.company_name,
            contact_email: row.contact_email,
            tax_number: row.tax_number,
            address: row.address,
        }
    }
}

#[derive(Debug)]
struct CustomerRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone_number: Option<String>,
    role: String,
}

impl<'r> FromRow<'r, PgRow> for CustomerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            role: row.try_get("role")?,
        })
    }
}

impl CustomerRow {
    fn into_customer(self, operation: &'static str) -> StoreResult<Customer> {
        let role: CustomerRole = self
            .role
            .parse()
            .map_err(|e: DomainError| StoreError::corrupt(operation, e.to_string()))?;
        Ok(Customer {
            id: CustomerId::from_uuid(self.id),
            full_name: self.full_name,
            email: self.email,
            phone_number: self.phone_number,
            role,
        })
    }
}

#[derive(Debug)]
struct ListedItemRow {
    order_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    title: Option<String>,
    supplier_name: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for ListedItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ListedItemRow {
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            title: row.try_get("title")?,
            supplier_name: row.try_get("company_name")?,
        })
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    base_price: i64,
    current_price: i64,
    is_active: bool,
    category_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    category_name: Option<String>,
    supplier_name: Option<String>,
    stock_quantity: Option<i64>,
    low_stock_threshold: Option<i64>,
    high_stock_threshold: Option<i64>,
    last_restock_date: Option<NaiveDate>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            base_price: row.try_get("base_price")?,
            current_price: row.try_get("current_price")?,
            is_active: row.try_get("is_active")?,
            category_id: row.try_get("category_id")?,
            supplier_id: row.try_get("supplier_id")?,
            created_at: row.try_get("created_at")?,
            category_name: row.try_get("category_name")?,
            supplier_name: row.try_get("supplier_name")?,
            stock_quantity: row.try_get("stock_quantity")?,
            low_stock_threshold: row.try_get("low_stock_threshold")?,
            high_stock_threshold: row.try_get("high_stock_threshold")?,
            last_restock_date: row.try_get("last_restock_date")?,
        })
    }
}

impl ProductRow {
    fn into_details(self, operation: &'static str) -> StoreResult<ProductDetails> {
        let product_id = ProductId::from_uuid(self.id);
        let inventory = match (
            self.stock_quantity,
            self.low_stock_threshold,
            self.high_stock_threshold,
            self.last_restock_date,
        ) {
            (Some(stock_quantity), Some(low), Some(high), Some(last_restock_date)) => {
                Some(InventoryRecord {
                    product_id,
                    stock_quantity,
                    thresholds: thresholds(operation, low, high)?,
                    last_restock_date,
                })
            }
            _ => None,
        };

        Ok(ProductDetails {
            product: Product {
                id: product_id,
                title: self.title,
                description: self.description,
                base_price: Money::from_minor(self.base_price),
                current_price: Money::from_minor(self.current_price),
                is_active: self.is_active,
                category_id: self.category_id.map(CategoryId::from_uuid),
                supplier_id: self.supplier_id.map(SupplierId::from_uuid),
                created_at: self.created_at,
            },
            category_name: self.category_name,
            supplier_name: self.supplier_name,
            inventory,
        })
    }
}

#[derive(Debug)]
struct InventoryRow {
    product_id: Uuid,
    stock_quantity: i64,
    low_stock_threshold: i64,
    high_stock_threshold: i64,
    last_restock_date: NaiveDate,
}

impl<'r> FromRow<'r, PgRow> for InventoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryRow {
            product_id: row.try_get("product_id")?,
            stock_quantity: row.try_get("stock_quantity")?,
            low_stock_threshold: row.try_get("low_stock_threshold")?,
            high_stock_threshold: row.try_get("high_stock_threshold")?,
            last_restock_date: row.try_get("last_restock_date")?,
        })
    }
}

impl InventoryRow {
    fn into_record(self, operation: &'static str) -> StoreResult<InventoryRecord> {
        Ok(InventoryRecord {
            product_id: ProductId::from_uuid(self.product_id),
            stock_quantity: self.stock_quantity,
            thresholds: thresholds(operation, self.low_stock_threshold, self.high_stock_threshold)?,
            last_restock_date: self.last_restock_date,
        })
    }
}

#[derive(Debug)]
struct PriceHistoryRow {
    id: Uuid,
    product_id: Uuid,
    sequence: i64,
    old_price: i64,
    new_price: i64,
    reason: String,
    changed_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PriceHistoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PriceHistoryRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            sequence: row.try_get("sequence")?,
            old_price: row.try_get("old_price")?,
            new_price: row.try_get("new_price")?,
            reason: row.try_get("reason")?,
            changed_at: row.try_get("changed_at")?,
        })
    }
}

impl PriceHistoryRow {
    fn into_entry(self, operation: &'static str) -> StoreResult<PriceHistoryEntry> {
        let reason: PriceChangeReason = self
            .reason
            .parse()
            .map_err(|e: DomainError| StoreError::corrupt(operation, e.to_string()))?;
        Ok(PriceHistoryEntry {
            id: PriceHistoryEntryId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            sequence: to_sequence(operation, self.sequence)?,
            old_price: Money::from_minor(self.old_price),
            new_price: Money::from_minor(self.new_price),
            reason,
            changed_at: self.changed_at,
        })
    }
}

#[derive(Debug)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    placed_at: DateTime<Utc>,
    status: String,
    total_amount: i64,
    shipping_address: String,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            placed_at: row.try_get("placed_at")?,
            status: row.try_get("status")?,
            total_amount: row.try_get("total_amount")?,
            shipping_address: row.try_get("shipping_address")?,
        })
    }
}

impl OrderRow {
    fn into_order(self, operation: &'static str, lines: Vec<OrderLine>) -> StoreResult<Order> {
        let status = OrderStatus::parse(&self.status)
            .map_err(|e| StoreError::corrupt(operation, e.to_string()))?;
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            placed_at: self.placed_at,
            status,
            total_amount: Money::from_minor(self.total_amount),
            shipping_address: self.shipping_address,
            lines,
        })
    }
}

#[derive(Debug)]
struct OrderLineRow {
    order_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    unit_price: i64,
}

impl<'r> FromRow<'r, PgRow> for OrderLineRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderLineRow {
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
        })
    }
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            product_id: ProductId::from_uuid(row.product_id),
            quantity: row.quantity,
            unit_price: Money::from_minor(row.unit_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("lamp"), "lamp");
    }

    #[test]
    fn negative_sequence_is_reported_as_corruption() {
        let err = to_sequence("price_history", -1).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { operation: "price_history", .. }));
    }
}
