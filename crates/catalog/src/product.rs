use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricewise_core::{CategoryId, DomainError, DomainResult, Entity, Money, ProductId, SupplierId};

/// Catalog product.
///
/// `base_price` is fixed at creation; `current_price` moves only through the
/// pricing ledger so that every change leaves a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub base_price: Money,
    pub current_price: Money,
    pub is_active: bool,
    pub category_id: Option<CategoryId>,
    pub supplier_id: Option<SupplierId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub base_price: Money,
    /// Defaults to `base_price` when absent.
    pub current_price: Option<Money>,
    pub is_active: bool,
    pub category_id: Option<CategoryId>,
    pub supplier_id: Option<SupplierId>,
}

impl NewProduct {
    pub fn new(title: impl Into<String>, base_price: Money) -> Self {
        Self {
            title: title.into(),
            description: None,
            base_price,
            current_price: None,
            is_active: true,
            category_id: None,
            supplier_id: None,
        }
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn with_current_price(mut self, price: Money) -> Self {
        self.current_price = Some(price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::invalid_input("title cannot be empty"));
        }
        if self.base_price.is_negative() {
            return Err(DomainError::invalid_input("base price cannot be negative"));
        }
        if self.current_price.is_some_and(Money::is_negative) {
            return Err(DomainError::invalid_input("current price cannot be negative"));
        }
        Ok(())
    }

    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> DomainResult<Product> {
        self.validate()?;
        Ok(Product {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            base_price: self.base_price,
            current_price: self.current_price.unwrap_or(self.base_price),
            is_active: self.is_active,
            category_id: self.category_id,
            supplier_id: self.supplier_id,
            created_at,
        })
    }
}

/// Partial update of a product. `None` leaves a field unchanged.
///
/// `current_price` is carried here for callers' convenience but is applied by
/// the pricing ledger, never by [`ProductPatch::apply_details`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Money>,
    pub current_price: Option<Money>,
    pub is_active: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub supplier_id: Option<SupplierId>,
}

impl ProductPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DomainError::invalid_input("title cannot be empty"));
        }
        if self.base_price.is_some_and(Money::is_negative) {
            return Err(DomainError::invalid_input("base price cannot be negative"));
        }
        if self.current_price.is_some_and(Money::is_negative) {
            return Err(DomainError::invalid_input("current price cannot be negative"));
        }
        Ok(())
    }

    /// Whether anything other than the current price is being changed.
    pub fn touches_details(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.base_price.is_some()
            || self.is_active.is_some()
            || self.category_id.is_some()
            || self.supplier_id.is_some()
    }

    /// Apply descriptive fields, base price and active flag.
    pub fn apply_details(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(base_price) = self.base_price {
            product.base_price = base_price;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(supplier_id) = self.supplier_id {
            product.supplier_id = Some(supplier_id);
        }
    }
}

/// Product joined with its display names and stock, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub product: Product,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
    pub stock_quantity: Option<i64>,
}

/// Outcome of a product delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductRemoval {
    /// No order ever referenced the product; it is gone with its inventory and price history.
    Deleted,
    /// Orders reference the product; it was only marked inactive.
    Deactivated,
}
