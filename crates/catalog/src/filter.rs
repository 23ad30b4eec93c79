//! Structured product filter.
//!
//! Every recognized filter is an explicit, typed field. Backends translate it
//! into bound parameters (Postgres) or evaluate [`ProductFilter::matches`]
//! directly (in-memory).

use serde::{Deserialize, Serialize};

use pricewise_core::{CategoryId, DomainError, DomainResult, Money};

use crate::product::Product;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn price_between(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn stock_between(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_stock = min;
        self.max_stock = max;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::invalid_input("min_price cannot exceed max_price"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_stock, self.max_stock) {
            if min > max {
                return Err(DomainError::invalid_input("min_stock cannot exceed max_stock"));
            }
        }
        Ok(())
    }

    /// Search text normalized for matching; blank text means no search.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Evaluate the filter against a product and its stock (if it has an inventory record).
    ///
    /// A stock bound never matches a product without an inventory record.
    pub fn matches(&self, product: &Product, stock: Option<i64>) -> bool {
        if self.category_id.is_some() && product.category_id != self.category_id {
            return false;
        }
        if self.is_active.is_some_and(|active| product.is_active != active) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.current_price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.current_price > max) {
            return false;
        }
        if let Some(min) = self.min_stock {
            if !stock.is_some_and(|s| s >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_stock {
            if !stock.is_some_and(|s| s <= max) {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let in_title = product.title.to_lowercase().contains(&term);
            let in_description = product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}
