use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pricewise_core::{DomainError, DomainResult, ProductId};

use crate::status::{StockStatus, classify};

/// Low/high stock thresholds for one product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockThresholds {
    low: i64,
    high: i64,
}

impl StockThresholds {
    pub const DEFAULT_LOW: i64 = 10;
    pub const DEFAULT_HIGH: i64 = 100;

    pub fn new(low: i64, high: i64) -> DomainResult<Self> {
        if low < 0 || high < 0 {
            return Err(DomainError::invalid_input("stock thresholds cannot be negative"));
        }
        if low > high {
            return Err(DomainError::invalid_input(format!(
                "low stock threshold ({low}) cannot exceed high stock threshold ({high})"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
        }
    }
}

/// Administrative stock correction: absolute quantity plus thresholds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub quantity: i64,
    pub thresholds: StockThresholds,
}

impl StockLevels {
    pub fn new(quantity: i64, thresholds: StockThresholds) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::invalid_input("stock quantity cannot be negative"));
        }
        Ok(Self {
            quantity,
            thresholds,
        })
    }
}

/// Reservation and restock quantities must be strictly positive.
pub fn ensure_positive_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::invalid_input(format!(
            "quantity must be positive (got {quantity})"
        )));
    }
    Ok(())
}

/// Inventory record, one-to-one with a product.
///
/// `stock_quantity` is never negative: every mutation checks before it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub stock_quantity: i64,
    pub thresholds: StockThresholds,
    pub last_restock_date: NaiveDate,
}

impl InventoryRecord {
    /// Fresh record with no stock, created alongside its product.
    pub fn empty(product_id: ProductId, thresholds: StockThresholds, today: NaiveDate) -> Self {
        Self {
            product_id,
            stock_quantity: 0,
            thresholds,
            last_restock_date: today,
        }
    }

    pub fn from_levels(product_id: ProductId, levels: StockLevels, today: NaiveDate) -> Self {
        Self {
            product_id,
            stock_quantity: levels.quantity,
            thresholds: levels.thresholds,
            last_restock_date: today,
        }
    }

    pub fn status(&self) -> StockStatus {
        classify(
            self.stock_quantity,
            self.thresholds.low(),
            self.thresholds.high(),
        )
    }

    /// Stock left after taking `quantity`, or `InsufficientStock` carrying what is on hand.
    pub fn remaining_after(&self, quantity: i64) -> DomainResult<i64> {
        ensure_positive_quantity(quantity)?;
        if self.stock_quantity < quantity {
            return Err(DomainError::insufficient_stock(
                self.product_id,
                quantity,
                self.stock_quantity,
            ));
        }
        Ok(self.stock_quantity - quantity)
    }

    /// Decrement stock. Leaves the record untouched on failure.
    pub fn reserve(&mut self, quantity: i64) -> DomainResult<()> {
        self.stock_quantity = self.remaining_after(quantity)?;
        Ok(())
    }

    pub fn restock(&mut self, quantity: i64, today: NaiveDate) -> DomainResult<()> {
        ensure_positive_quantity(quantity)?;
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invalid_input("stock quantity overflow"))?;
        self.last_restock_date = today;
        Ok(())
    }

    pub fn apply_levels(&mut self, levels: StockLevels, today: NaiveDate) {
        self.stock_quantity = levels.quantity;
        self.thresholds = levels.thresholds;
        self.last_restock_date = today;
    }
}
