//! Basket validation and pricing for order placement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricewise_core::{CustomerId, DomainError, DomainResult, Money, OrderId, ProductId};

use crate::order::{Order, OrderLine};

/// One requested `(product, quantity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl RequestedItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A customer's order placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: CustomerId,
    pub shipping_address: String,
    pub items: Vec<RequestedItem>,
}

impl OrderRequest {
    pub fn new(customer_id: CustomerId, shipping_address: impl Into<String>, items: Vec<RequestedItem>) -> Self {
        Self {
            customer_id,
            shipping_address: shipping_address.into(),
            items,
        }
    }

    /// Validate the request and merge repeated products.
    ///
    /// Quantities for the same product are summed; first-seen order is kept.
    pub fn normalized_items(&self) -> DomainResult<Vec<RequestedItem>> {
        if self.items.is_empty() {
            return Err(DomainError::invalid_input("an order needs at least one item"));
        }
        if self.shipping_address.trim().is_empty() {
            return Err(DomainError::invalid_input("shipping address cannot be empty"));
        }

        let mut merged: Vec<RequestedItem> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(DomainError::invalid_input(format!(
                    "quantity for product {} must be positive (got {})",
                    item.product_id, item.quantity
                )));
            }
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or_else(|| DomainError::invalid_input("quantity overflow"))?;
                }
                None => merged.push(*item),
            }
        }
        Ok(merged)
    }
}

/// Price and available stock of one product, read together in one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub available: i64,
}

/// Validated, priced lines accumulated during one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Basket {
    lines: Vec<OrderLine>,
}

impl Basket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item priced from `snapshot`.
    ///
    /// Fails with `InsufficientStock` (carrying the available quantity) when
    /// the snapshot cannot cover the request.
    pub fn add(&mut self, item: RequestedItem, snapshot: ProductSnapshot) -> DomainResult<()> {
        if snapshot.product_id != item.product_id {
            return Err(DomainError::invariant(format!(
                "snapshot for {} used to price {}",
                snapshot.product_id, item.product_id
            )));
        }
        if snapshot.available < item.quantity {
            return Err(DomainError::insufficient_stock(
                item.product_id,
                item.quantity,
                snapshot.available,
            ));
        }
        self.lines.push(OrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: snapshot.unit_price,
        });
        Ok(())
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> DomainResult<Money> {
        Order::sum_lines(&self.lines)
    }

    pub fn into_order(
        self,
        id: OrderId,
        customer_id: CustomerId,
        shipping_address: String,
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Order> {
        Order::pending(id, customer_id, shipping_address, self.lines, placed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(product_id: ProductId, price: i64, available: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id,
            unit_price: Money::from_major(price),
            available,
        }
    }

    #[test]
    fn duplicate_products_are_merged() {
        let p = ProductId::new();
        let q = ProductId::new();
        let request = OrderRequest::new(
            CustomerId::new(),
            "Kadikoy, Istanbul",
            vec![RequestedItem::new(p, 1), RequestedItem::new(q, 2), RequestedItem::new(p, 3)],
        );
        let items = request.normalized_items().unwrap();
        assert_eq!(items, vec![RequestedItem::new(p, 4), RequestedItem::new(q, 2)]);
    }

    #[test]
    fn non_positive_quantity_is_invalid() {
        let request = OrderRequest::new(CustomerId::new(), "addr", vec![RequestedItem::new(ProductId::new(), 0)]);
        assert!(matches!(request.normalized_items(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn empty_request_is_invalid() {
        let request = OrderRequest::new(CustomerId::new(), "addr", vec![]);
        assert!(matches!(request.normalized_items(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn basket_prices_with_snapshot_price() {
        let p = ProductId::new();
        let mut basket = Basket::new();
        basket.add(RequestedItem::new(p, 3), snapshot(p, 10, 5)).unwrap();
        assert_eq!(basket.total().unwrap(), Money::from_major(30));
        assert_eq!(basket.lines()[0].unit_price, Money::from_major(10));
    }

    #[test]
    fn basket_rejects_more_than_available() {
        let p = ProductId::new();
        let mut basket = Basket::new();
        let err = basket.add(RequestedItem::new(p, 3), snapshot(p, 10, 2)).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock(p, 3, 2));
        assert!(basket.lines().is_empty());
    }
}
