//! Order engine: validate a basket, price it, and commit order, lines and
//! stock decrements as one unit.
//!
//! Validation reads one price+stock snapshot per product. The commit re-checks
//! stock inside the store transaction, so a concurrent order that took the
//! stock in between still yields `InsufficientStock` and nothing is written.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use pricewise_core::{CustomerId, DomainError, Money, OrderId};
use pricewise_sales::{
    Basket, Customer, CustomerPatch, Order, OrderFilter, OrderRequest, OrderStatus, RequestedItem,
};

use crate::error::{EngineError, EngineResult};
use crate::store::{OrderListing, OrderStore};

/// Result of a successful `place_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Money,
}

pub struct OrderEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S> OrderEngine<S>
where
    S: OrderStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, full_name, email), err)]
    pub async fn register_customer(
        &self,
        full_name: impl Into<String> + Send,
        email: impl Into<String> + Send,
    ) -> EngineResult<Customer> {
        self.add_customer(Customer::new(full_name, email)?).await
    }

    /// Register a fully built customer (phone number, role). Email and phone
    /// number must not be registered yet.
    #[instrument(skip(self, customer), fields(customer_id = %customer.id), err)]
    pub async fn add_customer(&self, customer: Customer) -> EngineResult<Customer> {
        self.store.insert_customer(&customer).await?;
        info!(role = %customer.role, "customer registered");
        Ok(customer)
    }

    pub async fn customer(&self, customer_id: CustomerId) -> EngineResult<Customer> {
        self.store
            .customer(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", customer_id).into())
    }

    /// In registration order.
    pub async fn customers(&self) -> EngineResult<Vec<Customer>> {
        Ok(self.store.customers().await?)
    }

    #[instrument(skip(self, patch), fields(customer_id = %customer_id), err)]
    pub async fn update_customer(&self, customer_id: CustomerId, patch: CustomerPatch) -> EngineResult<Customer> {
        let mut customer = self.customer(customer_id).await?;
        if patch.is_empty() {
            return Ok(customer);
        }
        patch.apply(&mut customer)?;
        if !self.store.update_customer(&customer).await? {
            return Err(DomainError::not_found("customer", customer_id).into());
        }
        info!("customer updated");
        Ok(customer)
    }

    /// Delete a customer who never ordered. Customers with orders are kept so
    /// order history stays intact; the attempt fails with `InvalidInput`.
    #[instrument(skip(self), fields(customer_id = %customer_id), err)]
    pub async fn delete_customer(&self, customer_id: CustomerId) -> EngineResult<()> {
        if !self.store.delete_customer(customer_id).await? {
            return Err(DomainError::not_found("customer", customer_id).into());
        }
        info!("customer deleted");
        Ok(())
    }

    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        shipping_address: impl Into<String> + Send,
        items: Vec<RequestedItem>,
    ) -> EngineResult<PlacedOrder> {
        self.submit(OrderRequest::new(customer_id, shipping_address, items))
            .await
    }

    /// Place an order from a prepared request.
    ///
    /// Repeated products are merged before validation. Fails with `NotFound`
    /// for an unknown customer or product and with `InsufficientStock` naming
    /// the first product that cannot be covered; in every failure case no
    /// order, line or stock change is written.
    #[instrument(
        skip(self, request),
        fields(customer_id = %request.customer_id, items = request.items.len()),
        err
    )]
    pub async fn submit(&self, request: OrderRequest) -> EngineResult<PlacedOrder> {
        let items = request.normalized_items()?;

        if self.store.customer(request.customer_id).await?.is_none() {
            return Err(DomainError::not_found("customer", request.customer_id).into());
        }

        let mut basket = Basket::new();
        for item in items {
            let snapshot = self
                .store
                .product_snapshot(item.product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("product", item.product_id))?;
            if let Err(err) = basket.add(item, snapshot) {
                warn!(product_id = %item.product_id, error = %err, "order rejected during validation");
                return Err(err.into());
            }
        }

        let order = basket.into_order(
            OrderId::new(),
            request.customer_id,
            request.shipping_address.trim().to_string(),
            Utc::now(),
        )?;

        if let Err(err) = self.store.commit_order(&order).await {
            let err = EngineError::from(err);
            if err.is_rejection() {
                warn!(order_id = %order.id, error = %err, "order rejected at commit");
            }
            return Err(err);
        }

        info!(order_id = %order.id, total = %order.total_amount, lines = order.lines.len(), "order placed");
        Ok(PlacedOrder {
            order_id: order.id,
            total: order.total_amount,
        })
    }

    pub async fn order(&self, order_id: OrderId) -> EngineResult<Order> {
        self.store
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", order_id).into())
    }

    /// Newest first.
    pub async fn orders(&self, filter: &OrderFilter) -> EngineResult<Vec<Order>> {
        Ok(self.store.orders(filter).await?)
    }

    /// Orders with customer name, item titles and supplier names, newest first.
    pub async fn order_listings(&self, filter: &OrderFilter) -> EngineResult<Vec<OrderListing>> {
        Ok(self.store.order_listings(filter).await?)
    }

    /// `pending → completed`. The total is left as committed.
    pub async fn complete(&self, order_id: OrderId) -> EngineResult<Order> {
        self.transition(order_id, OrderStatus::Completed).await
    }

    /// `pending → cancelled`. Stock is not returned; restock explicitly if needed.
    pub async fn cancel(&self, order_id: OrderId) -> EngineResult<Order> {
        self.transition(order_id, OrderStatus::Cancelled).await
    }

    #[instrument(skip(self), fields(order_id = %order_id, next = %next), err)]
    async fn transition(&self, order_id: OrderId, next: OrderStatus) -> EngineResult<Order> {
        let order = self.store.transition_order(order_id, next).await?;
        info!(status = %order.status, "order status changed");
        Ok(order)
    }
}
