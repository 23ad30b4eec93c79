use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricewise_core::{CustomerId, DomainError, DomainResult, Entity, Money, OrderId, ProductId};

/// Order status lifecycle: `pending → completed | cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::invalid_input(format!("unknown order status: {other}"))),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed) | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line: product, quantity and the unit price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> DomainResult<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A placed order.
///
/// `total_amount` is derived from the lines when the order is built and is
/// never recomputed afterwards, including on status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub lines: Vec<OrderLine>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

impl Order {
    /// Build a pending order, deriving its total from `lines`.
    pub fn pending(
        id: OrderId,
        customer_id: CustomerId,
        shipping_address: String,
        lines: Vec<OrderLine>,
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::invalid_input("an order needs at least one line"));
        }
        if let Some(line) = lines.iter().find(|l| l.quantity <= 0) {
            return Err(DomainError::invalid_input(format!(
                "quantity for product {} must be positive (got {})",
                line.product_id, line.quantity
            )));
        }
        let total_amount = Self::sum_lines(&lines)?;
        Ok(Self {
            id,
            customer_id,
            placed_at,
            status: OrderStatus::Pending,
            total_amount,
            shipping_address,
            lines,
        })
    }

    pub fn sum_lines(lines: &[OrderLine]) -> DomainResult<Money> {
        let totals = lines
            .iter()
            .map(OrderLine::line_total)
            .collect::<DomainResult<Vec<_>>>()?;
        Money::checked_sum(totals)
    }

    /// Move to `next`, enforcing the lifecycle.
    pub fn transition(&mut self, next: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "cannot move order {} from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// Read-side filter for listing orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.customer_id.is_none_or(|c| order.customer_id == c)
            && self.status.is_none_or(|s| order.status == s)
    }
}
