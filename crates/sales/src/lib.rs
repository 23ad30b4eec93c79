//! Sales domain module: customers, orders and basket pricing.
//!
//! Deterministic rules only (no IO). The order engine in `pricewise-infra`
//! reads prices/stock, prices the basket here and commits the result in one
//! transaction.

pub mod basket;
pub mod customer;
pub mod order;

pub use basket::{Basket, OrderRequest, ProductSnapshot, RequestedItem};
pub use customer::{Customer, CustomerPatch, CustomerRole};
pub use order::{Order, OrderFilter, OrderLine, OrderStatus};
