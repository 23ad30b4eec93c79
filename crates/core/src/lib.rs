//! `pricewise-core`: shared domain building blocks.
//!
//! Identifiers, money and the domain error model. This crate is **pure**
//! (no storage, no async, no logging).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, CustomerId, OrderId, PriceHistoryEntryId, ProductId, SupplierId};
pub use money::Money;
