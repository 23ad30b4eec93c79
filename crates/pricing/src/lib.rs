//! Pricing domain module.
//!
//! Reason codes, the append-only price history entry, and campaign discount
//! arithmetic. The atomic price+history write is done by the pricing ledger in
//! `pricewise-infra`.

pub mod discount;
pub mod history;

pub use discount::Discount;
pub use history::{PriceChange, PriceChangeReason, PriceHistoryEntry};
