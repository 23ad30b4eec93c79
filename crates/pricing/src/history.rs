use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricewise_core::{DomainError, DomainResult, Money, PriceHistoryEntryId, ProductId};

/// Why a product's current price changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceChangeReason {
    Campaign,
    ManualUpdate,
    LowStock,
    DemandIncrease,
    Inflation,
}

impl PriceChangeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceChangeReason::Campaign => "campaign",
            PriceChangeReason::ManualUpdate => "manual_update",
            PriceChangeReason::LowStock => "low_stock",
            PriceChangeReason::DemandIncrease => "demand_increase",
            PriceChangeReason::Inflation => "inflation",
        }
    }
}

impl core::fmt::Display for PriceChangeReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceChangeReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campaign" => Ok(Self::Campaign),
            "manual_update" => Ok(Self::ManualUpdate),
            "low_stock" => Ok(Self::LowStock),
            "demand_increase" => Ok(Self::DemandIncrease),
            "inflation" => Ok(Self::Inflation),
            other => Err(DomainError::invalid_input(format!(
                "unknown price change reason: {other}"
            ))),
        }
    }
}

/// A requested change to a product's current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub product_id: ProductId,
    pub new_price: Money,
    pub reason: PriceChangeReason,
}

impl PriceChange {
    pub fn new(product_id: ProductId, new_price: Money, reason: PriceChangeReason) -> DomainResult<Self> {
        if new_price.is_negative() {
            return Err(DomainError::invalid_input(format!(
                "price cannot be negative (got {new_price})"
            )));
        }
        Ok(Self {
            product_id,
            new_price,
            reason,
        })
    }

    /// Checks the change against the price it replaces.
    ///
    /// Re-setting the same price would add a history row with no movement.
    pub fn validate_against(&self, old_price: Money) -> DomainResult<()> {
        if old_price == self.new_price {
            return Err(DomainError::invalid_input(format!(
                "price of product {} is already {}",
                self.product_id, old_price
            )));
        }
        Ok(())
    }

    /// The history entry recording this change.
    pub fn record(
        &self,
        old_price: Money,
        sequence: u64,
        changed_at: DateTime<Utc>,
    ) -> PriceHistoryEntry {
        PriceHistoryEntry {
            id: PriceHistoryEntryId::new(),
            product_id: self.product_id,
            sequence,
            old_price,
            new_price: self.new_price,
            reason: self.reason,
            changed_at,
        }
    }
}

/// Immutable, append-only record of one price change.
///
/// `sequence` is per product and strictly increasing, so entries with equal
/// timestamps still reconstruct the price curve in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: PriceHistoryEntryId,
    pub product_id: ProductId,
    pub sequence: u64,
    pub old_price: Money,
    pub new_price: Money,
    pub reason: PriceChangeReason,
    pub changed_at: DateTime<Utc>,
}

impl PriceHistoryEntry {
    /// Signed price movement in minor units.
    pub fn delta(&self) -> i64 {
        self.new_price.minor() - self.old_price.minor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_roundtrip_through_strings() {
        for reason in [
            PriceChangeReason::Campaign,
            PriceChangeReason::ManualUpdate,
            PriceChangeReason::LowStock,
            PriceChangeReason::DemandIncrease,
            PriceChangeReason::Inflation,
        ] {
            assert_eq!(reason.as_str().parse::<PriceChangeReason>().unwrap(), reason);
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn unknown_reason_is_invalid_input() {
        assert!(matches!(
            "clearance".parse::<PriceChangeReason>(),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = PriceChange::new(ProductId::new(), Money::from_minor(-1), PriceChangeReason::ManualUpdate)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn unchanged_price_is_rejected() {
        let change = PriceChange::new(ProductId::new(), Money::from_major(10), PriceChangeReason::Inflation).unwrap();
        assert!(change.validate_against(Money::from_major(10)).is_err());
        assert!(change.validate_against(Money::from_major(9)).is_ok());
    }

    #[test]
    fn record_captures_old_and_new_price() {
        let product_id = ProductId::new();
        let change = PriceChange::new(product_id, Money::from_major(12), PriceChangeReason::DemandIncrease).unwrap();
        let entry = change.record(Money::from_major(10), 3, Utc::now());
        assert_eq!(entry.product_id, product_id);
        assert_eq!(entry.old_price, Money::from_major(10));
        assert_eq!(entry.new_price, Money::from_major(12));
        assert_eq!(entry.sequence, 3);
        assert_eq!(entry.delta(), 200);
    }
}
