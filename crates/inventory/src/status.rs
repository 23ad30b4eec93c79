use serde::{Deserialize, Serialize};

/// Stock level relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockStatus {
    Low,
    Normal,
    High,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Low => "LOW",
            StockStatus::Normal => "NORMAL",
            StockStatus::High => "HIGH",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a quantity against its thresholds.
///
/// Both bounds are exclusive: a quantity equal to either threshold is `Normal`.
/// Read-side only; never used to block a write.
pub fn classify(quantity: i64, low_threshold: i64, high_threshold: i64) -> StockStatus {
    if quantity < low_threshold {
        StockStatus::Low
    } else if quantity > high_threshold {
        StockStatus::High
    } else {
        StockStatus::Normal
    }
}
