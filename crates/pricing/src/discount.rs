use serde::{Deserialize, Serialize};

use pricewise_core::{DomainError, DomainResult, Money};

/// A campaign discount, held as basis points (1% = 100 bp).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    basis_points: i64,
}

impl Discount {
    const FULL: i64 = 10_000;

    /// Accepts a percentage in `[0, 100]`, rounded to the nearest basis point.
    pub fn from_percentage(percentage: f64) -> DomainResult<Self> {
        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(DomainError::invalid_input(format!(
                "discount percentage must be within [0, 100] (got {percentage})"
            )));
        }
        Ok(Self {
            basis_points: (percentage * 100.0).round() as i64,
        })
    }

    pub fn basis_points(&self) -> i64 {
        self.basis_points
    }

    pub fn percentage(&self) -> f64 {
        self.basis_points as f64 / 100.0
    }

    /// `price × (1 − pct/100)`, rounded half-up to the minor unit.
    pub fn apply(&self, price: Money) -> DomainResult<Money> {
        let kept = i128::from(Self::FULL - self.basis_points);
        let scaled = i128::from(price.minor()) * kept;
        let half = i128::from(Self::FULL / 2);
        let rounded = if scaled >= 0 {
            (scaled + half) / i128::from(Self::FULL)
        } else {
            (scaled - half) / i128::from(Self::FULL)
        };
        i64::try_from(rounded)
            .map(Money::from_minor)
            .map_err(|_| DomainError::invalid_input("monetary amount overflow"))
    }
}
