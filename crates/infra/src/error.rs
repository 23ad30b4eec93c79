use thiserror::Error;

use pricewise_core::{DomainError, ProductId};

use crate::store::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Error surfaced by the ledgers, engines and services.
///
/// Callers match on the variant; every variant other than `Storage` is a
/// deterministic rejection and nothing was written.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("insufficient stock for product {product_id} (requested: {requested}, available: {available})")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// `true` for rejections a caller can fix by changing the request.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, EngineError::Storage(_))
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => EngineError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            DomainError::InvalidInput(msg) => EngineError::InvalidInput(msg),
            DomainError::InvariantViolation(msg) => EngineError::InvalidTransition(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(domain) => domain.into(),
            other => EngineError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_rejections_unwrap_to_domain_variants() {
        let product_id = ProductId::new();
        let err: EngineError =
            StoreError::Rejected(DomainError::insufficient_stock(product_id, 3, 2)).into();
        match err {
            EngineError::InsufficientStock {
                product_id: p,
                requested: 3,
                available: 2,
            } if p == product_id => {}
            other => panic!("Expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn backend_failures_stay_storage_errors() {
        let err: EngineError = StoreError::backend("commit_order", "connection reset").into();
        assert!(matches!(err, EngineError::Storage(StoreError::Backend { .. })));
        assert!(!err.is_rejection());
    }

    #[test]
    fn invariant_violations_become_invalid_transitions() {
        let err: EngineError = DomainError::invariant("cannot move order").into();
        assert!(matches!(err, EngineError::InvalidTransition(msg) if msg.contains("cannot move")));
    }
}
