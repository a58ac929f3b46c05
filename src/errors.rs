//! Unified error type for the ledger core and its collaborators.
//!
//! Business-rule failures (`InsufficientStock`, `CreditLimitExceeded`, `DuplicateBatch`, ...)
//! are distinct variants so callers can map them to client-correctable responses, while
//! database and I/O failures stay opaque.

use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(
        "Insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        available: Decimal,
        requested: Decimal,
    },

    #[error(
        "Credit limit exceeded for client {client_id}: limit {limit}, outstanding {outstanding}, this order {requested}"
    )]
    CreditLimitExceeded {
        client_id: i64,
        limit: Decimal,
        outstanding: Decimal,
        requested: Decimal,
    },

    #[error("Batch number '{batch_number}' already exists")]
    DuplicateBatch { batch_number: String },

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: Decimal },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected failure: {message}")]
    UnknownFailure { message: String },
}

/// How a collaborator boundary should surface an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller can fix the request (stock, credit, duplicate batch, bad input).
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// Anything else; details should not leak to the caller.
    Internal,
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies the error for user-visible reporting.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InsufficientStock { .. }
            | Self::CreditLimitExceeded { .. }
            | Self::DuplicateBatch { .. }
            | Self::InvalidQuantity { .. }
            | Self::Validation { .. } => ErrorClass::Validation,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::UnknownFailure { .. } => ErrorClass::Internal,
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_business_failures_are_client_correctable() {
        let err = Error::InsufficientStock {
            product_id: 1,
            available: dec!(7),
            requested: dec!(20),
        };
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 1: available 7, requested 20"
        );

        let err = Error::DuplicateBatch {
            batch_number: "L-001".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn test_database_failures_are_opaque() {
        let err = Error::from(DbErr::Custom("constraint failed".to_string()));
        assert_eq!(err.class(), ErrorClass::Internal);
        assert_eq!(Error::not_found("Product", 9).class(), ErrorClass::NotFound);
    }
}
