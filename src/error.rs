//! Ledger error types

use rust_decimal::Decimal;
use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid or inactive promotion code")]
    NotFound,

    #[error("promotion code already exists")]
    DuplicateCode,

    #[error("promotion is not yet active or has expired")]
    NotYetActiveOrExpired,

    #[error("promotion usage limit reached")]
    LimitReached,

    #[error("minimum purchase amount of {minimum} required")]
    BelowMinimum { minimum: Decimal },

    #[error("invalid promotion: {0}")]
    Validation(String),

    #[error("storage error")]
    Persistence(#[source] sqlx::Error),
}

impl From<sqlx::Error> for LedgerError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::DuplicateCode,
            Some(ErrorKind::CheckViolation) => {
                Self::Validation("promotion violates a storage constraint".to_string())
            }
            _ => Self::Persistence(error),
        }
    }
}

impl From<validator::ValidationErrors> for LedgerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
