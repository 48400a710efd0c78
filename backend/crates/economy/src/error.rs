//! Economy Error Types
//!
//! This module provides economy-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_objects::PowerUpKind;

/// Economy-specific result type alias
pub type EconomyResult<T> = Result<T, EconomyError>;

/// Economy-specific error variants
///
/// Spans the four spec'd categories: validation (amount/quantity),
/// not-found, state-conflict (balance/stock) and consistency errors.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// No balance record exists for the account
    #[error("Account balance not found")]
    AccountNotFound,

    /// Credit/debit amount must be strictly positive
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    /// Purchase quantity must be at least 1
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// Transaction kind tag not part of the closed taxonomy
    #[error("Unknown transaction kind: {0}")]
    UnknownTransactionKind(String),

    /// Power-up tag not part of the closed set
    #[error("Unknown power-up kind: {0}. Valid kinds: hints, reading_vision, second_chance")]
    UnknownPowerUpKind(String),

    /// Debit larger than the current balance
    #[error("Insufficient coins. Required: {required}, available: {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// No stock left for the requested power-up
    #[error("Insufficient {kind} stock. Available: {available}")]
    InsufficientStock { kind: PowerUpKind, available: i64 },

    /// Ledger/inventory drift or a half-applied purchase. Fatal for the
    /// account's write path until manually reconciled.
    #[error("Economy state inconsistency: {0}")]
    Inconsistency(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EconomyError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            EconomyError::AccountNotFound => StatusCode::NOT_FOUND,
            EconomyError::InvalidAmount
            | EconomyError::InvalidQuantity
            | EconomyError::UnknownTransactionKind(_)
            | EconomyError::UnknownPowerUpKind(_) => StatusCode::BAD_REQUEST,
            EconomyError::InsufficientBalance { .. } | EconomyError::InsufficientStock { .. } => {
                StatusCode::CONFLICT
            }
            EconomyError::Inconsistency(_)
            | EconomyError::Database(_)
            | EconomyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EconomyError::AccountNotFound => ErrorKind::NotFound,
            EconomyError::InvalidAmount
            | EconomyError::InvalidQuantity
            | EconomyError::UnknownTransactionKind(_)
            | EconomyError::UnknownPowerUpKind(_) => ErrorKind::BadRequest,
            EconomyError::InsufficientBalance { .. } | EconomyError::InsufficientStock { .. } => {
                ErrorKind::Conflict
            }
            EconomyError::Inconsistency(_)
            | EconomyError::Database(_)
            | EconomyError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            EconomyError::Database(e) => {
                tracing::error!(error = %e, "Economy database error");
            }
            EconomyError::Inconsistency(msg) => {
                tracing::error!(message = %msg, "Economy consistency violation");
            }
            EconomyError::Internal(msg) => {
                tracing::error!(message = %msg, "Economy internal error");
            }
            EconomyError::InsufficientBalance {
                required,
                available,
            } => {
                tracing::warn!(required, available, "Debit rejected: insufficient balance");
            }
            EconomyError::InsufficientStock { kind, available } => {
                tracing::warn!(kind = %kind, available, "Use rejected: insufficient stock");
            }
            _ => {
                tracing::debug!(error = %self, "Economy error");
            }
        }
    }
}

impl From<EconomyError> for AppError {
    fn from(err: EconomyError) -> Self {
        let kind = err.kind();
        // Consistency and infrastructure details stay out of user-visible
        // messages; the journal is the operator's source of truth.
        let message = match &err {
            EconomyError::Inconsistency(_) | EconomyError::Database(_) => {
                "Internal error".to_string()
            }
            other => other.to_string(),
        };
        AppError::new(kind, message)
    }
}

impl IntoResponse for EconomyError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        if status.is_server_error() {
            // Do not leak internals for 5xx
            return (status, ()).into_response();
        }
        let app_err: AppError = self.into();
        app_err.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            EconomyError::AccountNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EconomyError::InvalidAmount.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EconomyError::InvalidQuantity.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EconomyError::InsufficientBalance {
                required: 15,
                available: 10
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            EconomyError::InsufficientStock {
                kind: PowerUpKind::Hints,
                available: 0
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            EconomyError::Inconsistency("drift".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = EconomyError::InsufficientBalance {
            required: 45,
            available: 30,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient coins. Required: 45, available: 30"
        );
    }

    #[test]
    fn test_consistency_errors_are_masked() {
        let app: AppError = EconomyError::Inconsistency("balance drift of 3".into()).into();
        assert_eq!(app.message(), "Internal error");
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn test_conflict_errors_keep_details() {
        let app: AppError = EconomyError::InsufficientBalance {
            required: 15,
            available: 10,
        }
        .into();
        assert!(app.message().contains("Required: 15"));
        assert_eq!(app.status_code(), 409);
    }
}
