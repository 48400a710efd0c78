//! Progress Error Types
//!
//! This module provides submission-workflow error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use economy::EconomyError;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::answer::AnswerError;
use crate::domain::value_objects::{ExerciseKind, SubmissionStatus};

/// Progress-specific result type alias
pub type ProgressResult<T> = Result<T, ProgressError>;

/// Progress-specific error variants
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Submission not found
    #[error("Exercise submission not found")]
    SubmissionNotFound,

    /// Exercise not found or inactive
    #[error("Exercise not found")]
    ExerciseNotFound,

    /// Exercise type tag outside the closed set
    #[error("Unknown exercise type: {0}")]
    UnknownExerciseKind(String),

    /// Status tag outside the closed set
    #[error("Unknown submission status: {0}")]
    UnknownStatus(String),

    /// Answer payload failed structural validation
    #[error("Invalid answer payload: {0}")]
    InvalidAnswer(#[from] AnswerError),

    /// Submission was already graded; resubmission and re-grading are rejected
    #[error("Submission already graded")]
    AlreadyGraded,

    /// Rewards require a graded submission
    #[error("Submission must be graded before claiming rewards")]
    NotGraded,

    /// Rewards were already claimed for this submission
    #[error("Rewards already claimed for this submission")]
    RewardsAlreadyClaimed,

    /// Illegal state machine transition
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    /// Grading oracle timed out; the submission stays `submitted` and the
    /// grade call may be retried
    #[error("Grading service timed out")]
    GradingUnavailable,

    /// Grading oracle rejected the attempt
    #[error("Grading failed: {0}")]
    GradingFailed(String),

    /// Error from the coin ledger during a reward claim
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProgressError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProgressError::SubmissionNotFound | ProgressError::ExerciseNotFound => {
                StatusCode::NOT_FOUND
            }
            ProgressError::UnknownExerciseKind(_) | ProgressError::UnknownStatus(_) => {
                StatusCode::BAD_REQUEST
            }
            ProgressError::InvalidAnswer(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProgressError::AlreadyGraded
            | ProgressError::NotGraded
            | ProgressError::RewardsAlreadyClaimed
            | ProgressError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            ProgressError::GradingUnavailable => StatusCode::REQUEST_TIMEOUT,
            ProgressError::Economy(inner) => inner.status_code(),
            ProgressError::GradingFailed(_)
            | ProgressError::Database(_)
            | ProgressError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProgressError::SubmissionNotFound | ProgressError::ExerciseNotFound => {
                ErrorKind::NotFound
            }
            ProgressError::UnknownExerciseKind(_) | ProgressError::UnknownStatus(_) => {
                ErrorKind::BadRequest
            }
            ProgressError::InvalidAnswer(_) => ErrorKind::UnprocessableEntity,
            ProgressError::AlreadyGraded
            | ProgressError::NotGraded
            | ProgressError::RewardsAlreadyClaimed
            | ProgressError::InvalidStatusTransition { .. } => ErrorKind::Conflict,
            ProgressError::GradingUnavailable => ErrorKind::RequestTimeout,
            ProgressError::Economy(inner) => inner.kind(),
            ProgressError::GradingFailed(_)
            | ProgressError::Database(_)
            | ProgressError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ProgressError::Database(e) => {
                tracing::error!(error = %e, "Progress database error");
            }
            ProgressError::GradingFailed(msg) => {
                tracing::error!(message = %msg, "Grading oracle failure");
            }
            ProgressError::Internal(msg) => {
                tracing::error!(message = %msg, "Progress internal error");
            }
            ProgressError::GradingUnavailable => {
                tracing::warn!("Grading oracle timed out");
            }
            ProgressError::Economy(_) => {
                // The economy layer logged the details already
                tracing::debug!(error = %self, "Economy error during progress flow");
            }
            _ => {
                tracing::debug!(error = %self, "Progress error");
            }
        }
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::Economy(inner) => inner.into(),
            ProgressError::UnknownExerciseKind(given) => {
                let valid: Vec<&str> = ExerciseKind::ALL.iter().map(|k| k.code()).collect();
                AppError::bad_request(format!("Unknown exercise type: {given}"))
                    .with_action(format!("Valid types: {}", valid.join(", ")))
            }
            ProgressError::GradingFailed(_) | ProgressError::Database(_) => {
                AppError::new(ErrorKind::InternalServerError, "Internal error")
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl IntoResponse for ProgressError {
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
