//! Progress Backend Module
//!
//! Exercise submissions: answer validation, the grading lifecycle state
//! machine and reward claiming.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, the status state machine, answer schemas,
//!   the pure reward calculator, repository/collaborator traits
//! - `application/` - Use cases (submit, grade, claim, feedback, status)
//! - `infra/` - PostgreSQL repositories, HTTP grading-oracle client
//! - `presentation/` - HTTP handlers
//!
//! ## Workflow Model
//! - Answer validation is a pure gate; nothing persists on a shape mismatch
//! - Grading is a one-shot `submitted → graded` transition; oracle failures
//!   record nothing and the grade call is retryable
//! - Rewards are claimed at most once per submission, guarded by a
//!   conditional claim latch rather than caller discipline; a failed ledger
//!   credit re-arms the latch so the claim alone can be retried

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::ProgressConfig;
pub use error::{ProgressError, ProgressResult};
pub use infra::oracle::HttpGradingOracle;
pub use infra::postgres::PgProgressRepository;
pub use presentation::router::progress_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
