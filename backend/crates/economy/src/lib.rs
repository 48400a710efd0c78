//! Economy Backend Module
//!
//! The virtual-currency ledger and the power-up inventory.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases (purchase / use power-ups)
//! - `infra/` - PostgreSQL repository implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Consistency Model
//! - The balance record and the inventory record are the only shared mutable
//!   state; both change exclusively through credit/debit/purchase/use
//! - Every mutation commits the counter update and its journal row in one
//!   SQL transaction, with a `FOR UPDATE` row lock serializing writes
//!   per account
//! - The journals are append-only; `audit` reconciles the cached balance
//!   against them

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::EconomyConfig;
pub use error::{EconomyError, EconomyResult};
pub use infra::postgres::PgEconomyRepository;
pub use presentation::router::economy_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};
