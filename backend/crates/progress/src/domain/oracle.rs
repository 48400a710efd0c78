//! External Collaborator Traits
//!
//! The grading oracle and the learner-stats aggregate are consumed through
//! narrow interfaces; their internals are out of this crate's ownership.
//! Implementations are injected into the use cases (infra layer for
//! production, in-memory fakes for tests).

use kernel::id::{AccountId, ExerciseId};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProgressResult;

/// Verdict returned by the grading oracle
#[derive(Debug, Clone)]
pub struct GradedVerdict {
    pub score: i64,
    pub max_score: i64,
    pub is_correct: bool,
    /// Oracle-side commentary; kept inside the verdict details
    pub feedback: String,
    pub details: Value,
    /// Identifier of the oracle-side validation audit record
    pub audit_id: Uuid,
}

/// Grading oracle - opaque, possibly remote
///
/// A timeout or transport failure must surface as an error without any
/// partial grade being recorded; the submission stays `submitted` and the
/// call may be retried.
#[trait_variant::make(GradingOracle: Send)]
pub trait LocalGradingOracle {
    async fn validate_and_grade(
        &self,
        exercise_id: ExerciseId,
        account_id: AccountId,
        submitted_answer: &Value,
        attempt_number: i32,
        client_metadata: &Value,
    ) -> ProgressResult<GradedVerdict>;
}

/// Learner-stats aggregate - XP lives outside the coin ledger
#[trait_variant::make(LearnerStats: Send)]
pub trait LocalLearnerStats {
    /// Add XP to the account's stats aggregate
    async fn add_xp(&self, account_id: AccountId, amount: i64) -> ProgressResult<()>;
}
