//! Submit Exercise Use Case
//!
//! The primary workflow: validate the answer shape, create or update the
//! submission row, grade through the oracle, and auto-claim rewards on a
//! correct result. Validation runs before anything is persisted.

use std::sync::Arc;

use economy::EconomyConfig;
use economy::domain::repository::LedgerRepository;
use kernel::id::{AccountId, ExerciseId};
use serde_json::Value;

use crate::application::claim_rewards::ClaimRewardsUseCase;
use crate::application::config::ProgressConfig;
use crate::application::grade_submission::GradeSubmissionUseCase;
use crate::domain::answer;
use crate::domain::entities::{AttemptContext, ExerciseSubmission};
use crate::domain::oracle::{GradingOracle, LearnerStats};
use crate::domain::repository::{ExerciseCatalog, SubmissionRepository};
use crate::error::{ProgressError, ProgressResult};

/// Input DTO for submitting an exercise
#[derive(Debug, Clone)]
pub struct SubmitInput {
    pub account_id: AccountId,
    pub exercise_id: ExerciseId,
    pub answers: Value,
    pub context: AttemptContext,
    pub client_metadata: Value,
}

/// Output DTO for a processed submission
#[derive(Debug, Clone)]
pub struct SubmitOutput {
    pub submission: ExerciseSubmission,
    pub xp_earned: i64,
    pub coins_earned: i64,
}

/// Submit Exercise Use Case
pub struct SubmitExerciseUseCase<S, C, O, L, X>
where
    S: SubmissionRepository,
    C: ExerciseCatalog,
    O: GradingOracle,
    L: LedgerRepository,
    X: LearnerStats,
{
    repo: Arc<S>,
    catalog: Arc<C>,
    oracle: Arc<O>,
    ledger: Arc<L>,
    stats: Arc<X>,
    config: Arc<ProgressConfig>,
    economy_config: Arc<EconomyConfig>,
}

impl<S, C, O, L, X> SubmitExerciseUseCase<S, C, O, L, X>
where
    S: SubmissionRepository,
    C: ExerciseCatalog,
    O: GradingOracle,
    L: LedgerRepository,
    X: LearnerStats,
{
    pub fn new(
        repo: Arc<S>,
        catalog: Arc<C>,
        oracle: Arc<O>,
        ledger: Arc<L>,
        stats: Arc<X>,
        config: Arc<ProgressConfig>,
        economy_config: Arc<EconomyConfig>,
    ) -> Self {
        Self {
            repo,
            catalog,
            oracle,
            ledger,
            stats,
            config,
            economy_config,
        }
    }

    pub async fn execute(&self, input: SubmitInput) -> ProgressResult<SubmitOutput> {
        let exercise = self
            .catalog
            .find_exercise(input.exercise_id)
            .await?
            .filter(|exercise| exercise.is_active)
            .ok_or(ProgressError::ExerciseNotFound)?;

        // Pure gate: nothing is persisted on a shape mismatch
        answer::validate(exercise.kind, &input.answers)?;

        let existing = self
            .repo
            .find_by_account_and_exercise(input.account_id, input.exercise_id)
            .await?;

        let submission = match existing {
            Some(previous) if !previous.status.allows_answer_edit() => {
                return Err(ProgressError::AlreadyGraded);
            }
            Some(mut previous) => {
                previous.resubmit(input.answers, input.context)?;
                self.repo.update(&previous).await?;
                previous
            }
            None => {
                let max_score = if exercise.max_score > 0 {
                    exercise.max_score
                } else {
                    self.config.default_max_score
                };
                let submission = ExerciseSubmission::new(
                    input.account_id,
                    input.exercise_id,
                    input.answers,
                    max_score,
                    input.context,
                );
                self.repo.create(&submission).await?;
                submission
            }
        };

        tracing::info!(
            submission_id = %submission.id,
            account_id = %submission.account_id,
            exercise_id = %submission.exercise_id,
            kind = %exercise.kind,
            attempt = submission.attempt_number,
            "Exercise submitted"
        );

        // Grade immediately. On oracle failure the row stays `submitted`
        // and the standalone grade call can be retried.
        let graded = GradeSubmissionUseCase::new(self.repo.clone(), self.oracle.clone())
            .execute(submission.id, input.client_metadata)
            .await?;

        if !graded.is_correct {
            return Ok(SubmitOutput {
                submission: graded,
                xp_earned: 0,
                coins_earned: 0,
            });
        }

        // Auto-claim: invoked exactly once, immediately after the graded
        // transition. Re-reads of the submission never re-enter this path.
        let claim = ClaimRewardsUseCase::new(
            self.repo.clone(),
            self.ledger.clone(),
            self.stats.clone(),
            self.economy_config.clone(),
        )
        .execute(graded.id)
        .await?;

        Ok(SubmitOutput {
            submission: claim.submission,
            xp_earned: claim.xp_earned,
            coins_earned: claim.coins_earned,
        })
    }
}
