//! Repository Traits
//!
//! Interfaces for submission persistence and the exercise catalog lookup.
//! Implementation is in the infrastructure layer.

use kernel::id::{AccountId, ExerciseId, SubmissionId};

use crate::domain::entities::{Exercise, ExerciseSubmission};
use crate::error::ProgressResult;

/// Submission repository trait
#[trait_variant::make(SubmissionRepository: Send)]
pub trait LocalSubmissionRepository {
    /// Persist a new submission
    async fn create(&self, submission: &ExerciseSubmission) -> ProgressResult<()>;

    /// Persist the current state of an existing submission
    async fn update(&self, submission: &ExerciseSubmission) -> ProgressResult<()>;

    /// Load by id
    async fn find(&self, id: SubmissionId) -> ProgressResult<Option<ExerciseSubmission>>;

    /// Latest submission of one learner for one exercise
    async fn find_by_account_and_exercise(
        &self,
        account_id: AccountId,
        exercise_id: ExerciseId,
    ) -> ProgressResult<Option<ExerciseSubmission>>;

    /// All submissions of a learner, newest first
    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> ProgressResult<Vec<ExerciseSubmission>>;

    /// All submissions for an exercise, newest first
    async fn list_by_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> ProgressResult<Vec<ExerciseSubmission>>;

    /// Submissions waiting for manual review, oldest first
    async fn list_pending_review(&self) -> ProgressResult<Vec<ExerciseSubmission>>;

    /// Atomically arm the claim latch
    ///
    /// Flips `rewards_claimed` to true only when the submission is `graded`
    /// and unclaimed; returns whether this call won the latch. At-most-once
    /// claiming rests on this conditional update.
    async fn acquire_reward_claim(&self, id: SubmissionId) -> ProgressResult<bool>;

    /// Record the awarded amounts after the ledger credit committed
    async fn finish_reward_claim(
        &self,
        id: SubmissionId,
        xp: i64,
        coins: i64,
    ) -> ProgressResult<()>;

    /// Re-arm the latch after a failed claim so it can be retried
    async fn release_reward_claim(&self, id: SubmissionId) -> ProgressResult<()>;
}

/// Exercise catalog lookup trait
#[trait_variant::make(ExerciseCatalog: Send)]
pub trait LocalExerciseCatalog {
    /// Load a catalog record by id
    async fn find_exercise(&self, id: ExerciseId) -> ProgressResult<Option<Exercise>>;
}
