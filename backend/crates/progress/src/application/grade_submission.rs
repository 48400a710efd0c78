//! Grade Submission Use Case
//!
//! Delegates scoring to the grading oracle and records the verdict as the
//! one-shot `submitted → graded` transition. An oracle failure records
//! nothing; the submission stays `submitted` and grading can be retried.

use std::sync::Arc;

use kernel::id::SubmissionId;
use serde_json::Value;

use crate::domain::entities::ExerciseSubmission;
use crate::domain::oracle::GradingOracle;
use crate::domain::repository::SubmissionRepository;
use crate::domain::value_objects::SubmissionStatus;
use crate::error::{ProgressError, ProgressResult};

/// Grade Submission Use Case
pub struct GradeSubmissionUseCase<S, O>
where
    S: SubmissionRepository,
    O: GradingOracle,
{
    repo: Arc<S>,
    oracle: Arc<O>,
}

impl<S, O> GradeSubmissionUseCase<S, O>
where
    S: SubmissionRepository,
    O: GradingOracle,
{
    pub fn new(repo: Arc<S>, oracle: Arc<O>) -> Self {
        Self { repo, oracle }
    }

    pub async fn execute(
        &self,
        submission_id: SubmissionId,
        client_metadata: Value,
    ) -> ProgressResult<ExerciseSubmission> {
        let mut submission = self
            .repo
            .find(submission_id)
            .await?
            .ok_or(ProgressError::SubmissionNotFound)?;

        if submission.status != SubmissionStatus::Submitted {
            return Err(ProgressError::AlreadyGraded);
        }

        let verdict = self
            .oracle
            .validate_and_grade(
                submission.exercise_id,
                submission.account_id,
                &submission.answers,
                submission.attempt_number,
                &client_metadata,
            )
            .await?;

        submission.record_grade(&verdict)?;
        self.repo.update(&submission).await?;

        tracing::info!(
            submission_id = %submission.id,
            account_id = %submission.account_id,
            score = submission.score,
            max_score = submission.max_score,
            is_correct = submission.is_correct,
            audit_id = %verdict.audit_id,
            "Submission graded"
        );

        Ok(submission)
    }
}
