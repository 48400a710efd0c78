//! Provide Feedback Use Case
//!
//! Attaches manual teacher feedback to a graded submission; the only way a
//! submission reaches `reviewed`.

use std::sync::Arc;

use kernel::id::SubmissionId;
use serde_json::Value;

use crate::domain::entities::ExerciseSubmission;
use crate::domain::repository::SubmissionRepository;
use crate::error::{ProgressError, ProgressResult};

/// Provide Feedback Use Case
pub struct ProvideFeedbackUseCase<S>
where
    S: SubmissionRepository,
{
    repo: Arc<S>,
}

impl<S> ProvideFeedbackUseCase<S>
where
    S: SubmissionRepository,
{
    pub fn new(repo: Arc<S>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        submission_id: SubmissionId,
        feedback: Value,
    ) -> ProgressResult<ExerciseSubmission> {
        let mut submission = self
            .repo
            .find(submission_id)
            .await?
            .ok_or(ProgressError::SubmissionNotFound)?;

        let feedback_text = match feedback {
            Value::String(text) => text,
            other => other.to_string(),
        };

        submission.provide_feedback(feedback_text)?;
        self.repo.update(&submission).await?;

        tracing::info!(
            submission_id = %submission.id,
            account_id = %submission.account_id,
            "Teacher feedback recorded"
        );

        Ok(submission)
    }
}
