//! Update Submission Status Use Case
//!
//! Exposes the raw state machine for admin tooling. The transition matrix
//! lives in [`SubmissionStatus::can_transition`]; everything else is
//! rejected with the offending pair.

use std::sync::Arc;

use kernel::id::SubmissionId;

use crate::domain::entities::ExerciseSubmission;
use crate::domain::repository::SubmissionRepository;
use crate::domain::value_objects::SubmissionStatus;
use crate::error::{ProgressError, ProgressResult};

/// Update Submission Status Use Case
pub struct UpdateStatusUseCase<S>
where
    S: SubmissionRepository,
{
    repo: Arc<S>,
}

impl<S> UpdateStatusUseCase<S>
where
    S: SubmissionRepository,
{
    pub fn new(repo: Arc<S>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        submission_id: SubmissionId,
        to: SubmissionStatus,
    ) -> ProgressResult<ExerciseSubmission> {
        let mut submission = self
            .repo
            .find(submission_id)
            .await?
            .ok_or(ProgressError::SubmissionNotFound)?;

        let from = submission.status;
        submission.transition(to)?;
        self.repo.update(&submission).await?;

        tracing::info!(
            submission_id = %submission.id,
            from = %from,
            to = %to,
            "Submission status updated"
        );

        Ok(submission)
    }
}
