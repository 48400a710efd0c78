//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use economy::EconomyConfig;
use economy::EconomyError;
use economy::domain::repository::LedgerRepository;
use economy::domain::value_objects::PowerUpKind;
use kernel::id::{AccountId, ExerciseId, SubmissionId};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::claim_rewards::ClaimRewardsUseCase;
use crate::application::config::ProgressConfig;
use crate::application::grade_submission::GradeSubmissionUseCase;
use crate::application::provide_feedback::ProvideFeedbackUseCase;
use crate::application::submit_exercise::{SubmitExerciseUseCase, SubmitInput};
use crate::application::update_status::UpdateStatusUseCase;
use crate::domain::entities::{AttemptContext, SubmissionStats};
use crate::domain::oracle::{GradingOracle, LearnerStats};
use crate::domain::repository::{ExerciseCatalog, SubmissionRepository};
use crate::domain::value_objects::SubmissionStatus;
use crate::error::{ProgressError, ProgressResult};
use crate::presentation::dto::{
    FeedbackRequest, GradeRequest, ProcessedSubmissionResponse, SubmissionResponse,
    SubmissionStatsResponse, SubmitRequest, UpdateStatusRequest,
};

/// Shared state for progress handlers
pub struct ProgressAppState<R, O, L>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub oracle: Arc<O>,
    pub ledger: Arc<L>,
    pub config: Arc<ProgressConfig>,
    pub economy_config: Arc<EconomyConfig>,
}

// Manual impl: the fields are all Arc, so cloning never needs O/L to be Clone
impl<R, O, L> Clone for ProgressAppState<R, O, L>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            oracle: self.oracle.clone(),
            ledger: self.ledger.clone(),
            config: self.config.clone(),
            economy_config: self.economy_config.clone(),
        }
    }
}

fn parse_power_ups(tags: &[String]) -> ProgressResult<Vec<PowerUpKind>> {
    tags.iter()
        .map(|tag| {
            PowerUpKind::from_code(tag).ok_or_else(|| {
                ProgressError::Economy(EconomyError::UnknownPowerUpKind(tag.clone()))
            })
        })
        .collect()
}

/// POST /api/progress/submissions/submit
pub async fn submit_exercise<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Json(req): Json<SubmitRequest>,
) -> ProgressResult<Json<ProcessedSubmissionResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let power_ups_used = parse_power_ups(&req.power_ups_used)?;

    let use_case = SubmitExerciseUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.oracle.clone(),
        state.ledger.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.economy_config.clone(),
    );

    let output = use_case
        .execute(SubmitInput {
            account_id: AccountId::from_uuid(req.account_id),
            exercise_id: ExerciseId::from_uuid(req.exercise_id),
            answers: req.answers,
            context: AttemptContext {
                hint_used: req.hint_used,
                hints_count: req.hints_count,
                power_ups_used,
                coins_spent: req.coins_spent,
            },
            client_metadata: req.client_metadata,
        })
        .await?;

    Ok(Json(ProcessedSubmissionResponse {
        submission: output.submission.into(),
        xp_earned: output.xp_earned,
        coins_earned: output.coins_earned,
    }))
}

/// POST /api/progress/submissions/{id}/grade
///
/// Retry entry point after an oracle failure. Mirrors the primary workflow:
/// a successful grading transition immediately claims rewards once.
pub async fn grade_submission<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(id): Path<Uuid>,
    body: Option<Json<GradeRequest>>,
) -> ProgressResult<Json<ProcessedSubmissionResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submission_id = SubmissionId::from_uuid(id);
    let client_metadata = body.map(|Json(req)| req.client_metadata).unwrap_or_default();

    let graded = GradeSubmissionUseCase::new(state.repo.clone(), state.oracle.clone())
        .execute(submission_id, client_metadata)
        .await?;

    if !graded.is_correct {
        return Ok(Json(ProcessedSubmissionResponse {
            submission: graded.into(),
            xp_earned: 0,
            coins_earned: 0,
        }));
    }

    let claim = ClaimRewardsUseCase::new(
        state.repo.clone(),
        state.ledger.clone(),
        state.repo.clone(),
        state.economy_config.clone(),
    )
    .execute(submission_id)
    .await?;

    Ok(Json(ProcessedSubmissionResponse {
        submission: claim.submission.into(),
        xp_earned: claim.xp_earned,
        coins_earned: claim.coins_earned,
    }))
}

/// POST /api/progress/submissions/{id}/claim-rewards
pub async fn claim_rewards<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(id): Path<Uuid>,
) -> ProgressResult<Json<ProcessedSubmissionResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let claim = ClaimRewardsUseCase::new(
        state.repo.clone(),
        state.ledger.clone(),
        state.repo.clone(),
        state.economy_config.clone(),
    )
    .execute(SubmissionId::from_uuid(id))
    .await?;

    Ok(Json(ProcessedSubmissionResponse {
        submission: claim.submission.into(),
        xp_earned: claim.xp_earned,
        coins_earned: claim.coins_earned,
    }))
}

/// POST /api/progress/submissions/{id}/feedback
pub async fn provide_feedback<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> ProgressResult<Json<SubmissionResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submission = ProvideFeedbackUseCase::new(state.repo.clone())
        .execute(SubmissionId::from_uuid(id), req.feedback)
        .await?;

    Ok(Json(submission.into()))
}

/// PATCH /api/progress/submissions/{id}/status
pub async fn update_status<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ProgressResult<Json<SubmissionResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let to = SubmissionStatus::from_code(&req.status)
        .ok_or_else(|| ProgressError::UnknownStatus(req.status.clone()))?;

    let submission = UpdateStatusUseCase::new(state.repo.clone())
        .execute(SubmissionId::from_uuid(id), to)
        .await?;

    Ok(Json(submission.into()))
}

/// GET /api/progress/submissions/{id}
pub async fn get_submission<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(id): Path<Uuid>,
) -> ProgressResult<Json<SubmissionResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submission = state
        .repo
        .find(SubmissionId::from_uuid(id))
        .await?
        .ok_or(ProgressError::SubmissionNotFound)?;

    Ok(Json(submission.into()))
}

/// GET /api/progress/submissions/user/{account_id}
pub async fn list_by_account<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(account_id): Path<Uuid>,
) -> ProgressResult<Json<Vec<SubmissionResponse>>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submissions = state
        .repo
        .list_by_account(AccountId::from_uuid(account_id))
        .await?;

    Ok(Json(
        submissions.into_iter().map(SubmissionResponse::from).collect(),
    ))
}

/// GET /api/progress/submissions/user/{account_id}/stats
pub async fn account_stats<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(account_id): Path<Uuid>,
) -> ProgressResult<Json<SubmissionStatsResponse>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submissions = state
        .repo
        .list_by_account(AccountId::from_uuid(account_id))
        .await?;

    Ok(Json(SubmissionStats::from_submissions(&submissions).into()))
}

/// GET /api/progress/submissions/exercise/{exercise_id}
pub async fn list_by_exercise<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
    Path(exercise_id): Path<Uuid>,
) -> ProgressResult<Json<Vec<SubmissionResponse>>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submissions = state
        .repo
        .list_by_exercise(ExerciseId::from_uuid(exercise_id))
        .await?;

    Ok(Json(
        submissions.into_iter().map(SubmissionResponse::from).collect(),
    ))
}

/// GET /api/progress/submissions/pending-review
pub async fn pending_review<R, O, L>(
    State(state): State<ProgressAppState<R, O, L>>,
) -> ProgressResult<Json<Vec<SubmissionResponse>>>
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let submissions = state.repo.list_pending_review().await?;

    Ok(Json(
        submissions.into_iter().map(SubmissionResponse::from).collect(),
    ))
}
