//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::{ExerciseSubmission, SubmissionStats};

/// Request for POST /api/progress/submissions/submit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub account_id: Uuid,
    pub exercise_id: Uuid,
    pub answers: Value,
    #[serde(default)]
    pub hint_used: bool,
    #[serde(default)]
    pub hints_count: i64,
    #[serde(default)]
    pub power_ups_used: Vec<String>,
    #[serde(default)]
    pub coins_spent: i64,
    #[serde(default)]
    pub client_metadata: Value,
}

/// Optional body for POST /api/progress/submissions/{id}/grade
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    #[serde(default)]
    pub client_metadata: Value,
}

/// Request for POST /api/progress/submissions/{id}/feedback
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: Value,
}

/// Request for PATCH /api/progress/submissions/{id}/status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// One submission in API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub exercise_id: Uuid,
    pub status: String,
    pub score: i64,
    pub max_score: i64,
    pub is_correct: bool,
    pub hint_used: bool,
    pub hints_count: i64,
    pub power_ups_used: Vec<String>,
    pub coins_spent: i64,
    pub attempt_number: i32,
    pub feedback: Option<String>,
    pub rewards_claimed: bool,
    pub rewards_claimed_at: Option<DateTime<Utc>>,
    pub xp_awarded: Option<i64>,
    pub coins_awarded: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl From<ExerciseSubmission> for SubmissionResponse {
    fn from(submission: ExerciseSubmission) -> Self {
        Self {
            id: submission.id.into_uuid(),
            account_id: submission.account_id.into_uuid(),
            exercise_id: submission.exercise_id.into_uuid(),
            status: submission.status.code().to_string(),
            score: submission.score,
            max_score: submission.max_score,
            is_correct: submission.is_correct,
            hint_used: submission.hint_used,
            hints_count: submission.hints_count,
            power_ups_used: submission
                .power_ups_used
                .iter()
                .map(|kind| kind.code().to_string())
                .collect(),
            coins_spent: submission.coins_spent,
            attempt_number: submission.attempt_number,
            feedback: submission.feedback,
            rewards_claimed: submission.rewards_claimed,
            rewards_claimed_at: submission.rewards_claimed_at,
            xp_awarded: submission.xp_awarded,
            coins_awarded: submission.coins_awarded,
            submitted_at: submission.submitted_at,
            graded_at: submission.graded_at,
        }
    }
}

/// Response for submit/grade/claim flows: the submission plus the rewards
/// that moved in this call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSubmissionResponse {
    #[serde(flatten)]
    pub submission: SubmissionResponse,
    pub xp_earned: i64,
    pub coins_earned: i64,
}

/// Response for GET /api/progress/submissions/user/{account_id}/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatsResponse {
    pub total_submissions: i64,
    pub graded_submissions: i64,
    pub completion_rate: f64,
    pub average_score: f64,
    pub perfect_scores_count: i64,
    pub total_xp_awarded: i64,
    pub total_coins_awarded: i64,
}

impl From<SubmissionStats> for SubmissionStatsResponse {
    fn from(stats: SubmissionStats) -> Self {
        Self {
            total_submissions: stats.total_submissions,
            graded_submissions: stats.graded_submissions,
            completion_rate: stats.completion_rate,
            average_score: stats.average_score,
            perfect_scores_count: stats.perfect_scores_count,
            total_xp_awarded: stats.total_xp_awarded,
            total_coins_awarded: stats.total_coins_awarded,
        }
    }
}
