//! HTTP Grading Oracle Client
//!
//! The oracle is a remote service owning the per-mechanic scoring rules.
//! This client only speaks its contract; a timeout surfaces as the
//! retryable [`ProgressError::GradingUnavailable`] so the submission stays
//! `submitted`.

use std::time::Duration;

use kernel::id::{AccountId, ExerciseId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::oracle::{GradedVerdict, GradingOracle};
use crate::error::{ProgressError, ProgressResult};

/// reqwest-backed grading oracle client
#[derive(Clone)]
pub struct HttpGradingOracle {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGradingOracle {
    /// Build a client with a hard per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ProgressResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProgressError::Internal(format!("oracle client setup failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GradeRequestBody<'a> {
    exercise_id: Uuid,
    account_id: Uuid,
    submitted_answer: &'a Value,
    attempt_number: i32,
    client_metadata: &'a Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradeResponseBody {
    score: i64,
    max_score: i64,
    is_correct: bool,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    details: Value,
    audit_id: Uuid,
}

impl GradingOracle for HttpGradingOracle {
    async fn validate_and_grade(
        &self,
        exercise_id: ExerciseId,
        account_id: AccountId,
        submitted_answer: &Value,
        attempt_number: i32,
        client_metadata: &Value,
    ) -> ProgressResult<GradedVerdict> {
        let body = GradeRequestBody {
            exercise_id: exercise_id.into_uuid(),
            account_id: account_id.into_uuid(),
            submitted_answer,
            attempt_number,
            client_metadata,
        };

        let response = self
            .client
            .post(format!("{}/grade", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProgressError::GradingUnavailable
                } else {
                    ProgressError::GradingFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ProgressError::GradingFailed(format!(
                "oracle returned status {}",
                response.status()
            )));
        }

        let verdict: GradeResponseBody = response
            .json()
            .await
            .map_err(|e| ProgressError::GradingFailed(format!("malformed verdict: {e}")))?;

        tracing::info!(
            exercise_id = %exercise_id,
            account_id = %account_id,
            score = verdict.score,
            max_score = verdict.max_score,
            is_correct = verdict.is_correct,
            audit_id = %verdict.audit_id,
            "Grading oracle verdict received"
        );

        Ok(GradedVerdict {
            score: verdict.score,
            max_score: verdict.max_score,
            is_correct: verdict.is_correct,
            feedback: verdict.feedback,
            details: verdict.details,
            audit_id: verdict.audit_id,
        })
    }
}
