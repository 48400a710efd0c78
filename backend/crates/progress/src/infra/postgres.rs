//! PostgreSQL Repository Implementations
//!
//! Submission persistence, the exercise catalog lookup and the learner-stats
//! XP aggregate. The reward-claim latch is a conditional UPDATE, so two
//! concurrent claims can never both win it.

use chrono::{DateTime, Utc};
use economy::domain::value_objects::PowerUpKind;
use kernel::id::{AccountId, ExerciseId, SubmissionId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Exercise, ExerciseSubmission};
use crate::domain::repository::{ExerciseCatalog, SubmissionRepository};
use crate::domain::oracle::LearnerStats;
use crate::domain::value_objects::{ExerciseKind, SubmissionStatus};
use crate::error::{ProgressError, ProgressResult};

const SUBMISSION_COLUMNS: &str = r#"
    submission_id,
    account_id,
    exercise_id,
    answers,
    score,
    max_score,
    is_correct,
    status,
    hint_used,
    hints_count,
    power_ups_used,
    coins_spent,
    attempt_number,
    feedback,
    rewards_claimed,
    rewards_claimed_at,
    xp_awarded,
    coins_awarded,
    submitted_at,
    graded_at
"#;

/// PostgreSQL-backed progress repository
#[derive(Clone)]
pub struct PgProgressRepository {
    pool: PgPool,
}

impl PgProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SubmissionRepository for PgProgressRepository {
    async fn create(&self, submission: &ExerciseSubmission) -> ProgressResult<()> {
        sqlx::query(
            r#"
            INSERT INTO exercise_submissions (
                submission_id,
                account_id,
                exercise_id,
                answers,
                score,
                max_score,
                is_correct,
                status,
                hint_used,
                hints_count,
                power_ups_used,
                coins_spent,
                attempt_number,
                feedback,
                rewards_claimed,
                rewards_claimed_at,
                xp_awarded,
                coins_awarded,
                submitted_at,
                graded_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(submission.id.as_uuid())
        .bind(submission.account_id.as_uuid())
        .bind(submission.exercise_id.as_uuid())
        .bind(&submission.answers)
        .bind(submission.score)
        .bind(submission.max_score)
        .bind(submission.is_correct)
        .bind(submission.status.code())
        .bind(submission.hint_used)
        .bind(submission.hints_count)
        .bind(power_ups_json(&submission.power_ups_used))
        .bind(submission.coins_spent)
        .bind(submission.attempt_number)
        .bind(&submission.feedback)
        .bind(submission.rewards_claimed)
        .bind(submission.rewards_claimed_at)
        .bind(submission.xp_awarded)
        .bind(submission.coins_awarded)
        .bind(submission.submitted_at)
        .bind(submission.graded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, submission: &ExerciseSubmission) -> ProgressResult<()> {
        sqlx::query(
            r#"
            UPDATE exercise_submissions SET
                answers = $2,
                score = $3,
                max_score = $4,
                is_correct = $5,
                status = $6,
                hint_used = $7,
                hints_count = $8,
                power_ups_used = $9,
                coins_spent = $10,
                attempt_number = $11,
                feedback = $12,
                submitted_at = $13,
                graded_at = $14
            WHERE submission_id = $1
            "#,
        )
        .bind(submission.id.as_uuid())
        .bind(&submission.answers)
        .bind(submission.score)
        .bind(submission.max_score)
        .bind(submission.is_correct)
        .bind(submission.status.code())
        .bind(submission.hint_used)
        .bind(submission.hints_count)
        .bind(power_ups_json(&submission.power_ups_used))
        .bind(submission.coins_spent)
        .bind(submission.attempt_number)
        .bind(&submission.feedback)
        .bind(submission.submitted_at)
        .bind(submission.graded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: SubmissionId) -> ProgressResult<Option<ExerciseSubmission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM exercise_submissions WHERE submission_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn find_by_account_and_exercise(
        &self,
        account_id: AccountId,
        exercise_id: ExerciseId,
    ) -> ProgressResult<Option<ExerciseSubmission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM exercise_submissions
            WHERE account_id = $1 AND exercise_id = $2
            ORDER BY submitted_at DESC
            LIMIT 1
            "#
        ))
        .bind(account_id.as_uuid())
        .bind(exercise_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> ProgressResult<Vec<ExerciseSubmission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM exercise_submissions
            WHERE account_id = $1
            ORDER BY submitted_at DESC
            "#
        ))
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }

    async fn list_by_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> ProgressResult<Vec<ExerciseSubmission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM exercise_submissions
            WHERE exercise_id = $1
            ORDER BY submitted_at DESC
            "#
        ))
        .bind(exercise_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }

    async fn list_pending_review(&self) -> ProgressResult<Vec<ExerciseSubmission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM exercise_submissions
            WHERE status = 'submitted'
            ORDER BY submitted_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }

    async fn acquire_reward_claim(&self, id: SubmissionId) -> ProgressResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE exercise_submissions
            SET rewards_claimed = TRUE, rewards_claimed_at = $2
            WHERE submission_id = $1
              AND status = 'graded'
              AND rewards_claimed = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn finish_reward_claim(
        &self,
        id: SubmissionId,
        xp: i64,
        coins: i64,
    ) -> ProgressResult<()> {
        sqlx::query(
            r#"
            UPDATE exercise_submissions
            SET xp_awarded = $2, coins_awarded = $3
            WHERE submission_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(xp)
        .bind(coins)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn release_reward_claim(&self, id: SubmissionId) -> ProgressResult<()> {
        sqlx::query(
            r#"
            UPDATE exercise_submissions
            SET rewards_claimed = FALSE, rewards_claimed_at = NULL
            WHERE submission_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        tracing::warn!(submission_id = %id, "Reward claim latch released");

        Ok(())
    }
}

impl ExerciseCatalog for PgProgressRepository {
    async fn find_exercise(&self, id: ExerciseId) -> ProgressResult<Option<Exercise>> {
        let row = sqlx::query_as::<_, ExerciseRow>(
            r#"
            SELECT exercise_id, kind, max_score, is_active
            FROM exercises
            WHERE exercise_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExerciseRow::into_exercise).transpose()
    }
}

impl LearnerStats for PgProgressRepository {
    async fn add_xp(&self, account_id: AccountId, amount: i64) -> ProgressResult<()> {
        sqlx::query(
            r#"
            INSERT INTO learner_stats (account_id, xp, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id)
            DO UPDATE SET xp = learner_stats.xp + EXCLUDED.xp, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::info!(account_id = %account_id, xp = amount, "XP added to learner stats");

        Ok(())
    }
}

fn power_ups_json(power_ups: &[PowerUpKind]) -> serde_json::Value {
    serde_json::Value::Array(
        power_ups
            .iter()
            .map(|kind| serde_json::Value::String(kind.code().to_string()))
            .collect(),
    )
}

fn power_ups_from_json(value: &serde_json::Value) -> ProgressResult<Vec<PowerUpKind>> {
    let Some(list) = value.as_array() else {
        return Ok(Vec::new());
    };
    list.iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(PowerUpKind::from_code)
                .ok_or_else(|| {
                    ProgressError::Internal(format!("unknown power-up in submission row: {entry}"))
                })
        })
        .collect()
}

// Internal row types for sqlx mapping

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    submission_id: Uuid,
    account_id: Uuid,
    exercise_id: Uuid,
    answers: serde_json::Value,
    score: i64,
    max_score: i64,
    is_correct: bool,
    status: String,
    hint_used: bool,
    hints_count: i64,
    power_ups_used: serde_json::Value,
    coins_spent: i64,
    attempt_number: i32,
    feedback: Option<String>,
    rewards_claimed: bool,
    rewards_claimed_at: Option<DateTime<Utc>>,
    xp_awarded: Option<i64>,
    coins_awarded: Option<i64>,
    submitted_at: DateTime<Utc>,
    graded_at: Option<DateTime<Utc>>,
}

impl SubmissionRow {
    fn into_submission(self) -> ProgressResult<ExerciseSubmission> {
        let status = SubmissionStatus::from_code(&self.status)
            .ok_or_else(|| ProgressError::UnknownStatus(self.status.clone()))?;
        let power_ups_used = power_ups_from_json(&self.power_ups_used)?;

        Ok(ExerciseSubmission {
            id: SubmissionId::from_uuid(self.submission_id),
            account_id: AccountId::from_uuid(self.account_id),
            exercise_id: ExerciseId::from_uuid(self.exercise_id),
            answers: self.answers,
            score: self.score,
            max_score: self.max_score,
            is_correct: self.is_correct,
            status,
            hint_used: self.hint_used,
            hints_count: self.hints_count,
            power_ups_used,
            coins_spent: self.coins_spent,
            attempt_number: self.attempt_number,
            feedback: self.feedback,
            rewards_claimed: self.rewards_claimed,
            rewards_claimed_at: self.rewards_claimed_at,
            xp_awarded: self.xp_awarded,
            coins_awarded: self.coins_awarded,
            submitted_at: self.submitted_at,
            graded_at: self.graded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    exercise_id: Uuid,
    kind: String,
    max_score: i64,
    is_active: bool,
}

impl ExerciseRow {
    fn into_exercise(self) -> ProgressResult<Exercise> {
        let kind = ExerciseKind::from_code(&self.kind)
            .ok_or_else(|| ProgressError::UnknownExerciseKind(self.kind.clone()))?;
        Ok(Exercise {
            id: ExerciseId::from_uuid(self.exercise_id),
            kind,
            max_score: self.max_score,
            is_active: self.is_active,
        })
    }
}
