//! Domain Entities
//!
//! The exercise catalog record consumed by the submit flow and the
//! submission entity that owns the grading lifecycle.

use chrono::{DateTime, Utc};
use economy::domain::value_objects::PowerUpKind;
use kernel::id::{AccountId, ExerciseId, SubmissionId};
use serde_json::Value;

use crate::domain::oracle::GradedVerdict;
use crate::domain::rewards::{self, RewardBreakdown};
use crate::domain::value_objects::{ExerciseKind, SubmissionStatus};
use crate::error::{ProgressError, ProgressResult};

/// Minimal exercise catalog record
///
/// Content authoring is out of scope; the submit flow only needs the kind
/// tag (to pick the answer schema) and the scoring ceiling.
#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: ExerciseId,
    pub kind: ExerciseKind,
    pub max_score: i64,
    pub is_active: bool,
}

/// Per-attempt client context recorded on the submission
#[derive(Debug, Clone, Default)]
pub struct AttemptContext {
    pub hint_used: bool,
    pub hints_count: i64,
    pub power_ups_used: Vec<PowerUpKind>,
    /// Coins spent on power-ups during this attempt
    pub coins_spent: i64,
}

/// Exercise submission entity
///
/// One row per (learner, exercise). Lifecycle:
/// `draft → submitted → graded → reviewed`; rewards are claimed at most
/// once, latched by `rewards_claimed`.
#[derive(Debug, Clone)]
pub struct ExerciseSubmission {
    pub id: SubmissionId,
    pub account_id: AccountId,
    pub exercise_id: ExerciseId,
    pub answers: Value,
    pub score: i64,
    pub max_score: i64,
    pub is_correct: bool,
    pub status: SubmissionStatus,
    pub hint_used: bool,
    pub hints_count: i64,
    pub power_ups_used: Vec<PowerUpKind>,
    pub coins_spent: i64,
    pub attempt_number: i32,
    pub feedback: Option<String>,
    /// Claim latch: set once, never re-armed by the primary workflow
    pub rewards_claimed: bool,
    pub rewards_claimed_at: Option<DateTime<Utc>>,
    pub xp_awarded: Option<i64>,
    pub coins_awarded: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl ExerciseSubmission {
    /// Create a submission in `submitted` status
    pub fn new(
        account_id: AccountId,
        exercise_id: ExerciseId,
        answers: Value,
        max_score: i64,
        context: AttemptContext,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            account_id,
            exercise_id,
            answers,
            score: 0,
            max_score,
            is_correct: false,
            status: SubmissionStatus::Submitted,
            hint_used: context.hint_used,
            hints_count: context.hints_count,
            power_ups_used: context.power_ups_used,
            coins_spent: context.coins_spent,
            attempt_number: 1,
            feedback: None,
            rewards_claimed: false,
            rewards_claimed_at: None,
            xp_awarded: None,
            coins_awarded: None,
            submitted_at: Utc::now(),
            graded_at: None,
        }
    }

    /// Replace the answers of an ungraded submission
    ///
    /// Graded and reviewed submissions lock their answer payload.
    pub fn resubmit(&mut self, answers: Value, context: AttemptContext) -> ProgressResult<()> {
        if !self.status.allows_answer_edit() {
            return Err(ProgressError::AlreadyGraded);
        }
        self.answers = answers;
        self.hint_used = context.hint_used;
        self.hints_count = context.hints_count;
        self.power_ups_used = context.power_ups_used;
        self.coins_spent = context.coins_spent;
        self.attempt_number += 1;
        self.status = SubmissionStatus::Submitted;
        self.submitted_at = Utc::now();
        Ok(())
    }

    /// Record the oracle's verdict; one-shot `submitted → graded` transition
    pub fn record_grade(&mut self, verdict: &GradedVerdict) -> ProgressResult<()> {
        if self.status != SubmissionStatus::Submitted {
            return Err(ProgressError::AlreadyGraded);
        }

        self.score = verdict.score;
        if verdict.max_score > 0 {
            self.max_score = verdict.max_score;
        }
        self.is_correct = verdict.is_correct;
        self.status = SubmissionStatus::Graded;
        self.graded_at = Some(Utc::now());
        self.feedback = Some(
            if self.is_perfect() {
                "Perfect score! Excellent work!"
            } else if self.is_correct {
                "Good job! Exercise completed successfully."
            } else {
                "Keep practicing. Review the material and try again."
            }
            .to_string(),
        );

        Ok(())
    }

    /// Generic state-machine transition with the full legality matrix
    pub fn transition(&mut self, to: SubmissionStatus) -> ProgressResult<()> {
        if !self.status.can_transition(to) {
            return Err(ProgressError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        if to == SubmissionStatus::Graded {
            self.graded_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Attach teacher feedback; `graded → reviewed`
    pub fn provide_feedback(&mut self, feedback: String) -> ProgressResult<()> {
        self.transition(SubmissionStatus::Reviewed)?;
        self.feedback = Some(feedback);
        Ok(())
    }

    /// Full score without any hint
    pub fn is_perfect(&self) -> bool {
        self.max_score > 0 && self.score == self.max_score && !self.hint_used
    }

    /// Rewards this submission is worth when claimed
    pub fn reward_breakdown(&self) -> RewardBreakdown {
        rewards::claim_breakdown(
            self.score,
            self.max_score,
            self.hint_used,
            self.hints_count,
            self.coins_spent,
        )
    }
}

/// Aggregated submission statistics for one learner
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionStats {
    pub total_submissions: i64,
    pub graded_submissions: i64,
    /// Percentage of submissions that reached `graded`, two decimals
    pub completion_rate: f64,
    /// Average score over graded submissions, two decimals
    pub average_score: f64,
    pub perfect_scores_count: i64,
    pub total_xp_awarded: i64,
    pub total_coins_awarded: i64,
}

impl SubmissionStats {
    /// Aggregate over a learner's submissions
    pub fn from_submissions(submissions: &[ExerciseSubmission]) -> Self {
        let total = submissions.len() as i64;
        let graded: Vec<_> = submissions
            .iter()
            .filter(|s| {
                s.status == SubmissionStatus::Graded || s.status == SubmissionStatus::Reviewed
            })
            .collect();

        let completion_rate = if total > 0 {
            round2(graded.len() as f64 / total as f64 * 100.0)
        } else {
            0.0
        };
        let average_score = if !graded.is_empty() {
            round2(graded.iter().map(|s| s.score as f64).sum::<f64>() / graded.len() as f64)
        } else {
            0.0
        };

        Self {
            total_submissions: total,
            graded_submissions: graded.len() as i64,
            completion_rate,
            average_score,
            perfect_scores_count: graded.iter().filter(|s| s.is_perfect()).count() as i64,
            total_xp_awarded: submissions.iter().filter_map(|s| s.xp_awarded).sum(),
            total_coins_awarded: submissions.iter().filter_map(|s| s.coins_awarded).sum(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
