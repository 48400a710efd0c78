//! Claim Rewards Use Case
//!
//! Converts a graded, correct submission into one ledger credit and one
//! XP update. At-most-once semantics rest on the repository's conditional
//! claim latch, not on caller discipline: the latch is armed before any
//! side effect, released when the ledger credit fails (so the claim stays
//! retryable), and kept armed once coins have moved.

use std::sync::Arc;

use chrono::Utc;
use economy::EconomyConfig;
use economy::domain::entities::AccountBalance;
use economy::domain::repository::{CreditRequest, LedgerRepository};
use economy::domain::value_objects::{TransactionKind, TransactionRef};
use kernel::id::SubmissionId;

use crate::domain::entities::ExerciseSubmission;
use crate::domain::oracle::LearnerStats;
use crate::domain::repository::SubmissionRepository;
use crate::domain::value_objects::SubmissionStatus;
use crate::error::{ProgressError, ProgressResult};

/// Output DTO for a reward claim
#[derive(Debug, Clone)]
pub struct ClaimOutput {
    pub submission: ExerciseSubmission,
    pub xp_earned: i64,
    pub coins_earned: i64,
}

/// Claim Rewards Use Case
pub struct ClaimRewardsUseCase<S, L, X>
where
    S: SubmissionRepository,
    L: LedgerRepository,
    X: LearnerStats,
{
    repo: Arc<S>,
    ledger: Arc<L>,
    stats: Arc<X>,
    economy_config: Arc<EconomyConfig>,
}

impl<S, L, X> ClaimRewardsUseCase<S, L, X>
where
    S: SubmissionRepository,
    L: LedgerRepository,
    X: LearnerStats,
{
    pub fn new(
        repo: Arc<S>,
        ledger: Arc<L>,
        stats: Arc<X>,
        economy_config: Arc<EconomyConfig>,
    ) -> Self {
        Self {
            repo,
            ledger,
            stats,
            economy_config,
        }
    }

    pub async fn execute(&self, submission_id: SubmissionId) -> ProgressResult<ClaimOutput> {
        let mut submission = self
            .repo
            .find(submission_id)
            .await?
            .ok_or(ProgressError::SubmissionNotFound)?;

        if submission.status != SubmissionStatus::Graded {
            return Err(ProgressError::NotGraded);
        }

        // Incorrect submissions yield zero rewards and never touch the ledger
        if !submission.is_correct {
            return Ok(ClaimOutput {
                submission,
                xp_earned: 0,
                coins_earned: 0,
            });
        }

        if !self.repo.acquire_reward_claim(submission_id).await? {
            return Err(ProgressError::RewardsAlreadyClaimed);
        }

        let breakdown = submission.reward_breakdown();

        // The grading flow lazily provisions the balance; the raw ledger
        // does not auto-create.
        if self
            .ledger
            .find_balance(submission.account_id)
            .await?
            .is_none()
        {
            let balance =
                AccountBalance::new(submission.account_id, self.economy_config.initial_grant);
            self.ledger.create_balance(&balance).await?;
        }

        let mut coins_credited = false;
        if breakdown.coins > 0 {
            let credit = self
                .ledger
                .credit(
                    submission.account_id,
                    CreditRequest {
                        amount: breakdown.coins,
                        kind: TransactionKind::EarnedExercise,
                        description: Some(format!(
                            "Exercise completed: {}",
                            submission.exercise_id
                        )),
                        reference: Some(TransactionRef::new(
                            submission.exercise_id.into_uuid(),
                            "exercise",
                        )),
                        multiplier: None,
                    },
                )
                .await;

            match credit {
                Ok(_) => coins_credited = true,
                Err(err) => {
                    // No coins moved; re-arm the latch so the claim can be
                    // retried without re-grading.
                    self.repo.release_reward_claim(submission_id).await?;
                    tracing::warn!(
                        submission_id = %submission_id,
                        error = %err,
                        "Reward claim released after ledger failure"
                    );
                    return Err(err.into());
                }
            }
        }

        if breakdown.xp > 0 {
            if let Err(err) = self.stats.add_xp(submission.account_id, breakdown.xp).await {
                if coins_credited {
                    // Coins already moved; releasing the latch would
                    // double-credit on retry. Operator reconciliation needed.
                    tracing::error!(
                        submission_id = %submission_id,
                        account_id = %submission.account_id,
                        coins = breakdown.coins,
                        xp = breakdown.xp,
                        error = %err,
                        "XP update failed after coins were credited"
                    );
                    return Err(ProgressError::Internal(format!(
                        "reward claim for {submission_id} partially applied"
                    )));
                }
                self.repo.release_reward_claim(submission_id).await?;
                return Err(err);
            }
        }

        self.repo
            .finish_reward_claim(submission_id, breakdown.xp, breakdown.coins)
            .await?;

        submission.rewards_claimed = true;
        submission.rewards_claimed_at = Some(Utc::now());
        submission.xp_awarded = Some(breakdown.xp);
        submission.coins_awarded = Some(breakdown.coins);

        tracing::info!(
            submission_id = %submission_id,
            account_id = %submission.account_id,
            xp = breakdown.xp,
            coins = breakdown.coins,
            perfect_bonus = breakdown.perfect_bonus,
            "Rewards claimed"
        );

        Ok(ClaimOutput {
            submission,
            xp_earned: breakdown.xp,
            coins_earned: breakdown.coins,
        })
    }
}
