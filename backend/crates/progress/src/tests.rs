//! Unit tests for the progress crate

#[cfg(test)]
mod rewards_tests {
    use crate::domain::rewards::{claim_breakdown, coins_earned, xp_earned};

    #[test]
    fn test_xp_full_without_hints() {
        assert_eq!(xp_earned(100, true, 0), 100);
    }

    #[test]
    fn test_xp_hint_penalty() {
        assert_eq!(xp_earned(100, true, 1), 90);
        assert_eq!(xp_earned(100, true, 2), 80);
        assert_eq!(xp_earned(100, true, 3), 70);
    }

    #[test]
    fn test_xp_penalty_caps_at_half() {
        assert_eq!(xp_earned(100, true, 5), 50);
        assert_eq!(xp_earned(100, true, 12), 50);
    }

    #[test]
    fn test_xp_zero_when_incorrect() {
        assert_eq!(xp_earned(100, false, 0), 0);
        assert_eq!(xp_earned(100, false, 3), 0);
    }

    #[test]
    fn test_coins_hint_penalty() {
        assert_eq!(coins_earned(50, true, 0), 50);
        assert_eq!(coins_earned(100, true, 1), 95);
        assert_eq!(coins_earned(100, true, 2), 90);
    }

    #[test]
    fn test_coins_penalty_caps_at_thirty_percent() {
        assert_eq!(coins_earned(100, true, 6), 70);
        assert_eq!(coins_earned(100, true, 20), 70);
    }

    #[test]
    fn test_coins_zero_when_incorrect() {
        assert_eq!(coins_earned(50, false, 0), 0);
    }

    #[test]
    fn test_claim_perfect_score_bonus() {
        let breakdown = claim_breakdown(100, 100, false, 0, 0);
        assert_eq!(breakdown.xp, 150); // floor(100) + 50
        assert_eq!(breakdown.coins, 20); // floor(100 / 10) + 10
        assert!(breakdown.perfect_bonus);
    }

    #[test]
    fn test_claim_no_bonus_when_hint_used() {
        let breakdown = claim_breakdown(100, 100, true, 2, 0);
        assert!(!breakdown.perfect_bonus);
        assert_eq!(breakdown.xp, 90); // 100 - 2 * 5
        assert_eq!(breakdown.coins, 10);
    }

    #[test]
    fn test_claim_scales_with_score_percentage() {
        let breakdown = claim_breakdown(85, 100, false, 0, 0);
        assert_eq!(breakdown.xp, 85);
        assert_eq!(breakdown.coins, 8);
        assert!(!breakdown.perfect_bonus);
    }

    #[test]
    fn test_claim_power_up_cost_reduces_coins() {
        let breakdown = claim_breakdown(80, 100, false, 0, 5);
        assert_eq!(breakdown.coins, 3); // floor(80 / 10) - 5
    }

    #[test]
    fn test_claim_floors_at_zero() {
        let breakdown = claim_breakdown(40, 100, true, 20, 50);
        assert_eq!(breakdown.xp, 0);
        assert_eq!(breakdown.coins, 0);
    }

    #[test]
    fn test_claim_zero_max_score_is_safe() {
        let breakdown = claim_breakdown(0, 0, false, 0, 0);
        assert_eq!(breakdown.xp, 0);
        assert_eq!(breakdown.coins, 0);
        assert!(!breakdown.perfect_bonus);
    }
}

#[cfg(test)]
mod answer_tests {
    use crate::domain::answer::{AnswerPayload, validate};
    use crate::domain::value_objects::ExerciseKind;
    use serde_json::json;

    #[test]
    fn test_crossword_accepts_clue_map() {
        let payload = json!({"clues": {"across_1": "river", "down_2": "mountain"}});
        let parsed = validate(ExerciseKind::Crossword, &payload).unwrap();
        match parsed {
            AnswerPayload::Clues(clues) => {
                assert_eq!(clues.len(), 2);
                assert_eq!(clues["across_1"], "river");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_crossword_rejects_missing_field() {
        let err = validate(ExerciseKind::Crossword, &json!({"answers": {}})).unwrap_err();
        assert_eq!(err.field, "clues");
        assert!(err.reason.contains("missing"));
    }

    #[test]
    fn test_crossword_rejects_empty_and_blank() {
        let err = validate(ExerciseKind::Crossword, &json!({"clues": {}})).unwrap_err();
        assert!(err.reason.contains("empty"));

        let err =
            validate(ExerciseKind::Crossword, &json!({"clues": {"a": "  "}})).unwrap_err();
        assert_eq!(err.field, "clues.a");
    }

    #[test]
    fn test_true_false_accepts_boolean_map() {
        let payload = json!({"statements": {"s1": true, "s2": false}});
        let parsed = validate(ExerciseKind::TrueFalse, &payload).unwrap();
        assert!(matches!(parsed, AnswerPayload::Statements(map) if map.len() == 2));
    }

    #[test]
    fn test_true_false_rejects_non_boolean() {
        let err =
            validate(ExerciseKind::TrueFalse, &json!({"statements": {"s1": "yes"}})).unwrap_err();
        assert_eq!(err.field, "statements.s1");
        assert!(err.reason.contains("boolean"));
    }

    #[test]
    fn test_matching_accepts_connection_pairs() {
        let payload = json!({"connections": [["cause_1", "effect_3"], ["cause_2", "effect_1"]]});
        let parsed = validate(ExerciseKind::Matching, &payload).unwrap();
        match parsed {
            AnswerPayload::Connections(pairs) => {
                assert_eq!(pairs[0], ("cause_1".to_string(), "effect_3".to_string()));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_matching_rejects_malformed_pairs() {
        let err =
            validate(ExerciseKind::Matching, &json!({"connections": [["only_one"]]})).unwrap_err();
        assert_eq!(err.field, "connections[0]");

        let err =
            validate(ExerciseKind::ConceptMap, &json!({"connections": [[1, 2]]})).unwrap_err();
        assert_eq!(err.field, "connections[0][0]");
    }

    #[test]
    fn test_timeline_accepts_order_list() {
        let payload = json!({"order": ["event_3", "event_1", "event_2"]});
        let parsed = validate(ExerciseKind::Timeline, &payload).unwrap();
        assert!(matches!(parsed, AnswerPayload::Sequence(order) if order.len() == 3));
    }

    #[test]
    fn test_word_search_accepts_word_list() {
        let payload = json!({"words": ["metaphor", "simile"]});
        let parsed = validate(ExerciseKind::WordSearch, &payload).unwrap();
        assert!(matches!(parsed, AnswerPayload::Words(words) if words.len() == 2));
    }

    #[test]
    fn test_question_driven_kinds_share_the_response_schema() {
        let payload = json!({"questions": {"q1": "the butler", "q2": "in the library"}});
        for kind in [
            ExerciseKind::TextDetective,
            ExerciseKind::InferenceWheel,
            ExerciseKind::ContextPuzzle,
            ExerciseKind::OpinionTribunal,
            ExerciseKind::PerspectiveMatrix,
            ExerciseKind::FillBlanks,
        ] {
            let parsed = validate(kind, &payload).unwrap();
            assert!(matches!(parsed, AnswerPayload::Responses(_)), "kind {kind}");
        }
    }

    #[test]
    fn test_essay_enforces_minimum_length() {
        let short = json!({"text": "too short"});
        let err = validate(ExerciseKind::ArgumentativeEssay, &short).unwrap_err();
        assert!(err.reason.contains("200"));

        let long = json!({"text": "a".repeat(200)});
        assert!(validate(ExerciseKind::ArgumentativeEssay, &long).is_ok());
    }

    #[test]
    fn test_debate_minimum_is_lower_than_essay() {
        let text = json!({"text": "b".repeat(100)});
        assert!(validate(ExerciseKind::DigitalDebate, &text).is_ok());
        assert!(validate(ExerciseKind::ArgumentativeEssay, &text).is_err());
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = validate(ExerciseKind::Crossword, &serde_json::json!("just a string"))
            .unwrap_err();
        assert!(err.reason.contains("object"));
    }
}

#[cfg(test)]
mod submission_tests {
    use crate::domain::entities::{AttemptContext, ExerciseSubmission, SubmissionStats};
    use crate::domain::oracle::GradedVerdict;
    use crate::domain::value_objects::SubmissionStatus;
    use crate::error::ProgressError;
    use kernel::id::{AccountId, ExerciseId};
    use serde_json::json;
    use uuid::Uuid;

    fn submission() -> ExerciseSubmission {
        ExerciseSubmission::new(
            AccountId::new(),
            ExerciseId::new(),
            json!({"clues": {"a": "x"}}),
            100,
            AttemptContext::default(),
        )
    }

    fn verdict(score: i64, is_correct: bool) -> GradedVerdict {
        GradedVerdict {
            score,
            max_score: 100,
            is_correct,
            feedback: String::new(),
            details: json!({}),
            audit_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_new_submission_starts_submitted() {
        let s = submission();
        assert_eq!(s.status, SubmissionStatus::Submitted);
        assert_eq!(s.attempt_number, 1);
        assert!(!s.rewards_claimed);
        assert!(s.graded_at.is_none());
    }

    #[test]
    fn test_resubmit_increments_attempt() {
        let mut s = submission();
        s.resubmit(json!({"clues": {"a": "y"}}), AttemptContext::default())
            .unwrap();
        assert_eq!(s.attempt_number, 2);
        assert_eq!(s.status, SubmissionStatus::Submitted);
        assert_eq!(s.answers["clues"]["a"], "y");
    }

    #[test]
    fn test_resubmit_rejected_after_grading() {
        let mut s = submission();
        s.record_grade(&verdict(80, true)).unwrap();
        let err = s
            .resubmit(json!({"clues": {"a": "z"}}), AttemptContext::default())
            .unwrap_err();
        assert!(matches!(err, ProgressError::AlreadyGraded));
        assert_eq!(s.answers["clues"]["a"], "x");
    }

    #[test]
    fn test_record_grade_sets_score_and_feedback() {
        let mut s = submission();
        s.record_grade(&verdict(80, true)).unwrap();
        assert_eq!(s.status, SubmissionStatus::Graded);
        assert_eq!(s.score, 80);
        assert!(s.is_correct);
        assert!(s.graded_at.is_some());
        assert_eq!(
            s.feedback.as_deref(),
            Some("Good job! Exercise completed successfully.")
        );
    }

    #[test]
    fn test_record_grade_perfect_feedback() {
        let mut s = submission();
        s.record_grade(&verdict(100, true)).unwrap();
        assert!(s.is_perfect());
        assert_eq!(s.feedback.as_deref(), Some("Perfect score! Excellent work!"));
    }

    #[test]
    fn test_record_grade_incorrect_feedback() {
        let mut s = submission();
        s.record_grade(&verdict(20, false)).unwrap();
        assert!(!s.is_correct);
        assert_eq!(
            s.feedback.as_deref(),
            Some("Keep practicing. Review the material and try again.")
        );
    }

    #[test]
    fn test_regrade_rejected_without_mutation() {
        let mut s = submission();
        s.record_grade(&verdict(80, true)).unwrap();
        let graded_at = s.graded_at;

        let err = s.record_grade(&verdict(10, false)).unwrap_err();
        assert!(matches!(err, ProgressError::AlreadyGraded));
        assert_eq!(s.score, 80);
        assert!(s.is_correct);
        assert_eq!(s.graded_at, graded_at);
        assert_eq!(s.status, SubmissionStatus::Graded);
    }

    #[test]
    fn test_no_perfect_when_hint_used() {
        let mut s = ExerciseSubmission::new(
            AccountId::new(),
            ExerciseId::new(),
            json!({"clues": {"a": "x"}}),
            100,
            AttemptContext {
                hint_used: true,
                hints_count: 1,
                ..Default::default()
            },
        );
        s.record_grade(&verdict(100, true)).unwrap();
        assert!(!s.is_perfect());
    }

    #[test]
    fn test_transition_matrix_enforced() {
        let mut s = submission();
        let err = s.transition(SubmissionStatus::Reviewed).unwrap_err();
        match err {
            ProgressError::InvalidStatusTransition { from, to } => {
                assert_eq!(from, SubmissionStatus::Submitted);
                assert_eq!(to, SubmissionStatus::Reviewed);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // submitted -> draft is the one allowed revert
        s.transition(SubmissionStatus::Draft).unwrap();
        assert_eq!(s.status, SubmissionStatus::Draft);
    }

    #[test]
    fn test_feedback_moves_graded_to_reviewed() {
        let mut s = submission();
        s.record_grade(&verdict(70, true)).unwrap();
        s.provide_feedback("Solid reasoning on question 2.".to_string())
            .unwrap();
        assert_eq!(s.status, SubmissionStatus::Reviewed);
        assert_eq!(s.feedback.as_deref(), Some("Solid reasoning on question 2."));
    }

    #[test]
    fn test_feedback_rejected_before_grading() {
        let mut s = submission();
        assert!(matches!(
            s.provide_feedback("too early".to_string()),
            Err(ProgressError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_stats_aggregation() {
        let mut graded = submission();
        graded.record_grade(&verdict(100, true)).unwrap();
        graded.xp_awarded = Some(150);
        graded.coins_awarded = Some(20);

        let mut graded_low = submission();
        graded_low.record_grade(&verdict(60, true)).unwrap();

        let pending = submission();

        let stats =
            SubmissionStats::from_submissions(&[graded, graded_low, pending]);
        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.graded_submissions, 2);
        assert_eq!(stats.completion_rate, 66.67);
        assert_eq!(stats.average_score, 80.0);
        assert_eq!(stats.perfect_scores_count, 1);
        assert_eq!(stats.total_xp_awarded, 150);
        assert_eq!(stats.total_coins_awarded, 20);
    }

    #[test]
    fn test_stats_empty() {
        let stats = SubmissionStats::from_submissions(&[]);
        assert_eq!(stats.total_submissions, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.average_score, 0.0);
    }
}

#[cfg(test)]
mod dto_tests {
    use crate::domain::entities::{AttemptContext, ExerciseSubmission};
    use crate::presentation::dto::*;
    use kernel::id::{AccountId, ExerciseId};
    use serde_json::json;

    #[test]
    fn test_submit_request_defaults() {
        let json = r#"{
            "accountId": "00000000-0000-0000-0000-000000000000",
            "exerciseId": "00000000-0000-0000-0000-000000000000",
            "answers": {"clues": {"a": "x"}}
        }"#;
        let request: SubmitRequest = serde_json::from_str(json).unwrap();
        assert!(!request.hint_used);
        assert_eq!(request.hints_count, 0);
        assert!(request.power_ups_used.is_empty());
        assert_eq!(request.coins_spent, 0);
    }

    #[test]
    fn test_submit_request_with_attempt_context() {
        let json = r#"{
            "accountId": "00000000-0000-0000-0000-000000000000",
            "exerciseId": "00000000-0000-0000-0000-000000000000",
            "answers": {"statements": {"s1": true}},
            "hintUsed": true,
            "hintsCount": 2,
            "powerUpsUsed": ["hints"],
            "coinsSpent": 15
        }"#;
        let request: SubmitRequest = serde_json::from_str(json).unwrap();
        assert!(request.hint_used);
        assert_eq!(request.hints_count, 2);
        assert_eq!(request.power_ups_used, vec!["hints"]);
        assert_eq!(request.coins_spent, 15);
    }

    #[test]
    fn test_processed_response_flattens_submission() {
        let submission = ExerciseSubmission::new(
            AccountId::new(),
            ExerciseId::new(),
            json!({"clues": {"a": "x"}}),
            100,
            AttemptContext::default(),
        );
        let response = ProcessedSubmissionResponse {
            submission: submission.into(),
            xp_earned: 150,
            coins_earned: 20,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["xpEarned"], 150);
        assert_eq!(json["coinsEarned"], 20);
        assert_eq!(json["status"], "submitted");
        assert!(json["maxScore"].is_i64());
    }

    #[test]
    fn test_update_status_request() {
        let request: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "reviewed"}"#).unwrap();
        assert_eq!(request.status, "reviewed");
    }
}

#[cfg(test)]
mod flow_tests {
    use crate::application::claim_rewards::ClaimRewardsUseCase;
    use crate::application::config::ProgressConfig;
    use crate::application::grade_submission::GradeSubmissionUseCase;
    use crate::application::submit_exercise::{SubmitExerciseUseCase, SubmitInput};
    use crate::domain::entities::{AttemptContext, Exercise, ExerciseSubmission};
    use crate::domain::oracle::{GradedVerdict, GradingOracle, LearnerStats};
    use crate::domain::repository::{ExerciseCatalog, SubmissionRepository};
    use crate::domain::value_objects::{ExerciseKind, SubmissionStatus};
    use crate::error::{ProgressError, ProgressResult};
    use economy::EconomyConfig;
    use economy::domain::entities::{AccountBalance, LedgerTransaction};
    use economy::domain::repository::{
        BalanceAudit, CreditRequest, DailySummary, DebitRequest, LedgerReceipt, LedgerRepository,
    };
    use economy::domain::value_objects::{Page, TransactionFilter, TransactionKind};
    use economy::error::{EconomyError, EconomyResult};
    use chrono::{DateTime, NaiveDate, Utc};
    use kernel::id::{AccountId, ExerciseId, SubmissionId};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    // ========================================================================
    // In-memory fakes
    // ========================================================================

    #[derive(Default, Clone)]
    struct MemoryProgress {
        submissions: Arc<Mutex<HashMap<SubmissionId, ExerciseSubmission>>>,
        exercises: Arc<Mutex<HashMap<ExerciseId, Exercise>>>,
        xp: Arc<Mutex<HashMap<AccountId, i64>>>,
    }

    impl MemoryProgress {
        fn add_exercise(&self, kind: ExerciseKind) -> ExerciseId {
            let exercise = Exercise {
                id: ExerciseId::new(),
                kind,
                max_score: 100,
                is_active: true,
            };
            let id = exercise.id;
            self.exercises.lock().unwrap().insert(id, exercise);
            id
        }

        fn submission_count(&self) -> usize {
            self.submissions.lock().unwrap().len()
        }

        fn xp_of(&self, account: AccountId) -> i64 {
            self.xp.lock().unwrap().get(&account).copied().unwrap_or(0)
        }
    }

    impl SubmissionRepository for MemoryProgress {
        async fn create(&self, submission: &ExerciseSubmission) -> ProgressResult<()> {
            self.submissions
                .lock()
                .unwrap()
                .insert(submission.id, submission.clone());
            Ok(())
        }

        async fn update(&self, submission: &ExerciseSubmission) -> ProgressResult<()> {
            self.submissions
                .lock()
                .unwrap()
                .insert(submission.id, submission.clone());
            Ok(())
        }

        async fn find(&self, id: SubmissionId) -> ProgressResult<Option<ExerciseSubmission>> {
            Ok(self.submissions.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_account_and_exercise(
            &self,
            account_id: AccountId,
            exercise_id: ExerciseId,
        ) -> ProgressResult<Option<ExerciseSubmission>> {
            Ok(self
                .submissions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.account_id == account_id && s.exercise_id == exercise_id)
                .max_by_key(|s| s.submitted_at)
                .cloned())
        }

        async fn list_by_account(
            &self,
            account_id: AccountId,
        ) -> ProgressResult<Vec<ExerciseSubmission>> {
            let mut rows: Vec<_> = self
                .submissions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.account_id == account_id)
                .cloned()
                .collect();
            rows.sort_by_key(|s| std::cmp::Reverse(s.submitted_at));
            Ok(rows)
        }

        async fn list_by_exercise(
            &self,
            exercise_id: ExerciseId,
        ) -> ProgressResult<Vec<ExerciseSubmission>> {
            let mut rows: Vec<_> = self
                .submissions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.exercise_id == exercise_id)
                .cloned()
                .collect();
            rows.sort_by_key(|s| std::cmp::Reverse(s.submitted_at));
            Ok(rows)
        }

        async fn list_pending_review(&self) -> ProgressResult<Vec<ExerciseSubmission>> {
            let mut rows: Vec<_> = self
                .submissions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.status == SubmissionStatus::Submitted)
                .cloned()
                .collect();
            rows.sort_by_key(|s| s.submitted_at);
            Ok(rows)
        }

        async fn acquire_reward_claim(&self, id: SubmissionId) -> ProgressResult<bool> {
            let mut submissions = self.submissions.lock().unwrap();
            let Some(submission) = submissions.get_mut(&id) else {
                return Ok(false);
            };
            if submission.status == SubmissionStatus::Graded && !submission.rewards_claimed {
                submission.rewards_claimed = true;
                submission.rewards_claimed_at = Some(Utc::now());
                Ok(true)
            } else {
                Ok(false)
            }
        }

        async fn finish_reward_claim(
            &self,
            id: SubmissionId,
            xp: i64,
            coins: i64,
        ) -> ProgressResult<()> {
            let mut submissions = self.submissions.lock().unwrap();
            if let Some(submission) = submissions.get_mut(&id) {
                submission.xp_awarded = Some(xp);
                submission.coins_awarded = Some(coins);
            }
            Ok(())
        }

        async fn release_reward_claim(&self, id: SubmissionId) -> ProgressResult<()> {
            let mut submissions = self.submissions.lock().unwrap();
            if let Some(submission) = submissions.get_mut(&id) {
                submission.rewards_claimed = false;
                submission.rewards_claimed_at = None;
            }
            Ok(())
        }
    }

    impl ExerciseCatalog for MemoryProgress {
        async fn find_exercise(&self, id: ExerciseId) -> ProgressResult<Option<Exercise>> {
            Ok(self.exercises.lock().unwrap().get(&id).cloned())
        }
    }

    impl LearnerStats for MemoryProgress {
        async fn add_xp(&self, account_id: AccountId, amount: i64) -> ProgressResult<()> {
            *self.xp.lock().unwrap().entry(account_id).or_insert(0) += amount;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryLedger {
        balances: Mutex<HashMap<AccountId, AccountBalance>>,
        journal: Mutex<Vec<LedgerTransaction>>,
        fail_credits: AtomicBool,
        credit_calls: AtomicUsize,
    }

    impl MemoryLedger {
        fn balance_of(&self, account: AccountId) -> Option<i64> {
            self.balances.lock().unwrap().get(&account).map(|b| b.coins)
        }

        fn credits(&self) -> usize {
            self.journal
                .lock()
                .unwrap()
                .iter()
                .filter(|tx| tx.amount > 0)
                .count()
        }
    }

    impl LedgerRepository for MemoryLedger {
        async fn find_balance(
            &self,
            account_id: AccountId,
        ) -> EconomyResult<Option<AccountBalance>> {
            Ok(self.balances.lock().unwrap().get(&account_id).cloned())
        }

        async fn create_balance(&self, balance: &AccountBalance) -> EconomyResult<()> {
            self.balances
                .lock()
                .unwrap()
                .entry(balance.account_id)
                .or_insert_with(|| balance.clone());
            Ok(())
        }

        async fn credit(
            &self,
            account_id: AccountId,
            request: CreditRequest,
        ) -> EconomyResult<LedgerReceipt> {
            self.credit_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_credits.load(Ordering::SeqCst) {
                return Err(EconomyError::Internal("simulated ledger outage".into()));
            }
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&account_id)
                .ok_or(EconomyError::AccountNotFound)?;
            let transaction = balance.credit(
                request.amount,
                request.kind,
                request.description,
                request.reference,
                request.multiplier,
            )?;
            self.journal.lock().unwrap().push(transaction.clone());
            Ok(LedgerReceipt {
                balance: balance.coins,
                transaction,
            })
        }

        async fn debit(
            &self,
            account_id: AccountId,
            request: DebitRequest,
        ) -> EconomyResult<LedgerReceipt> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&account_id)
                .ok_or(EconomyError::AccountNotFound)?;
            let transaction = balance.debit(
                request.amount,
                request.kind,
                request.description,
                request.reference,
            )?;
            self.journal.lock().unwrap().push(transaction.clone());
            Ok(LedgerReceipt {
                balance: balance.coins,
                transaction,
            })
        }

        async fn transactions(
            &self,
            account_id: AccountId,
            _filter: &TransactionFilter,
            _page: Page,
        ) -> EconomyResult<Vec<LedgerTransaction>> {
            let mut rows: Vec<_> = self
                .journal
                .lock()
                .unwrap()
                .iter()
                .filter(|tx| tx.account_id == account_id)
                .cloned()
                .collect();
            rows.reverse();
            Ok(rows)
        }

        async fn audit(
            &self,
            account_id: AccountId,
            initial_grant: i64,
        ) -> EconomyResult<BalanceAudit> {
            let actual = self
                .balances
                .lock()
                .unwrap()
                .get(&account_id)
                .ok_or(EconomyError::AccountNotFound)?
                .coins;
            let sum: i64 = self
                .journal
                .lock()
                .unwrap()
                .iter()
                .filter(|tx| tx.account_id == account_id)
                .map(|tx| tx.amount)
                .sum();
            let calculated = initial_grant + sum;
            Ok(BalanceAudit {
                calculated_balance: calculated,
                actual_balance: actual,
                difference: actual - calculated,
                is_valid: actual == calculated,
            })
        }

        async fn earned_in_period(
            &self,
            _account_id: AccountId,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> EconomyResult<i64> {
            Ok(0)
        }

        async fn spent_in_period(
            &self,
            _account_id: AccountId,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> EconomyResult<i64> {
            Ok(0)
        }

        async fn daily_summary(
            &self,
            _account_id: AccountId,
            date: NaiveDate,
        ) -> EconomyResult<DailySummary> {
            Ok(DailySummary {
                date,
                total_earned: 0,
                total_spent: 0,
                net_change: 0,
                transaction_count: 0,
            })
        }
    }

    struct MockOracle {
        fail: AtomicBool,
        score: AtomicI64,
        correct: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockOracle {
        fn scoring(score: i64, correct: bool) -> Self {
            Self {
                fail: AtomicBool::new(false),
                score: AtomicI64::new(score),
                correct: AtomicBool::new(correct),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GradingOracle for MockOracle {
        async fn validate_and_grade(
            &self,
            _exercise_id: ExerciseId,
            _account_id: AccountId,
            _submitted_answer: &Value,
            _attempt_number: i32,
            _client_metadata: &Value,
        ) -> ProgressResult<GradedVerdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProgressError::GradingUnavailable);
            }
            Ok(GradedVerdict {
                score: self.score.load(Ordering::SeqCst),
                max_score: 100,
                is_correct: self.correct.load(Ordering::SeqCst),
                feedback: String::new(),
                details: json!({}),
                audit_id: Uuid::new_v4(),
            })
        }
    }

    // ========================================================================
    // Harness
    // ========================================================================

    struct Harness {
        repo: Arc<MemoryProgress>,
        ledger: Arc<MemoryLedger>,
        oracle: Arc<MockOracle>,
        economy_config: Arc<EconomyConfig>,
        config: Arc<ProgressConfig>,
    }

    impl Harness {
        fn new(oracle: MockOracle) -> Self {
            Self {
                repo: Arc::new(MemoryProgress::default()),
                ledger: Arc::new(MemoryLedger::default()),
                oracle: Arc::new(oracle),
                economy_config: Arc::new(EconomyConfig::default()),
                config: Arc::new(ProgressConfig::default()),
            }
        }

        fn submit_use_case(
            &self,
        ) -> SubmitExerciseUseCase<MemoryProgress, MemoryProgress, MockOracle, MemoryLedger, MemoryProgress>
        {
            SubmitExerciseUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.oracle.clone(),
                self.ledger.clone(),
                self.repo.clone(),
                self.config.clone(),
                self.economy_config.clone(),
            )
        }

        fn claim_use_case(
            &self,
        ) -> ClaimRewardsUseCase<MemoryProgress, MemoryLedger, MemoryProgress> {
            ClaimRewardsUseCase::new(
                self.repo.clone(),
                self.ledger.clone(),
                self.repo.clone(),
                self.economy_config.clone(),
            )
        }

        fn submit_input(&self, exercise_id: ExerciseId, account_id: AccountId) -> SubmitInput {
            SubmitInput {
                account_id,
                exercise_id,
                answers: json!({"clues": {"a": "river"}}),
                context: AttemptContext::default(),
                client_metadata: json!({}),
            }
        }
    }

    // ========================================================================
    // Tests
    // ========================================================================

    #[tokio::test]
    async fn test_submit_grades_and_auto_claims() {
        let harness = Harness::new(MockOracle::scoring(100, true));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let output = harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap();

        // Perfect score, no hints: 150 XP and 20 coins
        assert_eq!(output.xp_earned, 150);
        assert_eq!(output.coins_earned, 20);
        assert_eq!(output.submission.status, SubmissionStatus::Graded);
        assert!(output.submission.rewards_claimed);
        assert_eq!(output.submission.xp_awarded, Some(150));

        // One ledger credit on a lazily provisioned balance (100 + 20)
        assert_eq!(harness.ledger.credits(), 1);
        assert_eq!(harness.ledger.balance_of(account), Some(120));
        assert_eq!(harness.repo.xp_of(account), 150);

        // The journal row references the exercise
        let journal = harness.ledger.journal.lock().unwrap();
        let tx = &journal[0];
        assert_eq!(tx.kind, TransactionKind::EarnedExercise);
        assert_eq!(tx.reference.as_ref().unwrap().id, exercise.into_uuid());
    }

    #[tokio::test]
    async fn test_invalid_answer_shape_persists_nothing() {
        let harness = Harness::new(MockOracle::scoring(100, true));
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let mut input = harness.submit_input(exercise, AccountId::new());
        input.answers = json!({"statements": {"s1": true}}); // wrong shape for a crossword

        let err = harness.submit_use_case().execute(input).await.unwrap_err();
        assert!(matches!(err, ProgressError::InvalidAnswer(_)));
        assert_eq!(harness.repo.submission_count(), 0);
        assert_eq!(harness.oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resubmission_after_grading_is_rejected() {
        let harness = Harness::new(MockOracle::scoring(90, true));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap();

        let err = harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::AlreadyGraded));
        assert_eq!(harness.repo.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_claim_twice_never_double_credits() {
        let harness = Harness::new(MockOracle::scoring(100, true));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let output = harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap();

        let err = harness
            .claim_use_case()
            .execute(output.submission.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::RewardsAlreadyClaimed));

        assert_eq!(harness.ledger.credits(), 1);
        assert_eq!(harness.ledger.balance_of(account), Some(120));
        assert_eq!(harness.repo.xp_of(account), 150);
    }

    #[tokio::test]
    async fn test_regrade_rejected() {
        let harness = Harness::new(MockOracle::scoring(80, true));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::TrueFalse);

        let mut input = harness.submit_input(exercise, account);
        input.answers = json!({"statements": {"s1": true}});
        let output = harness.submit_use_case().execute(input).await.unwrap();

        let err = GradeSubmissionUseCase::new(harness.repo.clone(), harness.oracle.clone())
            .execute(output.submission.id, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::AlreadyGraded));

        let stored = harness.repo.find(output.submission.id).await.unwrap().unwrap();
        assert_eq!(stored.score, 80);
    }

    #[tokio::test]
    async fn test_oracle_failure_leaves_submission_retryable() {
        let oracle = MockOracle::scoring(100, true);
        oracle.fail.store(true, Ordering::SeqCst);
        let harness = Harness::new(oracle);
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let err = harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::GradingUnavailable));

        // No partial grade: the row persisted as submitted, no rewards moved
        let stored = harness
            .repo
            .find_by_account_and_exercise(account, exercise)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert!(stored.graded_at.is_none());
        assert_eq!(harness.ledger.credits(), 0);

        // Retrying the grade alone completes the flow
        harness.oracle.fail.store(false, Ordering::SeqCst);
        let graded = GradeSubmissionUseCase::new(harness.repo.clone(), harness.oracle.clone())
            .execute(stored.id, json!({}))
            .await
            .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);
    }

    #[tokio::test]
    async fn test_incorrect_submission_yields_zero_rewards() {
        let harness = Harness::new(MockOracle::scoring(20, false));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let output = harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap();

        assert_eq!(output.xp_earned, 0);
        assert_eq!(output.coins_earned, 0);
        assert_eq!(output.submission.status, SubmissionStatus::Graded);
        assert!(!output.submission.rewards_claimed);
        assert_eq!(harness.ledger.credits(), 0);
        assert_eq!(harness.repo.xp_of(account), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_releases_claim_for_retry() {
        let harness = Harness::new(MockOracle::scoring(100, true));
        harness.ledger.fail_credits.store(true, Ordering::SeqCst);
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let err = harness
            .submit_use_case()
            .execute(harness.submit_input(exercise, account))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::Economy(_)));

        // Graded but unclaimed, latch re-armed
        let stored = harness
            .repo
            .find_by_account_and_exercise(account, exercise)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Graded);
        assert!(!stored.rewards_claimed);
        assert_eq!(harness.repo.xp_of(account), 0);

        // Claim alone is retryable once the ledger recovers
        harness.ledger.fail_credits.store(false, Ordering::SeqCst);
        let claim = harness.claim_use_case().execute(stored.id).await.unwrap();
        assert_eq!(claim.xp_earned, 150);
        assert_eq!(claim.coins_earned, 20);
        assert_eq!(harness.ledger.credits(), 1);
        assert_eq!(harness.repo.xp_of(account), 150);
    }

    #[tokio::test]
    async fn test_claim_requires_graded_status() {
        let harness = Harness::new(MockOracle::scoring(100, true));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        // Persist a submitted-but-ungraded row directly
        let submission = ExerciseSubmission::new(
            account,
            exercise,
            json!({"clues": {"a": "x"}}),
            100,
            AttemptContext::default(),
        );
        harness.repo.create(&submission).await.unwrap();

        let err = harness.claim_use_case().execute(submission.id).await.unwrap_err();
        assert!(matches!(err, ProgressError::NotGraded));
    }

    #[tokio::test]
    async fn test_hinted_submission_reward_penalties() {
        let harness = Harness::new(MockOracle::scoring(100, true));
        let account = AccountId::new();
        let exercise = harness.repo.add_exercise(ExerciseKind::Crossword);

        let mut input = harness.submit_input(exercise, account);
        input.context = AttemptContext {
            hint_used: true,
            hints_count: 3,
            power_ups_used: vec![],
            coins_spent: 4,
        };

        let output = harness.submit_use_case().execute(input).await.unwrap();

        // No perfect bonus; 100 - 15 flat hint penalty; 10 - 4 coins spent
        assert_eq!(output.xp_earned, 85);
        assert_eq!(output.coins_earned, 6);
        assert_eq!(harness.ledger.balance_of(account), Some(106));
    }
}
