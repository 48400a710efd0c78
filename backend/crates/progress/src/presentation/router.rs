//! Progress Router

use axum::{
    Router,
    routing::{get, patch, post},
};
use economy::EconomyConfig;
use economy::PgEconomyRepository;
use economy::domain::repository::LedgerRepository;
use std::sync::Arc;

use crate::application::config::ProgressConfig;
use crate::domain::oracle::{GradingOracle, LearnerStats};
use crate::domain::repository::{ExerciseCatalog, SubmissionRepository};
use crate::infra::oracle::HttpGradingOracle;
use crate::infra::postgres::PgProgressRepository;
use crate::presentation::handlers::{self, ProgressAppState};

/// Create the progress router with the PostgreSQL repositories and the HTTP
/// grading-oracle client
pub fn progress_router(
    repo: PgProgressRepository,
    oracle: HttpGradingOracle,
    ledger: PgEconomyRepository,
    config: ProgressConfig,
    economy_config: EconomyConfig,
) -> Router {
    progress_router_generic(repo, oracle, ledger, config, economy_config)
}

/// Create a generic progress router for any implementation set
pub fn progress_router_generic<R, O, L>(
    repo: R,
    oracle: O,
    ledger: L,
    config: ProgressConfig,
    economy_config: EconomyConfig,
) -> Router
where
    R: SubmissionRepository + ExerciseCatalog + LearnerStats + Clone + Send + Sync + 'static,
    O: GradingOracle + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
{
    let state = ProgressAppState {
        repo: Arc::new(repo),
        oracle: Arc::new(oracle),
        ledger: Arc::new(ledger),
        config: Arc::new(config),
        economy_config: Arc::new(economy_config),
    };

    Router::new()
        .route(
            "/submissions/submit",
            post(handlers::submit_exercise::<R, O, L>),
        )
        .route(
            "/submissions/pending-review",
            get(handlers::pending_review::<R, O, L>),
        )
        .route(
            "/submissions/{id}/grade",
            post(handlers::grade_submission::<R, O, L>),
        )
        .route(
            "/submissions/{id}/claim-rewards",
            post(handlers::claim_rewards::<R, O, L>),
        )
        .route(
            "/submissions/{id}/feedback",
            post(handlers::provide_feedback::<R, O, L>),
        )
        .route(
            "/submissions/{id}/status",
            patch(handlers::update_status::<R, O, L>),
        )
        .route("/submissions/{id}", get(handlers::get_submission::<R, O, L>))
        .route(
            "/submissions/user/{account_id}",
            get(handlers::list_by_account::<R, O, L>),
        )
        .route(
            "/submissions/user/{account_id}/stats",
            get(handlers::account_stats::<R, O, L>),
        )
        .route(
            "/submissions/exercise/{exercise_id}",
            get(handlers::list_by_exercise::<R, O, L>),
        )
        .with_state(state)
}
