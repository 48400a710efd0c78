//! Economy Router

use crate::application::config::EconomyConfig;
use crate::domain::repository::{InventoryRepository, LedgerRepository};
use crate::infra::postgres::PgEconomyRepository;
use crate::presentation::handlers::{self, EconomyAppState};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

/// Create the economy router with the PostgreSQL repository
pub fn economy_router(repo: PgEconomyRepository, config: EconomyConfig) -> Router {
    economy_router_generic(repo, config)
}

/// Create a generic economy router for any repository implementation
pub fn economy_router_generic<R>(repo: R, config: EconomyConfig) -> Router
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let state = EconomyAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    Router::new()
        .route("/balance/{account_id}", get(handlers::get_balance::<R>))
        .route(
            "/coins/{account_id}/stats",
            get(handlers::get_coin_stats::<R>),
        )
        .route(
            "/coins/{account_id}/period",
            get(handlers::period_totals::<R>),
        )
        .route(
            "/coins/{account_id}/summary/{date}",
            get(handlers::daily_summary::<R>),
        )
        .route(
            "/transactions/{account_id}",
            get(handlers::list_transactions::<R>),
        )
        .route("/audit/{account_id}", get(handlers::audit_balance::<R>))
        .route("/inventory/{account_id}", get(handlers::get_inventory::<R>))
        .route(
            "/inventory/{account_id}/stats",
            get(handlers::get_inventory_stats::<R>),
        )
        .route(
            "/inventory/{account_id}/history",
            get(handlers::inventory_history::<R>),
        )
        .route(
            "/powerups/purchase",
            post(handlers::purchase_power_up::<R>),
        )
        .route("/powerups/use", post(handlers::use_power_up::<R>))
        .with_state(state)
}
