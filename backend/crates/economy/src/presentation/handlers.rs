//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use kernel::id::AccountId;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::config::EconomyConfig;
use crate::application::purchase_power_up::{PurchaseInput, PurchasePowerUpUseCase};
use crate::application::use_power_up::{UsePowerUpInput, UsePowerUpUseCase};
use crate::domain::entities::PowerUpInventory;
use crate::domain::repository::{InventoryRepository, LedgerRepository};
use crate::domain::value_objects::{Page, PowerUpKind, TransactionFilter, TransactionKind};
use crate::error::{EconomyError, EconomyResult};
use crate::presentation::dto::{
    AuditResponse, BalanceResponse, CoinStatsResponse, DailySummaryResponse,
    InventoryEntryResponse, InventoryResponse, InventoryStatsResponse, PeriodQuery,
    PeriodTotalsResponse, PurchaseRequest, PurchaseResponse, TransactionListQuery,
    TransactionResponse, UseRequest,
};

/// Shared state for economy handlers
#[derive(Clone)]
pub struct EconomyAppState<R>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<EconomyConfig>,
}

fn parse_power_up(tag: &str) -> EconomyResult<PowerUpKind> {
    PowerUpKind::from_code(tag).ok_or_else(|| EconomyError::UnknownPowerUpKind(tag.to_string()))
}

/// GET /api/economy/balance/{account_id}
pub async fn get_balance<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
) -> EconomyResult<Json<BalanceResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let balance = state
        .repo
        .find_balance(AccountId::from_uuid(account_id))
        .await?
        .ok_or(EconomyError::AccountNotFound)?;

    Ok(Json(BalanceResponse {
        account_id,
        balance: balance.coins,
    }))
}

/// GET /api/economy/coins/{account_id}/stats
pub async fn get_coin_stats<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
) -> EconomyResult<Json<CoinStatsResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let balance = state
        .repo
        .find_balance(AccountId::from_uuid(account_id))
        .await?
        .ok_or(EconomyError::AccountNotFound)?;

    Ok(Json(balance.coin_stats().into()))
}

/// GET /api/economy/transactions/{account_id}
pub async fn list_transactions<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<TransactionListQuery>,
) -> EconomyResult<Json<Vec<TransactionResponse>>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let kind = match &query.kind {
        Some(tag) => Some(
            TransactionKind::from_code(tag)
                .ok_or_else(|| EconomyError::UnknownTransactionKind(tag.clone()))?,
        ),
        None => None,
    };

    let filter = TransactionFilter {
        kind,
        from: query.from,
        to: query.to,
        reference_id: query.reference_id,
    };
    let page = Page::new(
        query.limit.unwrap_or(Page::default().limit),
        query.offset.unwrap_or(0),
    );

    let transactions = state
        .repo
        .transactions(AccountId::from_uuid(account_id), &filter, page)
        .await?;

    Ok(Json(
        transactions.into_iter().map(TransactionResponse::from).collect(),
    ))
}

/// GET /api/economy/coins/{account_id}/period
pub async fn period_totals<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> EconomyResult<Json<PeriodTotalsResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let account_id = AccountId::from_uuid(account_id);
    let total_earned = state
        .repo
        .earned_in_period(account_id, query.from, query.to)
        .await?;
    let total_spent = state
        .repo
        .spent_in_period(account_id, query.from, query.to)
        .await?;

    Ok(Json(PeriodTotalsResponse {
        total_earned,
        total_spent,
    }))
}

/// GET /api/economy/coins/{account_id}/summary/{date}
pub async fn daily_summary<R>(
    State(state): State<EconomyAppState<R>>,
    Path((account_id, date)): Path<(Uuid, NaiveDate)>,
) -> EconomyResult<Json<DailySummaryResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let summary = state
        .repo
        .daily_summary(AccountId::from_uuid(account_id), date)
        .await?;

    Ok(Json(DailySummaryResponse {
        date: summary.date,
        total_earned: summary.total_earned,
        total_spent: summary.total_spent,
        net_change: summary.net_change,
        transaction_count: summary.transaction_count,
    }))
}

/// GET /api/economy/audit/{account_id}
pub async fn audit_balance<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
) -> EconomyResult<Json<AuditResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let audit = state
        .repo
        .audit(AccountId::from_uuid(account_id), state.config.initial_grant)
        .await?;

    Ok(Json(AuditResponse {
        calculated_balance: audit.calculated_balance,
        actual_balance: audit.actual_balance,
        difference: audit.difference,
        is_valid: audit.is_valid,
    }))
}

/// GET /api/economy/inventory/{account_id}
///
/// Unprovisioned accounts read as an empty default inventory; rows are only
/// written by the purchase/use flows.
pub async fn get_inventory<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
) -> EconomyResult<Json<InventoryResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let account_id = AccountId::from_uuid(account_id);
    let inventory = state
        .repo
        .find_inventory(account_id)
        .await?
        .unwrap_or_else(|| PowerUpInventory::new(account_id));

    Ok(Json(InventoryResponse::from(&inventory)))
}

/// GET /api/economy/inventory/{account_id}/stats
pub async fn get_inventory_stats<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
) -> EconomyResult<Json<InventoryStatsResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let account_id = AccountId::from_uuid(account_id);
    let inventory = state
        .repo
        .find_inventory(account_id)
        .await?
        .unwrap_or_else(|| PowerUpInventory::new(account_id));

    Ok(Json(inventory.stats().into()))
}

/// GET /api/economy/inventory/{account_id}/history
pub async fn inventory_history<R>(
    State(state): State<EconomyAppState<R>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<TransactionListQuery>,
) -> EconomyResult<Json<Vec<InventoryEntryResponse>>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let page = Page::new(
        query.limit.unwrap_or(Page::default().limit),
        query.offset.unwrap_or(0),
    );
    let entries = state
        .repo
        .inventory_entries(AccountId::from_uuid(account_id), page)
        .await?;

    Ok(Json(
        entries.into_iter().map(InventoryEntryResponse::from).collect(),
    ))
}

/// POST /api/economy/powerups/purchase
pub async fn purchase_power_up<R>(
    State(state): State<EconomyAppState<R>>,
    Json(req): Json<PurchaseRequest>,
) -> EconomyResult<Json<PurchaseResponse>>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let power_up = parse_power_up(&req.power_up)?;

    let use_case =
        PurchasePowerUpUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(PurchaseInput {
            account_id: AccountId::from_uuid(req.account_id),
            power_up,
            quantity: req.quantity,
        })
        .await?;

    Ok(Json(PurchaseResponse {
        total_cost: output.total_cost,
        balance: output.balance,
        inventory: InventoryResponse::from(&output.inventory),
    }))
}

/// POST /api/economy/powerups/use
pub async fn use_power_up<R>(
    State(state): State<EconomyAppState<R>>,
    Json(req): Json<UseRequest>,
) -> EconomyResult<impl IntoResponse>
where
    R: LedgerRepository + InventoryRepository + Clone + Send + Sync + 'static,
{
    let power_up = parse_power_up(&req.power_up)?;

    let use_case = UsePowerUpUseCase::new(state.repo.clone());

    use_case
        .execute(UsePowerUpInput {
            account_id: AccountId::from_uuid(req.account_id),
            power_up,
            exercise_id: req.exercise_id,
            context: req.context,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
