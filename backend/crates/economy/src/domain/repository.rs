//! Repository Traits
//!
//! Interfaces for the ledger and inventory stores. Implementations live in
//! the infrastructure layer and must make every credit/debit/purchase/use a
//! single atomic unit: balance update and journal append commit together or
//! not at all, serialized per account.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::AccountId;

use crate::domain::entities::{
    AccountBalance, InventoryTransaction, LedgerTransaction, PowerUpInventory,
};
use crate::domain::value_objects::{Page, TransactionFilter, TransactionKind, TransactionRef};
use crate::error::EconomyResult;

/// Parameters for a ledger credit
#[derive(Debug, Clone)]
pub struct CreditRequest {
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub reference: Option<TransactionRef>,
    pub multiplier: Option<f64>,
}

/// Parameters for a ledger debit
#[derive(Debug, Clone)]
pub struct DebitRequest {
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub reference: Option<TransactionRef>,
}

/// Result of a committed credit or debit
#[derive(Debug, Clone)]
pub struct LedgerReceipt {
    pub balance: i64,
    pub transaction: LedgerTransaction,
}

/// Result of reconciling the cached balance against the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAudit {
    pub calculated_balance: i64,
    pub actual_balance: i64,
    pub difference: i64,
    pub is_valid: bool,
}

/// One day of journal activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_earned: i64,
    pub total_spent: i64,
    pub net_change: i64,
    pub transaction_count: i64,
}

/// Ledger repository trait - sole owner of balances and the coin journal
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Load a balance record; `None` if the account was never provisioned
    async fn find_balance(&self, account_id: AccountId) -> EconomyResult<Option<AccountBalance>>;

    /// Persist a freshly provisioned balance record
    async fn create_balance(&self, balance: &AccountBalance) -> EconomyResult<()>;

    /// Atomically credit the account and append the journal row
    async fn credit(
        &self,
        account_id: AccountId,
        request: CreditRequest,
    ) -> EconomyResult<LedgerReceipt>;

    /// Atomically debit the account and append the journal row
    async fn debit(
        &self,
        account_id: AccountId,
        request: DebitRequest,
    ) -> EconomyResult<LedgerReceipt>;

    /// List journal rows, newest first
    async fn transactions(
        &self,
        account_id: AccountId,
        filter: &TransactionFilter,
        page: Page,
    ) -> EconomyResult<Vec<LedgerTransaction>>;

    /// Recompute the balance from the full journal plus the initial grant
    /// and compare it against the stored balance
    async fn audit(&self, account_id: AccountId, initial_grant: i64)
    -> EconomyResult<BalanceAudit>;

    /// Sum of positive amounts within a period
    async fn earned_in_period(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EconomyResult<i64>;

    /// Sum of absolute negative amounts within a period
    async fn spent_in_period(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EconomyResult<i64>;

    /// Aggregate one calendar day of journal activity
    async fn daily_summary(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> EconomyResult<DailySummary>;
}

/// Inventory repository trait - sole owner of power-up stock and its journal
#[trait_variant::make(InventoryRepository: Send)]
pub trait LocalInventoryRepository {
    /// Load an inventory record; `None` if the account was never provisioned
    async fn find_inventory(
        &self,
        account_id: AccountId,
    ) -> EconomyResult<Option<PowerUpInventory>>;

    /// Persist a freshly provisioned inventory record
    async fn create_inventory(&self, inventory: &PowerUpInventory) -> EconomyResult<()>;

    /// Atomically persist updated counters together with the audit row
    async fn save_inventory(
        &self,
        inventory: &PowerUpInventory,
        entry: &InventoryTransaction,
    ) -> EconomyResult<()>;

    /// List audit rows, newest first
    async fn inventory_entries(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> EconomyResult<Vec<InventoryTransaction>>;
}
