//! PostgreSQL Repository Implementations
//!
//! Every credit/debit/purchase/use runs inside one SQL transaction with a
//! `FOR UPDATE` row lock on the account's record, so concurrent mutations of
//! the same account serialize and the journal invariant survives parallel
//! requests. Different accounts never contend.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use kernel::id::{AccountId, InventoryEntryId, TransactionId};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::entities::{
    AccountBalance, InventoryTransaction, LedgerTransaction, PowerUpInventory, PowerUpStock,
};
use crate::domain::repository::{
    BalanceAudit, CreditRequest, DailySummary, DebitRequest, InventoryRepository, LedgerReceipt,
    LedgerRepository,
};
use crate::domain::value_objects::{
    InventoryEntryKind, Page, PowerUpKind, TransactionFilter, TransactionKind, TransactionRef,
};
use crate::error::{EconomyError, EconomyResult};

/// PostgreSQL-backed economy repository
#[derive(Clone)]
pub struct PgEconomyRepository {
    pool: PgPool,
}

impl PgEconomyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock and load a balance row inside an open transaction
    async fn lock_balance(
        tx: &mut Transaction<'_, Postgres>,
        account_id: AccountId,
    ) -> EconomyResult<AccountBalance> {
        let row = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT
                account_id,
                coins,
                earned_total,
                spent_total,
                earned_today,
                last_daily_reset,
                created_at,
                updated_at
            FROM account_balances
            WHERE account_id = $1
            FOR UPDATE
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(BalanceRow::into_balance)
            .ok_or(EconomyError::AccountNotFound)
    }

    async fn store_balance(
        tx: &mut Transaction<'_, Postgres>,
        balance: &AccountBalance,
    ) -> EconomyResult<()> {
        sqlx::query(
            r#"
            UPDATE account_balances SET
                coins = $2,
                earned_total = $3,
                spent_total = $4,
                earned_today = $5,
                last_daily_reset = $6,
                updated_at = $7
            WHERE account_id = $1
            "#,
        )
        .bind(balance.account_id.as_uuid())
        .bind(balance.coins)
        .bind(balance.earned_total)
        .bind(balance.spent_total)
        .bind(balance.earned_today)
        .bind(balance.last_daily_reset)
        .bind(balance.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn append_transaction(
        tx: &mut Transaction<'_, Postgres>,
        transaction: &LedgerTransaction,
    ) -> EconomyResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coin_transactions (
                transaction_id,
                account_id,
                amount,
                balance_before,
                balance_after,
                kind,
                description,
                reference_id,
                reference_type,
                multiplier,
                metadata,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.account_id.as_uuid())
        .bind(transaction.amount)
        .bind(transaction.balance_before)
        .bind(transaction.balance_after)
        .bind(transaction.kind.code())
        .bind(&transaction.description)
        .bind(transaction.reference.as_ref().map(|r| r.id))
        .bind(transaction.reference.as_ref().map(|r| r.kind.clone()))
        .bind(transaction.multiplier)
        .bind(&transaction.metadata)
        .bind(transaction.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

impl LedgerRepository for PgEconomyRepository {
    async fn find_balance(&self, account_id: AccountId) -> EconomyResult<Option<AccountBalance>> {
        let row = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT
                account_id,
                coins,
                earned_total,
                spent_total,
                earned_today,
                last_daily_reset,
                created_at,
                updated_at
            FROM account_balances
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BalanceRow::into_balance))
    }

    async fn create_balance(&self, balance: &AccountBalance) -> EconomyResult<()> {
        sqlx::query(
            r#"
            INSERT INTO account_balances (
                account_id,
                coins,
                earned_total,
                spent_total,
                earned_today,
                last_daily_reset,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (account_id) DO NOTHING
            "#,
        )
        .bind(balance.account_id.as_uuid())
        .bind(balance.coins)
        .bind(balance.earned_total)
        .bind(balance.spent_total)
        .bind(balance.earned_today)
        .bind(balance.last_daily_reset)
        .bind(balance.created_at)
        .bind(balance.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(account_id = %balance.account_id, "Balance record created");

        Ok(())
    }

    async fn credit(
        &self,
        account_id: AccountId,
        request: CreditRequest,
    ) -> EconomyResult<LedgerReceipt> {
        if request.amount <= 0 {
            return Err(EconomyError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await?;

        let mut balance = Self::lock_balance(&mut tx, account_id).await?;
        let transaction = balance.credit(
            request.amount,
            request.kind,
            request.description,
            request.reference,
            request.multiplier,
        )?;

        Self::store_balance(&mut tx, &balance).await?;
        Self::append_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        tracing::info!(
            account_id = %account_id,
            amount = transaction.amount,
            kind = %transaction.kind,
            balance = balance.coins,
            "Ledger credit committed"
        );

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
        if request.amount <= 0 {
            return Err(EconomyError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await?;

        let mut balance = Self::lock_balance(&mut tx, account_id).await?;
        let transaction = balance.debit(
            request.amount,
            request.kind,
            request.description,
            request.reference,
        )?;

        Self::store_balance(&mut tx, &balance).await?;
        Self::append_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        tracing::info!(
            account_id = %account_id,
            amount = transaction.amount,
            kind = %transaction.kind,
            balance = balance.coins,
            "Ledger debit committed"
        );

        Ok(LedgerReceipt {
            balance: balance.coins,
            transaction,
        })
    }

    async fn transactions(
        &self,
        account_id: AccountId,
        filter: &TransactionFilter,
        page: Page,
    ) -> EconomyResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                transaction_id,
                account_id,
                amount,
                balance_before,
                balance_after,
                kind,
                description,
                reference_id,
                reference_type,
                multiplier,
                metadata,
                created_at
            FROM coin_transactions
            WHERE account_id = $1
              AND ($2::TEXT IS NULL OR kind = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at <= $4)
              AND ($5::UUID IS NULL OR reference_id = $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(filter.kind.map(|k| k.code()))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.reference_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn audit(
        &self,
        account_id: AccountId,
        initial_grant: i64,
    ) -> EconomyResult<BalanceAudit> {
        // One snapshot for both reads, so the journal sum and the cached
        // balance describe the same moment.
        let mut tx = self.pool.begin().await?;

        let actual = sqlx::query_scalar::<_, i64>(
            "SELECT coins FROM account_balances WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(EconomyError::AccountNotFound)?;

        let journal_sum = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM coin_transactions WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let calculated = initial_grant + journal_sum;
        let difference = actual - calculated;
        let audit = BalanceAudit {
            calculated_balance: calculated,
            actual_balance: actual,
            difference,
            is_valid: difference == 0,
        };

        if !audit.is_valid {
            tracing::error!(
                account_id = %account_id,
                calculated,
                actual,
                difference,
                "Balance drift detected"
            );
        }

        Ok(audit)
    }

    async fn earned_in_period(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EconomyResult<i64> {
        let earned = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0)::BIGINT
            FROM coin_transactions
            WHERE account_id = $1 AND created_at >= $2 AND created_at <= $3
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(earned)
    }

    async fn spent_in_period(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EconomyResult<i64> {
        let spent = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), 0)::BIGINT
            FROM coin_transactions
            WHERE account_id = $1 AND created_at >= $2 AND created_at <= $3
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(spent)
    }

    async fn daily_summary(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> EconomyResult<DailySummary> {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);

        let (count, earned, spent) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0)::BIGINT,
                COALESCE(SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), 0)::BIGINT
            FROM coin_transactions
            WHERE account_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            total_earned: earned,
            total_spent: spent,
            net_change: earned - spent,
            transaction_count: count,
        })
    }
}

impl InventoryRepository for PgEconomyRepository {
    async fn find_inventory(
        &self,
        account_id: AccountId,
    ) -> EconomyResult<Option<PowerUpInventory>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT
                account_id,
                hints_available, hints_purchased_total, hints_used_total, hints_cost,
                reading_vision_available, reading_vision_purchased_total,
                reading_vision_used_total, reading_vision_cost,
                second_chance_available, second_chance_purchased_total,
                second_chance_used_total, second_chance_cost,
                created_at,
                updated_at
            FROM powerup_inventories
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InventoryRow::into_inventory))
    }

    async fn create_inventory(&self, inventory: &PowerUpInventory) -> EconomyResult<()> {
        let hints = inventory.stock(PowerUpKind::Hints);
        let vision = inventory.stock(PowerUpKind::ReadingVision);
        let second = inventory.stock(PowerUpKind::SecondChance);

        sqlx::query(
            r#"
            INSERT INTO powerup_inventories (
                account_id,
                hints_available, hints_purchased_total, hints_used_total, hints_cost,
                reading_vision_available, reading_vision_purchased_total,
                reading_vision_used_total, reading_vision_cost,
                second_chance_available, second_chance_purchased_total,
                second_chance_used_total, second_chance_cost,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (account_id) DO NOTHING
            "#,
        )
        .bind(inventory.account_id.as_uuid())
        .bind(hints.available)
        .bind(hints.purchased_total)
        .bind(hints.used_total)
        .bind(hints.unit_cost)
        .bind(vision.available)
        .bind(vision.purchased_total)
        .bind(vision.used_total)
        .bind(vision.unit_cost)
        .bind(second.available)
        .bind(second.purchased_total)
        .bind(second.used_total)
        .bind(second.unit_cost)
        .bind(inventory.created_at)
        .bind(inventory.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(account_id = %inventory.account_id, "Inventory record created");

        Ok(())
    }

    async fn save_inventory(
        &self,
        inventory: &PowerUpInventory,
        entry: &InventoryTransaction,
    ) -> EconomyResult<()> {
        let hints = inventory.stock(PowerUpKind::Hints);
        let vision = inventory.stock(PowerUpKind::ReadingVision);
        let second = inventory.stock(PowerUpKind::SecondChance);

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE powerup_inventories SET
                hints_available = $2,
                hints_purchased_total = $3,
                hints_used_total = $4,
                reading_vision_available = $5,
                reading_vision_purchased_total = $6,
                reading_vision_used_total = $7,
                second_chance_available = $8,
                second_chance_purchased_total = $9,
                second_chance_used_total = $10,
                updated_at = $11
            WHERE account_id = $1
            "#,
        )
        .bind(inventory.account_id.as_uuid())
        .bind(hints.available)
        .bind(hints.purchased_total)
        .bind(hints.used_total)
        .bind(vision.available)
        .bind(vision.purchased_total)
        .bind(vision.used_total)
        .bind(second.available)
        .bind(second.purchased_total)
        .bind(second.used_total)
        .bind(inventory.updated_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(EconomyError::Internal(format!(
                "inventory row missing for account {}",
                inventory.account_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO inventory_transactions (
                entry_id,
                account_id,
                item_id,
                kind,
                quantity,
                metadata,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.account_id.as_uuid())
        .bind(&entry.item_id)
        .bind(entry.kind.code())
        .bind(entry.quantity)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn inventory_entries(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> EconomyResult<Vec<InventoryTransaction>> {
        let rows = sqlx::query_as::<_, InventoryEntryRow>(
            r#"
            SELECT entry_id, account_id, item_id, kind, quantity, metadata, created_at
            FROM inventory_transactions
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InventoryEntryRow::into_entry).collect()
    }
}

// Internal row types for sqlx mapping

#[derive(sqlx::FromRow)]
struct BalanceRow {
    account_id: Uuid,
    coins: i64,
    earned_total: i64,
    spent_total: i64,
    earned_today: i64,
    last_daily_reset: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BalanceRow {
    fn into_balance(self) -> AccountBalance {
        AccountBalance {
            account_id: AccountId::from_uuid(self.account_id),
            coins: self.coins,
            earned_total: self.earned_total,
            spent_total: self.spent_total,
            earned_today: self.earned_today,
            last_daily_reset: self.last_daily_reset,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    transaction_id: Uuid,
    account_id: Uuid,
    amount: i64,
    balance_before: i64,
    balance_after: i64,
    kind: String,
    description: Option<String>,
    reference_id: Option<Uuid>,
    reference_type: Option<String>,
    multiplier: f64,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self) -> EconomyResult<LedgerTransaction> {
        let kind = TransactionKind::from_code(&self.kind).ok_or_else(|| {
            EconomyError::Internal(format!("unknown transaction kind in journal: {}", self.kind))
        })?;
        let reference = match (self.reference_id, self.reference_type) {
            (Some(id), Some(ref_kind)) => Some(TransactionRef::new(id, ref_kind)),
            _ => None,
        };
        Ok(LedgerTransaction {
            id: TransactionId::from_uuid(self.transaction_id),
            account_id: AccountId::from_uuid(self.account_id),
            amount: self.amount,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            kind,
            description: self.description,
            reference,
            multiplier: self.multiplier,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InventoryRow {
    account_id: Uuid,
    hints_available: i64,
    hints_purchased_total: i64,
    hints_used_total: i64,
    hints_cost: i64,
    reading_vision_available: i64,
    reading_vision_purchased_total: i64,
    reading_vision_used_total: i64,
    reading_vision_cost: i64,
    second_chance_available: i64,
    second_chance_purchased_total: i64,
    second_chance_used_total: i64,
    second_chance_cost: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InventoryRow {
    fn into_inventory(self) -> PowerUpInventory {
        let mut slots = BTreeMap::new();
        slots.insert(
            PowerUpKind::Hints,
            PowerUpStock {
                available: self.hints_available,
                purchased_total: self.hints_purchased_total,
                used_total: self.hints_used_total,
                unit_cost: self.hints_cost,
            },
        );
        slots.insert(
            PowerUpKind::ReadingVision,
            PowerUpStock {
                available: self.reading_vision_available,
                purchased_total: self.reading_vision_purchased_total,
                used_total: self.reading_vision_used_total,
                unit_cost: self.reading_vision_cost,
            },
        );
        slots.insert(
            PowerUpKind::SecondChance,
            PowerUpStock {
                available: self.second_chance_available,
                purchased_total: self.second_chance_purchased_total,
                used_total: self.second_chance_used_total,
                unit_cost: self.second_chance_cost,
            },
        );
        PowerUpInventory::from_slots(
            AccountId::from_uuid(self.account_id),
            slots,
            self.created_at,
            self.updated_at,
        )
    }
}

#[derive(sqlx::FromRow)]
struct InventoryEntryRow {
    entry_id: Uuid,
    account_id: Uuid,
    item_id: String,
    kind: String,
    quantity: i32,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl InventoryEntryRow {
    fn into_entry(self) -> EconomyResult<InventoryTransaction> {
        let kind = InventoryEntryKind::from_code(&self.kind).ok_or_else(|| {
            EconomyError::Internal(format!("unknown inventory entry kind: {}", self.kind))
        })?;
        Ok(InventoryTransaction {
            id: InventoryEntryId::from_uuid(self.entry_id),
            account_id: AccountId::from_uuid(self.account_id),
            item_id: self.item_id,
            kind,
            quantity: self.quantity,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}
