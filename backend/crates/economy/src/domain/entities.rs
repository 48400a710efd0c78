//! Domain Entities
//!
//! The account balance, the append-only ledger journal and the power-up
//! inventory. Entities own the arithmetic (balance math, counter updates,
//! journal-row construction); the repository layer owns atomicity.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AccountId, InventoryEntryId, TransactionId};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::value_objects::{
    DAILY_RESET_HOURS, InventoryEntryKind, PowerUpKind, TransactionKind, TransactionRef,
};
use crate::error::{EconomyError, EconomyResult};

// ============================================================================
// AccountBalance
// ============================================================================

/// Account balance entity - one row per learner
///
/// Invariant: `coins = initial grant + sum(amount)` over the account's
/// journal. Only `credit`/`debit` may change `coins`.
#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub account_id: AccountId,
    /// Current spendable coins (never negative)
    pub coins: i64,
    /// Lifetime earned total
    pub earned_total: i64,
    /// Lifetime spent total
    pub spent_total: i64,
    /// Coins earned since the last daily reset
    pub earned_today: i64,
    /// When the earned-today counter was last reset
    pub last_daily_reset: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountBalance {
    /// Provision a fresh balance with the initial grant
    pub fn new(account_id: AccountId, initial_grant: i64) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            coins: initial_grant,
            earned_total: 0,
            spent_total: 0,
            earned_today: 0,
            last_daily_reset: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reset the earned-today counter if the reset window has elapsed
    pub fn maybe_reset_daily(&mut self, now: DateTime<Utc>) {
        if now - self.last_daily_reset >= Duration::hours(DAILY_RESET_HOURS) {
            self.earned_today = 0;
            self.last_daily_reset = now;
        }
    }

    /// Apply a credit and build the matching journal row
    ///
    /// The multiplier is applied by flooring `amount * multiplier`. Updates
    /// the lifetime-earned and earned-today counters (resetting the daily
    /// counter first when stale).
    pub fn credit(
        &mut self,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
        reference: Option<TransactionRef>,
        multiplier: Option<f64>,
    ) -> EconomyResult<LedgerTransaction> {
        if amount <= 0 {
            return Err(EconomyError::InvalidAmount);
        }

        let applied = multiplier.unwrap_or(1.0);
        let final_amount = (amount as f64 * applied).floor() as i64;

        let now = Utc::now();
        let balance_before = self.coins;
        let balance_after = balance_before + final_amount;

        self.coins = balance_after;
        self.earned_total += final_amount;
        self.maybe_reset_daily(now);
        self.earned_today += final_amount;
        self.updated_at = now;

        Ok(LedgerTransaction {
            id: TransactionId::new(),
            account_id: self.account_id,
            amount: final_amount,
            balance_before,
            balance_after,
            kind,
            description,
            reference,
            multiplier: applied,
            metadata: serde_json::json!({}),
            created_at: now,
        })
    }

    /// Apply a debit and build the matching journal row (negative amount)
    pub fn debit(
        &mut self,
        amount: i64,
        kind: TransactionKind,
        description: Option<String>,
        reference: Option<TransactionRef>,
    ) -> EconomyResult<LedgerTransaction> {
        if amount <= 0 {
            return Err(EconomyError::InvalidAmount);
        }
        if amount > self.coins {
            return Err(EconomyError::InsufficientBalance {
                required: amount,
                available: self.coins,
            });
        }

        let now = Utc::now();
        let balance_before = self.coins;
        let balance_after = balance_before - amount;

        self.coins = balance_after;
        self.spent_total += amount;
        self.updated_at = now;

        Ok(LedgerTransaction {
            id: TransactionId::new(),
            account_id: self.account_id,
            amount: -amount,
            balance_before,
            balance_after,
            kind,
            description,
            reference,
            multiplier: 1.0,
            metadata: serde_json::json!({}),
            created_at: now,
        })
    }

    /// Snapshot of the coin counters
    pub fn coin_stats(&self) -> CoinStats {
        CoinStats {
            current_balance: self.coins,
            total_earned: self.earned_total,
            total_spent: self.spent_total,
            earned_today: self.earned_today,
        }
    }
}

/// Read-only coin counter snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinStats {
    pub current_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub earned_today: i64,
}

// ============================================================================
// LedgerTransaction
// ============================================================================

/// Immutable ledger journal row
///
/// Invariant: `balance_after = balance_before + amount`. Rows are appended,
/// never updated or deleted; the journal is the audit source of truth.
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    /// Signed movement: positive for credits, negative for debits
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub reference: Option<TransactionRef>,
    pub multiplier: f64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// PowerUpInventory
// ============================================================================

/// Per-type stock counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUpStock {
    pub available: i64,
    pub purchased_total: i64,
    pub used_total: i64,
    pub unit_cost: i64,
}

impl PowerUpStock {
    fn new(unit_cost: i64) -> Self {
        Self {
            available: 0,
            purchased_total: 0,
            used_total: 0,
            unit_cost,
        }
    }
}

/// Power-up inventory entity - one row per learner
///
/// A typed map from [`PowerUpKind`] to its stock counters. Invariants:
/// every counter stays >= 0 and `available = purchased_total - used_total`
/// is maintained incrementally, never recomputed from history.
#[derive(Debug, Clone)]
pub struct PowerUpInventory {
    pub account_id: AccountId,
    slots: BTreeMap<PowerUpKind, PowerUpStock>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PowerUpInventory {
    /// Provision an empty inventory with default unit costs
    pub fn new(account_id: AccountId) -> Self {
        let now = Utc::now();
        let slots = PowerUpKind::ALL
            .into_iter()
            .map(|kind| (kind, PowerUpStock::new(kind.default_unit_cost())))
            .collect();
        Self {
            account_id,
            slots,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from persisted counters (infra row mapping)
    pub fn from_slots(
        account_id: AccountId,
        slots: BTreeMap<PowerUpKind, PowerUpStock>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            slots,
            created_at,
            updated_at,
        }
    }

    /// Counters for one kind
    pub fn stock(&self, kind: PowerUpKind) -> PowerUpStock {
        // All kinds are seeded at construction
        self.slots
            .get(&kind)
            .copied()
            .unwrap_or_else(|| PowerUpStock::new(kind.default_unit_cost()))
    }

    /// Unit cost for one kind
    pub fn unit_cost(&self, kind: PowerUpKind) -> i64 {
        self.stock(kind).unit_cost
    }

    /// Whether at least `quantity` of `kind` is available
    pub fn has_stock(&self, kind: PowerUpKind, quantity: i64) -> bool {
        self.stock(kind).available >= quantity
    }

    /// Grant purchased stock
    pub fn grant(&mut self, kind: PowerUpKind, quantity: i64) {
        let slot = self
            .slots
            .entry(kind)
            .or_insert_with(|| PowerUpStock::new(kind.default_unit_cost()));
        slot.available += quantity;
        slot.purchased_total += quantity;
        self.updated_at = Utc::now();
    }

    /// Consume a single unit
    pub fn consume(&mut self, kind: PowerUpKind) -> EconomyResult<()> {
        let slot = self
            .slots
            .entry(kind)
            .or_insert_with(|| PowerUpStock::new(kind.default_unit_cost()));
        if slot.available < 1 {
            return Err(EconomyError::InsufficientStock {
                kind,
                available: slot.available,
            });
        }
        slot.available -= 1;
        slot.used_total += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Derived usage statistics, computed from the counters alone
    pub fn stats(&self) -> InventoryStats {
        let mut by_type = BTreeMap::new();
        let mut total_purchased = 0;
        let mut total_used = 0;
        let mut total_coins_spent = 0;

        for kind in PowerUpKind::ALL {
            let slot = self.stock(kind);
            let coins_spent = slot.purchased_total * slot.unit_cost;
            total_purchased += slot.purchased_total;
            total_used += slot.used_total;
            total_coins_spent += coins_spent;
            by_type.insert(
                kind,
                PowerUpTypeStats {
                    purchased: slot.purchased_total,
                    used: slot.used_total,
                    available: slot.available,
                    coins_spent,
                },
            );
        }

        let usage_rate = if total_purchased > 0 {
            let rate = total_used as f64 / total_purchased as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };

        let most_used = by_type
            .iter()
            .filter(|(_, stats)| stats.used > 0)
            .max_by_key(|(_, stats)| stats.used)
            .map(|(kind, _)| *kind);

        InventoryStats {
            total_purchased,
            total_used,
            total_coins_spent,
            by_type,
            usage_rate,
            most_used,
        }
    }
}

/// Per-type slice of [`InventoryStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUpTypeStats {
    pub purchased: i64,
    pub used: i64,
    pub available: i64,
    pub coins_spent: i64,
}

/// Aggregated inventory statistics
#[derive(Debug, Clone)]
pub struct InventoryStats {
    pub total_purchased: i64,
    pub total_used: i64,
    pub total_coins_spent: i64,
    pub by_type: BTreeMap<PowerUpKind, PowerUpTypeStats>,
    /// Share of purchased power-ups that were used, in percent
    pub usage_rate: f64,
    pub most_used: Option<PowerUpKind>,
}

// ============================================================================
// InventoryTransaction
// ============================================================================

/// Immutable inventory audit row
#[derive(Debug, Clone)]
pub struct InventoryTransaction {
    pub id: InventoryEntryId,
    pub account_id: AccountId,
    /// Item identifier, e.g. `powerup_hints`
    pub item_id: String,
    pub kind: InventoryEntryKind,
    /// Positive for purchases, -1 for a single use
    pub quantity: i32,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// Audit row for a purchase
    pub fn purchase(
        account_id: AccountId,
        power_up: PowerUpKind,
        quantity: i64,
        unit_cost: i64,
        total_cost: i64,
    ) -> Self {
        Self {
            id: InventoryEntryId::new(),
            account_id,
            item_id: power_up.item_id(),
            kind: InventoryEntryKind::Purchase,
            quantity: quantity as i32,
            metadata: serde_json::json!({
                "power_up": power_up.code(),
                "coins_spent": total_cost,
                "cost_per_unit": unit_cost,
            }),
            created_at: Utc::now(),
        }
    }

    /// Audit row for a single use during an exercise
    pub fn usage(
        account_id: AccountId,
        power_up: PowerUpKind,
        exercise_id: Uuid,
        context: Option<String>,
    ) -> Self {
        Self {
            id: InventoryEntryId::new(),
            account_id,
            item_id: power_up.item_id(),
            kind: InventoryEntryKind::Use,
            quantity: -1,
            metadata: serde_json::json!({
                "power_up": power_up.code(),
                "exercise_id": exercise_id,
                "context": context,
            }),
            created_at: Utc::now(),
        }
    }
}
