//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    CoinStats, InventoryStats, InventoryTransaction, LedgerTransaction, PowerUpInventory,
};
use crate::domain::value_objects::PowerUpKind;

/// Response for GET /api/economy/balance/{account_id}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: Uuid,
    pub balance: i64,
}

/// Response for GET /api/economy/coins/{account_id}/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinStatsResponse {
    pub current_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub earned_today: i64,
}

impl From<CoinStats> for CoinStatsResponse {
    fn from(stats: CoinStats) -> Self {
        Self {
            current_balance: stats.current_balance,
            total_earned: stats.total_earned,
            total_spent: stats.total_spent,
            earned_today: stats.earned_today,
        }
    }
}

/// One journal row in transaction listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub kind: String,
    pub description: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub multiplier: f64,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerTransaction> for TransactionResponse {
    fn from(tx: LedgerTransaction) -> Self {
        let (reference_id, reference_type) = match tx.reference {
            Some(reference) => (Some(reference.id), Some(reference.kind)),
            None => (None, None),
        };
        Self {
            transaction_id: tx.id.into_uuid(),
            amount: tx.amount,
            balance_before: tx.balance_before,
            balance_after: tx.balance_after,
            kind: tx.kind.code().to_string(),
            description: tx.description,
            reference_id,
            reference_type,
            multiplier: tx.multiplier,
            created_at: tx.created_at,
        }
    }
}

/// Query parameters for GET /api/economy/transactions/{account_id}
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub reference_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for GET /api/economy/coins/{account_id}/period
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Response for GET /api/economy/coins/{account_id}/period
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotalsResponse {
    pub total_earned: i64,
    pub total_spent: i64,
}

/// Response for GET /api/economy/coins/{account_id}/summary/{date}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    pub total_earned: i64,
    pub total_spent: i64,
    pub net_change: i64,
    pub transaction_count: i64,
}

/// Response for GET /api/economy/audit/{account_id}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub calculated_balance: i64,
    pub actual_balance: i64,
    pub difference: i64,
    pub is_valid: bool,
}

/// One power-up slot in inventory responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpSlotResponse {
    pub kind: String,
    pub available: i64,
    pub purchased_total: i64,
    pub used_total: i64,
    pub unit_cost: i64,
}

/// Response for GET /api/economy/inventory/{account_id}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub account_id: Uuid,
    pub power_ups: Vec<PowerUpSlotResponse>,
}

impl From<&PowerUpInventory> for InventoryResponse {
    fn from(inventory: &PowerUpInventory) -> Self {
        let power_ups = PowerUpKind::ALL
            .into_iter()
            .map(|kind| {
                let slot = inventory.stock(kind);
                PowerUpSlotResponse {
                    kind: kind.code().to_string(),
                    available: slot.available,
                    purchased_total: slot.purchased_total,
                    used_total: slot.used_total,
                    unit_cost: slot.unit_cost,
                }
            })
            .collect();
        Self {
            account_id: inventory.account_id.into_uuid(),
            power_ups,
        }
    }
}

/// Per-kind block in GET /api/economy/inventory/{account_id}/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpTypeStatsResponse {
    pub kind: String,
    pub purchased: i64,
    pub used: i64,
    pub available: i64,
    pub coins_spent: i64,
}

/// Response for GET /api/economy/inventory/{account_id}/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStatsResponse {
    pub total_purchased: i64,
    pub total_used: i64,
    pub total_coins_spent: i64,
    pub by_type: Vec<PowerUpTypeStatsResponse>,
    pub usage_rate: f64,
    pub most_used: Option<String>,
}

impl From<InventoryStats> for InventoryStatsResponse {
    fn from(stats: InventoryStats) -> Self {
        let by_type = stats
            .by_type
            .into_iter()
            .map(|(kind, type_stats)| PowerUpTypeStatsResponse {
                kind: kind.code().to_string(),
                purchased: type_stats.purchased,
                used: type_stats.used,
                available: type_stats.available,
                coins_spent: type_stats.coins_spent,
            })
            .collect();
        Self {
            total_purchased: stats.total_purchased,
            total_used: stats.total_used,
            total_coins_spent: stats.total_coins_spent,
            by_type,
            usage_rate: stats.usage_rate,
            most_used: stats.most_used.map(|kind| kind.code().to_string()),
        }
    }
}

/// One audit row in GET /api/economy/inventory/{account_id}/history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntryResponse {
    pub entry_id: Uuid,
    pub item_id: String,
    pub kind: String,
    pub quantity: i32,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<InventoryTransaction> for InventoryEntryResponse {
    fn from(entry: InventoryTransaction) -> Self {
        Self {
            entry_id: entry.id.into_uuid(),
            item_id: entry.item_id,
            kind: entry.kind.code().to_string(),
            quantity: entry.quantity,
            metadata: entry.metadata,
            created_at: entry.created_at,
        }
    }
}

/// Request for POST /api/economy/powerups/purchase
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub account_id: Uuid,
    pub power_up: String,
    pub quantity: i64,
}

/// Response for POST /api/economy/powerups/purchase
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub total_cost: i64,
    pub balance: i64,
    pub inventory: InventoryResponse,
}

/// Request for POST /api/economy/powerups/use
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseRequest {
    pub account_id: Uuid,
    pub power_up: String,
    pub exercise_id: Uuid,
    #[serde(default)]
    pub context: Option<String>,
}
