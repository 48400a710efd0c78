//! Domain Value Objects
//!
//! Closed enums and small parameter types for the coin ledger and the
//! power-up inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed starting balance granted to every account on first provisioning.
///
/// The balance invariant is `coins = INITIAL_GRANT + sum(transaction.amount)`;
/// the grant itself is not a journal row, so `audit` adds it back explicitly.
pub const INITIAL_GRANT: i64 = 100;

/// Hours after which the earned-today counter resets.
pub const DAILY_RESET_HOURS: i64 = 24;

// ============================================================================
// TransactionKind - Classification of ledger movements
// ============================================================================

/// Ledger transaction kind
///
/// Mirrors the platform's closed transaction taxonomy: seven earning kinds,
/// three spending kinds and four administrative/system kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Coins awarded for a correct exercise submission
    EarnedExercise,
    /// Coins awarded for completing a whole module
    EarnedModule,
    /// Coins awarded for unlocking an achievement
    EarnedAchievement,
    /// Coins awarded on a rank promotion
    EarnedRank,
    /// Coins awarded for keeping a streak alive
    EarnedStreak,
    /// Daily login reward
    EarnedDaily,
    /// Event or campaign bonus
    EarnedBonus,
    /// Power-up purchase
    SpentPowerup,
    /// Hint unlock during an exercise
    SpentHint,
    /// Paid exercise retry
    SpentRetry,
    /// Manual adjustment by an operator (positive or negative)
    AdminAdjustment,
    /// Refund of a previous spend
    Refund,
    /// Generic system bonus
    Bonus,
    /// Signup bonus
    WelcomeBonus,
}

impl TransactionKind {
    /// Get string code for database storage and serialization
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EarnedExercise => "earned_exercise",
            Self::EarnedModule => "earned_module",
            Self::EarnedAchievement => "earned_achievement",
            Self::EarnedRank => "earned_rank",
            Self::EarnedStreak => "earned_streak",
            Self::EarnedDaily => "earned_daily",
            Self::EarnedBonus => "earned_bonus",
            Self::SpentPowerup => "spent_powerup",
            Self::SpentHint => "spent_hint",
            Self::SpentRetry => "spent_retry",
            Self::AdminAdjustment => "admin_adjustment",
            Self::Refund => "refund",
            Self::Bonus => "bonus",
            Self::WelcomeBonus => "welcome_bonus",
        }
    }

    /// Create from string code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "earned_exercise" => Some(Self::EarnedExercise),
            "earned_module" => Some(Self::EarnedModule),
            "earned_achievement" => Some(Self::EarnedAchievement),
            "earned_rank" => Some(Self::EarnedRank),
            "earned_streak" => Some(Self::EarnedStreak),
            "earned_daily" => Some(Self::EarnedDaily),
            "earned_bonus" => Some(Self::EarnedBonus),
            "spent_powerup" => Some(Self::SpentPowerup),
            "spent_hint" => Some(Self::SpentHint),
            "spent_retry" => Some(Self::SpentRetry),
            "admin_adjustment" => Some(Self::AdminAdjustment),
            "refund" => Some(Self::Refund),
            "bonus" => Some(Self::Bonus),
            "welcome_bonus" => Some(Self::WelcomeBonus),
            _ => None,
        }
    }

    /// Whether this kind represents earnings (credits in the primary flow)
    #[inline]
    pub const fn is_earning(&self) -> bool {
        matches!(
            self,
            Self::EarnedExercise
                | Self::EarnedModule
                | Self::EarnedAchievement
                | Self::EarnedRank
                | Self::EarnedStreak
                | Self::EarnedDaily
                | Self::EarnedBonus
        )
    }

    /// Whether this kind represents spending (debits in the primary flow)
    #[inline]
    pub const fn is_spending(&self) -> bool {
        matches!(self, Self::SpentPowerup | Self::SpentHint | Self::SpentRetry)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// PowerUpKind - The three consumable power-up types
// ============================================================================

/// Power-up kind
///
/// The platform sells exactly three consumables, each with its own unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Reveals contextual hints inside an exercise
    Hints,
    /// Highlights key words in the reading passage
    ReadingVision,
    /// Allows retrying a failed exercise
    SecondChance,
}

impl PowerUpKind {
    /// All kinds, in canonical order
    pub const ALL: [PowerUpKind; 3] = [Self::Hints, Self::ReadingVision, Self::SecondChance];

    /// Get string code for database storage and serialization
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Hints => "hints",
            Self::ReadingVision => "reading_vision",
            Self::SecondChance => "second_chance",
        }
    }

    /// Create from string code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "hints" => Some(Self::Hints),
            "reading_vision" => Some(Self::ReadingVision),
            "second_chance" => Some(Self::SecondChance),
            _ => None,
        }
    }

    /// Default unit cost in coins
    #[inline]
    pub const fn default_unit_cost(&self) -> i64 {
        match self {
            Self::Hints => 15,
            Self::ReadingVision => 25,
            Self::SecondChance => 40,
        }
    }

    /// Item identifier used in the inventory audit journal
    pub fn item_id(&self) -> String {
        format!("powerup_{}", self.code())
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// InventoryEntryKind - PURCHASE vs USE audit rows
// ============================================================================

/// Inventory audit entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryEntryKind {
    /// Stock granted in exchange for coins; positive quantity
    Purchase,
    /// Single consumption during an exercise; quantity is -1
    Use,
}

impl InventoryEntryKind {
    /// Get string code for database storage
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Use => "USE",
        }
    }

    /// Create from string code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PURCHASE" => Some(Self::Purchase),
            "USE" => Some(Self::Use),
            _ => None,
        }
    }
}

impl fmt::Display for InventoryEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Query parameter types
// ============================================================================

/// Optional reference attached to a ledger transaction (e.g. the submission
/// that triggered it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRef {
    pub id: Uuid,
    pub kind: String,
}

impl TransactionRef {
    pub fn new(id: Uuid, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }
}

/// Filter for listing ledger transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub reference_id: Option<Uuid>,
}

/// Pagination window; `limit` is clamped to [1, 200]
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 200;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod transaction_kind {
        use super::*;

        #[test]
        fn test_code_roundtrip() {
            for kind in [
                TransactionKind::EarnedExercise,
                TransactionKind::EarnedModule,
                TransactionKind::EarnedAchievement,
                TransactionKind::EarnedRank,
                TransactionKind::EarnedStreak,
                TransactionKind::EarnedDaily,
                TransactionKind::EarnedBonus,
                TransactionKind::SpentPowerup,
                TransactionKind::SpentHint,
                TransactionKind::SpentRetry,
                TransactionKind::AdminAdjustment,
                TransactionKind::Refund,
                TransactionKind::Bonus,
                TransactionKind::WelcomeBonus,
            ] {
                assert_eq!(TransactionKind::from_code(kind.code()), Some(kind));
            }
            assert_eq!(TransactionKind::from_code("gift"), None);
        }

        #[test]
        fn test_classification() {
            assert!(TransactionKind::EarnedExercise.is_earning());
            assert!(!TransactionKind::EarnedExercise.is_spending());
            assert!(TransactionKind::SpentPowerup.is_spending());
            assert!(!TransactionKind::AdminAdjustment.is_earning());
            assert!(!TransactionKind::AdminAdjustment.is_spending());
        }
    }

    mod power_up_kind {
        use super::*;

        #[test]
        fn test_unit_costs() {
            assert_eq!(PowerUpKind::Hints.default_unit_cost(), 15);
            assert_eq!(PowerUpKind::ReadingVision.default_unit_cost(), 25);
            assert_eq!(PowerUpKind::SecondChance.default_unit_cost(), 40);
        }

        #[test]
        fn test_code_roundtrip() {
            for kind in PowerUpKind::ALL {
                assert_eq!(PowerUpKind::from_code(kind.code()), Some(kind));
            }
            assert_eq!(PowerUpKind::from_code("luck"), None);
        }

        #[test]
        fn test_item_id() {
            assert_eq!(PowerUpKind::Hints.item_id(), "powerup_hints");
            assert_eq!(
                PowerUpKind::SecondChance.item_id(),
                "powerup_second_chance"
            );
        }
    }

    mod inventory_entry_kind {
        use super::*;

        #[test]
        fn test_codes() {
            assert_eq!(InventoryEntryKind::Purchase.code(), "PURCHASE");
            assert_eq!(InventoryEntryKind::Use.code(), "USE");
            assert_eq!(
                InventoryEntryKind::from_code("USE"),
                Some(InventoryEntryKind::Use)
            );
            assert_eq!(InventoryEntryKind::from_code("SELL"), None);
        }
    }

    mod page {
        use super::*;

        #[test]
        fn test_clamping() {
            let page = Page::new(0, -5);
            assert_eq!(page.limit, 1);
            assert_eq!(page.offset, 0);

            let page = Page::new(9999, 10);
            assert_eq!(page.limit, Page::MAX_LIMIT);
            assert_eq!(page.offset, 10);
        }

        #[test]
        fn test_default() {
            let page = Page::default();
            assert_eq!(page.limit, 50);
            assert_eq!(page.offset, 0);
        }
    }
}
