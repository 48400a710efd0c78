//! Use Power-Up Use Case
//!
//! Consumes one unit of stock. No ledger interaction: a power-up that was
//! already purchased has no further currency cost.

use std::sync::Arc;

use kernel::id::AccountId;
use uuid::Uuid;

use crate::domain::entities::InventoryTransaction;
use crate::domain::repository::InventoryRepository;
use crate::domain::value_objects::PowerUpKind;
use crate::error::{EconomyError, EconomyResult};

/// Input DTO for using a power-up
#[derive(Debug, Clone)]
pub struct UsePowerUpInput {
    pub account_id: AccountId,
    pub power_up: PowerUpKind,
    /// Exercise the power-up was consumed in
    pub exercise_id: Uuid,
    /// Free-form context note, e.g. "question 3"
    pub context: Option<String>,
}

/// Use Power-Up Use Case
pub struct UsePowerUpUseCase<I>
where
    I: InventoryRepository,
{
    inventory: Arc<I>,
}

impl<I> UsePowerUpUseCase<I>
where
    I: InventoryRepository,
{
    pub fn new(inventory: Arc<I>) -> Self {
        Self { inventory }
    }

    pub async fn execute(&self, input: UsePowerUpInput) -> EconomyResult<()> {
        let mut inventory = self
            .inventory
            .find_inventory(input.account_id)
            .await?
            .ok_or(EconomyError::InsufficientStock {
                kind: input.power_up,
                available: 0,
            })?;

        inventory.consume(input.power_up)?;

        let entry = InventoryTransaction::usage(
            input.account_id,
            input.power_up,
            input.exercise_id,
            input.context,
        );
        self.inventory.save_inventory(&inventory, &entry).await?;

        tracing::info!(
            account_id = %input.account_id,
            power_up = %input.power_up,
            exercise_id = %input.exercise_id,
            "Power-up used"
        );

        Ok(())
    }
}
