//! Purchase Power-Up Use Case
//!
//! Debits the coin ledger and grants inventory stock, with paired audit
//! rows in both journals.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::application::config::EconomyConfig;
use crate::domain::entities::{AccountBalance, InventoryTransaction, PowerUpInventory};
use crate::domain::repository::{DebitRequest, InventoryRepository, LedgerRepository};
use crate::domain::value_objects::{PowerUpKind, TransactionKind};
use crate::error::{EconomyError, EconomyResult};

/// Input DTO for a purchase
#[derive(Debug, Clone)]
pub struct PurchaseInput {
    pub account_id: AccountId,
    pub power_up: PowerUpKind,
    pub quantity: i64,
}

/// Output DTO for a purchase
#[derive(Debug, Clone)]
pub struct PurchaseOutput {
    pub inventory: PowerUpInventory,
    pub total_cost: i64,
    pub balance: i64,
}

/// Purchase Power-Up Use Case
pub struct PurchasePowerUpUseCase<L, I>
where
    L: LedgerRepository,
    I: InventoryRepository,
{
    ledger: Arc<L>,
    inventory: Arc<I>,
    config: Arc<EconomyConfig>,
}

impl<L, I> PurchasePowerUpUseCase<L, I>
where
    L: LedgerRepository,
    I: InventoryRepository,
{
    pub fn new(ledger: Arc<L>, inventory: Arc<I>, config: Arc<EconomyConfig>) -> Self {
        Self {
            ledger,
            inventory,
            config,
        }
    }

    pub async fn execute(&self, input: PurchaseInput) -> EconomyResult<PurchaseOutput> {
        if input.quantity < 1 {
            return Err(EconomyError::InvalidQuantity);
        }

        // Lazy provisioning: both records are created on first contact
        let mut inventory = match self.inventory.find_inventory(input.account_id).await? {
            Some(inventory) => inventory,
            None => {
                let inventory = PowerUpInventory::new(input.account_id);
                self.inventory.create_inventory(&inventory).await?;
                tracing::info!(account_id = %input.account_id, "Provisioned power-up inventory");
                inventory
            }
        };
        if self.ledger.find_balance(input.account_id).await?.is_none() {
            let balance = AccountBalance::new(input.account_id, self.config.initial_grant);
            self.ledger.create_balance(&balance).await?;
            tracing::info!(
                account_id = %input.account_id,
                initial_grant = self.config.initial_grant,
                "Provisioned account balance"
            );
        }

        let unit_cost = inventory.unit_cost(input.power_up);
        let total_cost = unit_cost * input.quantity;

        // Debit first. The debit itself re-checks the balance under the row
        // lock, so a concurrent spend cannot slip below zero.
        let receipt = self
            .ledger
            .debit(
                input.account_id,
                DebitRequest {
                    amount: total_cost,
                    kind: TransactionKind::SpentPowerup,
                    description: Some(format!(
                        "Purchased {}x {}",
                        input.quantity, input.power_up
                    )),
                    reference: None,
                },
            )
            .await?;

        inventory.grant(input.power_up, input.quantity);
        let entry = InventoryTransaction::purchase(
            input.account_id,
            input.power_up,
            input.quantity,
            unit_cost,
            total_cost,
        );

        if let Err(err) = self.inventory.save_inventory(&inventory, &entry).await {
            // Coins are gone but no stock was granted. Fatal for this
            // account's write path until an operator reconciles it.
            tracing::error!(
                account_id = %input.account_id,
                power_up = %input.power_up,
                coins_debited = total_cost,
                ledger_transaction = %receipt.transaction.id,
                error = %err,
                "Purchase debited the ledger but the inventory grant failed"
            );
            return Err(EconomyError::Inconsistency(format!(
                "debit {} committed without inventory grant for account {}",
                receipt.transaction.id, input.account_id
            )));
        }

        tracing::info!(
            account_id = %input.account_id,
            power_up = %input.power_up,
            quantity = input.quantity,
            total_cost,
            balance = receipt.balance,
            "Power-up purchased"
        );

        Ok(PurchaseOutput {
            inventory,
            total_cost,
            balance: receipt.balance,
        })
    }
}
