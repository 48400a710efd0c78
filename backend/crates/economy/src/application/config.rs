//! Application Configuration
//!
//! Configuration for the economy application layer.

use crate::domain::value_objects::INITIAL_GRANT;

/// Economy application configuration
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// Coins granted when a balance record is lazily provisioned. Also the
    /// constant added back when auditing a balance against the journal.
    pub initial_grant: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_grant: INITIAL_GRANT,
        }
    }
}
