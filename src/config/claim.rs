use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Fixed per-item resource costs of the two claim transaction kinds.
///
/// These depend on the ledger deployment and are not derived at runtime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClaimConfig {
    /// Cost of claiming one already-initialized task
    /// Default: 55_000
    #[serde(default = "default_claim_cost")]
    pub claim_cost: u64,

    /// Cost of initializing then claiming one task; always above `claim_cost`
    /// Default: 130_000
    #[serde(default = "default_init_and_claim_cost")]
    pub init_and_claim_cost: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            claim_cost: default_claim_cost(),
            init_and_claim_cost: default_init_and_claim_cost(),
        }
    }
}

impl ClaimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.claim_cost == 0 {
            return Err(Error::InvalidConfig("claim.claim_cost must be > 0".into()));
        }
        if self.init_and_claim_cost <= self.claim_cost {
            return Err(Error::InvalidConfig(format!(
                "claim.init_and_claim_cost ({}) must exceed claim.claim_cost ({})",
                self.init_and_claim_cost, self.claim_cost
            )));
        }
        Ok(())
    }
}

fn default_claim_cost() -> u64 {
    55_000
}

fn default_init_and_claim_cost() -> u64 {
    130_000
}
