use crate::value_objects::{Amount, Percentage};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the pool as seen by one account.
///
/// Values are read from the ledger and never edited locally; a new snapshot
/// replaces the old one as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub reserve1: Amount,
    pub reserve2: Amount,
    pub total_shares: Amount,
    pub caller_shares: Amount,
}

impl Snapshot {
    pub fn new(reserve1: Amount, reserve2: Amount, total_shares: Amount, caller_shares: Amount) -> Self {
        Self {
            reserve1,
            reserve2,
            total_shares,
            caller_shares,
        }
    }

    /// Caller's share of the pool in percent, two decimals.
    pub fn pool_share_percent(&self) -> Percentage {
        Percentage::from_ratio(self.caller_shares.raw, self.total_shares.raw)
    }

    pub fn has_liquidity(&self) -> bool {
        !self.total_shares.is_zero()
    }
}
