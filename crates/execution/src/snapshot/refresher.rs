//! Reads pool state into a [`Snapshot`].

use crate::error::ExecutionError;
use cpamm_client_domain::Snapshot;
use cpamm_client_protocols::{Identity, LedgerClient};
use tracing::{debug, warn};

/// Queries reserves, total shares and the caller's shares concurrently.
///
/// The reads are independent point-in-time queries; no atomicity across them
/// is implied. If any of them fails the whole refresh fails.
pub async fn refresh_snapshot(
    ledger: &dyn LedgerClient,
    identity: &Identity,
) -> Result<Snapshot, ExecutionError> {
    let ((reserve1, reserve2), total_shares, caller_shares) = tokio::try_join!(
        ledger.get_reserves(),
        ledger.total_shares(),
        ledger.shares_of(identity.address),
    )
    .map_err(|e| {
        warn!(account = ?identity.address, error = %e, "Snapshot refresh failed");
        ExecutionError::SnapshotUnavailable(e.to_string())
    })?;

    let snapshot = Snapshot::new(reserve1, reserve2, total_shares, caller_shares);
    debug!(
        reserve1 = %snapshot.reserve1,
        reserve2 = %snapshot.reserve2,
        total_shares = %snapshot.total_shares,
        caller_shares = %snapshot.caller_shares,
        pool_share = %snapshot.pool_share_percent(),
        "Snapshot refreshed"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpamm_client_domain::{Address, Amount};
    use cpamm_client_protocols::sandbox::{ReadKind, SandboxLedger};
    use rust_decimal_macros::dec;

    fn setup() -> (SandboxLedger, Identity) {
        let me = Address::repeat_byte(0x10);
        let ledger = SandboxLedger::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            me,
        );
        ledger.seed_pool(
            "30".parse().unwrap(),
            "60".parse().unwrap(),
            &[(me, "10".parse().unwrap()), (Address::repeat_byte(0x20), "20".parse().unwrap())],
        );
        (ledger, Identity { address: me, chain_id: 1 })
    }

    #[tokio::test]
    async fn test_refresh_reads_all_fields() {
        let (ledger, identity) = setup();
        let snapshot = refresh_snapshot(&ledger, &identity).await.unwrap();

        assert_eq!(snapshot.reserve1, "30".parse::<Amount>().unwrap());
        assert_eq!(snapshot.reserve2, "60".parse::<Amount>().unwrap());
        assert_eq!(snapshot.total_shares, "30".parse::<Amount>().unwrap());
        assert_eq!(snapshot.pool_share_percent().value(), dec!(33.33));
    }

    #[tokio::test]
    async fn test_any_failed_read_fails_refresh() {
        for kind in [ReadKind::Reserves, ReadKind::TotalShares, ReadKind::SharesOf] {
            let (ledger, identity) = setup();
            ledger.fail_read(kind);
            let result = refresh_snapshot(&ledger, &identity).await;
            assert!(
                matches!(result, Err(ExecutionError::SnapshotUnavailable(_))),
                "{kind:?}"
            );
        }
    }
}
