//! In-process ledger hosting the pool contract and its two tokens.

use super::pool_math::{Reserves, calculate_minted_shares, calculate_withdrawal};
use crate::error::LedgerError;
use crate::ledger::{Finality, LedgerClient, PendingTx, TxHandle, TxHash};
use async_trait::async_trait;
use cpamm_client_domain::{Address, Amount};
use primitive_types::U256;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A write as it was handed to the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCall {
    Approve {
        token: Address,
        spender: Address,
        amount: Amount,
    },
    Swap {
        amount: Amount,
        token1_in: bool,
    },
    AddLiquidity {
        amount1: Amount,
        amount2: Amount,
    },
    RemoveLiquidity {
        shares: Amount,
    },
}

impl LedgerCall {
    pub fn kind(&self) -> CallKind {
        match self {
            LedgerCall::Approve { token, .. } => CallKind::Approve(*token),
            LedgerCall::Swap { .. } => CallKind::Swap,
            LedgerCall::AddLiquidity { .. } => CallKind::AddLiquidity,
            LedgerCall::RemoveLiquidity { .. } => CallKind::RemoveLiquidity,
        }
    }
}

/// Selector used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Approval on the given token contract.
    Approve(Address),
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

/// Read queries that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKind {
    Reserves,
    TotalShares,
    SharesOf,
}

#[derive(Debug, Default)]
struct ChainState {
    /// (token, holder) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    reserve1: U256,
    reserve2: U256,
    total_shares: U256,
    shares: HashMap<Address, U256>,
    block: u64,
}

impl ChainState {
    fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn check_spend(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), String> {
        if self.allowance(token, owner, spender) < amount {
            return Err("ERC20: insufficient allowance".to_string());
        }
        if self.balance(token, owner) < amount {
            return Err("ERC20: transfer amount exceeds balance".to_string());
        }
        Ok(())
    }

    /// `transferFrom(owner -> spender)` on behalf of `spender`. Must be checked first.
    fn spend(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        let allowance = self.allowances.entry((token, owner, spender)).or_default();
        *allowance -= amount;
        let balance = self.balances.entry((token, owner)).or_default();
        *balance -= amount;
        *self.balances.entry((token, spender)).or_default() += amount;
    }

    fn credit(&mut self, token: Address, holder: Address, amount: U256) {
        *self.balances.entry((token, holder)).or_default() += amount;
    }
}

#[derive(Debug, Default)]
struct Faults {
    reject_at_finality: Vec<(CallKind, String)>,
    deny_submission: Option<String>,
    failing_reads: HashSet<ReadKind>,
}

#[derive(Debug)]
struct Inner {
    pool: Address,
    token1: Address,
    token2: Address,
    state: Mutex<ChainState>,
    faults: Mutex<Faults>,
    submissions: Mutex<Vec<LedgerCall>>,
    finality_open: watch::Sender<bool>,
    nonce: AtomicU64,
}

/// Simulated pool contract plus the two token contracts it trades.
///
/// Cloning shares the chain state. Writes take effect when their finality is
/// awaited, so a spend only sees allowances that are already confirmed.
#[derive(Debug, Clone)]
pub struct SandboxLedger {
    inner: Arc<Inner>,
    signer: Address,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SandboxLedger {
    /// Creates an empty pool at `pool` trading `token1`/`token2`, signing as `signer`.
    pub fn new(pool: Address, token1: Address, token2: Address, signer: Address) -> Self {
        let (finality_open, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                pool,
                token1,
                token2,
                state: Mutex::new(ChainState::default()),
                faults: Mutex::new(Faults::default()),
                submissions: Mutex::new(Vec::new()),
                finality_open,
                nonce: AtomicU64::new(0),
            }),
            signer,
        }
    }

    /// Same chain, different signing account.
    #[must_use]
    pub fn with_signer(&self, signer: Address) -> Self {
        Self {
            inner: self.inner.clone(),
            signer,
        }
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn pool_address(&self) -> Address {
        self.inner.pool
    }

    /// Credits `amount` of `token` to `holder`.
    pub fn mint(&self, token: Address, holder: Address, amount: Amount) {
        lock(&self.inner.state).credit(token, holder, amount.raw);
    }

    /// Sets reserves and share holdings directly, replacing any existing pool state.
    pub fn seed_pool(&self, reserve1: Amount, reserve2: Amount, holders: &[(Address, Amount)]) {
        let mut state = lock(&self.inner.state);
        state.reserve1 = reserve1.raw;
        state.reserve2 = reserve2.raw;
        state.shares = holders.iter().map(|(h, s)| (*h, s.raw)).collect();
        state.total_shares = holders
            .iter()
            .fold(U256::zero(), |acc, (_, s)| acc.saturating_add(s.raw));

        let pool = self.inner.pool;
        state.balances.insert((self.inner.token1, pool), reserve1.raw);
        state.balances.insert((self.inner.token2, pool), reserve2.raw);
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> Amount {
        Amount::from_base_units(lock(&self.inner.state).balance(token, holder))
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        Amount::from_base_units(lock(&self.inner.state).allowance(token, owner, spender))
    }

    /// Rejects the next submitted call of `kind` when its finality is awaited.
    pub fn reject_next(&self, kind: CallKind, reason: impl Into<String>) {
        lock(&self.inner.faults)
            .reject_at_finality
            .push((kind, reason.into()));
    }

    /// Refuses the next submission outright, as a wallet does when signing is denied.
    pub fn deny_next_submission(&self, reason: impl Into<String>) {
        lock(&self.inner.faults).deny_submission = Some(reason.into());
    }

    pub fn fail_read(&self, kind: ReadKind) {
        lock(&self.inner.faults).failing_reads.insert(kind);
    }

    pub fn restore_reads(&self) {
        lock(&self.inner.faults).failing_reads.clear();
    }

    /// Keeps every pending transaction unfinalised until [`Self::release_finality`].
    pub fn hold_finality(&self) {
        self.inner.finality_open.send_replace(false);
    }

    pub fn release_finality(&self) {
        self.inner.finality_open.send_replace(true);
    }

    /// Every call submitted so far, in submission order.
    pub fn submissions(&self) -> Vec<LedgerCall> {
        lock(&self.inner.submissions).clone()
    }

    fn check_read(&self, kind: ReadKind) -> Result<(), LedgerError> {
        if lock(&self.inner.faults).failing_reads.contains(&kind) {
            warn!(read = ?kind, "Sandbox read failure injected");
            return Err(LedgerError::Rpc(format!("{kind:?} query failed")));
        }
        Ok(())
    }

    fn submit(&self, call: LedgerCall) -> Result<PendingTx, LedgerError> {
        let injected = {
            let mut faults = lock(&self.inner.faults);
            if let Some(reason) = faults.deny_submission.take() {
                warn!(call = ?call, reason = %reason, "Sandbox submission denied");
                return Err(LedgerError::Rejected(reason));
            }
            let kind = call.kind();
            faults
                .reject_at_finality
                .iter()
                .position(|(k, _)| *k == kind)
                .map(|idx| faults.reject_at_finality.remove(idx).1)
        };

        lock(&self.inner.submissions).push(call);
        let nonce = self.inner.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = TxHash::from_low_u64_be(nonce);

        debug!(hash = ?hash, call = ?call, "Sandbox transaction submitted");

        Ok(Box::new(SandboxTx {
            ledger: self.clone(),
            call,
            hash,
            injected,
        }))
    }

    /// Executes `call` against the chain state, all-or-nothing.
    fn apply(&self, call: LedgerCall) -> Result<u64, String> {
        let mut state = lock(&self.inner.state);
        let signer = self.signer;
        let pool = self.inner.pool;
        let (token1, token2) = (self.inner.token1, self.inner.token2);

        match call {
            LedgerCall::Approve {
                token,
                spender,
                amount,
            } => {
                state.allowances.insert((token, signer, spender), amount.raw);
            }
            LedgerCall::Swap { amount, token1_in } => {
                let (token_in, token_out) = if token1_in {
                    (token1, token2)
                } else {
                    (token2, token1)
                };
                state.check_spend(token_in, signer, pool, amount.raw)?;
                let (out, after) = Reserves::new(state.reserve1, state.reserve2)
                    .swap(amount.raw, token1_in)
                    .map_err(str::to_string)?;

                state.spend(token_in, signer, pool, amount.raw);
                let pool_out = state.balances.entry((token_out, pool)).or_default();
                *pool_out = pool_out.saturating_sub(out);
                state.credit(token_out, signer, out);
                state.reserve1 = after.token1;
                state.reserve2 = after.token2;
            }
            LedgerCall::AddLiquidity { amount1, amount2 } => {
                state.check_spend(token1, signer, pool, amount1.raw)?;
                state.check_spend(token2, signer, pool, amount2.raw)?;
                let minted = calculate_minted_shares(
                    amount1.raw,
                    amount2.raw,
                    state.reserve1,
                    state.reserve2,
                    state.total_shares,
                )
                .map_err(str::to_string)?;
                if minted.is_zero() {
                    return Err("insufficient liquidity minted".to_string());
                }

                state.spend(token1, signer, pool, amount1.raw);
                state.spend(token2, signer, pool, amount2.raw);
                state.reserve1 += amount1.raw;
                state.reserve2 += amount2.raw;
                state.total_shares += minted;
                *state.shares.entry(signer).or_default() += minted;
            }
            LedgerCall::RemoveLiquidity { shares } => {
                let held = state.shares.get(&signer).copied().unwrap_or_default();
                if held < shares.raw {
                    return Err("insufficient shares".to_string());
                }
                let (amount1, amount2) = calculate_withdrawal(
                    shares.raw,
                    state.reserve1,
                    state.reserve2,
                    state.total_shares,
                )
                .map_err(str::to_string)?;

                *state.shares.entry(signer).or_default() -= shares.raw;
                state.total_shares -= shares.raw;
                state.reserve1 -= amount1;
                state.reserve2 -= amount2;
                for (token, amount) in [(token1, amount1), (token2, amount2)] {
                    let pool_balance = state.balances.entry((token, pool)).or_default();
                    *pool_balance = pool_balance.saturating_sub(amount);
                    state.credit(token, signer, amount);
                }
            }
        }

        state.block += 1;
        Ok(state.block)
    }
}

#[async_trait]
impl LedgerClient for SandboxLedger {
    async fn get_reserves(&self) -> Result<(Amount, Amount), LedgerError> {
        self.check_read(ReadKind::Reserves)?;
        let state = lock(&self.inner.state);
        Ok((
            Amount::from_base_units(state.reserve1),
            Amount::from_base_units(state.reserve2),
        ))
    }

    async fn total_shares(&self) -> Result<Amount, LedgerError> {
        self.check_read(ReadKind::TotalShares)?;
        Ok(Amount::from_base_units(lock(&self.inner.state).total_shares))
    }

    async fn shares_of(&self, account: Address) -> Result<Amount, LedgerError> {
        self.check_read(ReadKind::SharesOf)?;
        let state = lock(&self.inner.state);
        Ok(Amount::from_base_units(
            state.shares.get(&account).copied().unwrap_or_default(),
        ))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<PendingTx, LedgerError> {
        self.submit(LedgerCall::Approve {
            token,
            spender,
            amount,
        })
    }

    async fn swap(&self, amount: Amount, token1_in: bool) -> Result<PendingTx, LedgerError> {
        self.submit(LedgerCall::Swap { amount, token1_in })
    }

    async fn add_liquidity(
        &self,
        amount1: Amount,
        amount2: Amount,
    ) -> Result<PendingTx, LedgerError> {
        self.submit(LedgerCall::AddLiquidity { amount1, amount2 })
    }

    async fn remove_liquidity(&self, shares: Amount) -> Result<PendingTx, LedgerError> {
        self.submit(LedgerCall::RemoveLiquidity { shares })
    }
}

/// Pending transaction on the sandbox ledger.
struct SandboxTx {
    ledger: SandboxLedger,
    call: LedgerCall,
    hash: TxHash,
    injected: Option<String>,
}

#[async_trait]
impl TxHandle for SandboxTx {
    fn hash(&self) -> TxHash {
        self.hash
    }

    async fn await_finality(self: Box<Self>) -> Finality {
        let mut open = self.ledger.inner.finality_open.subscribe();
        // the sender lives in `Inner`, which this handle keeps alive
        let _ = open.wait_for(|open| *open).await;

        if let Some(reason) = self.injected {
            info!(hash = ?self.hash, reason = %reason, "Sandbox transaction rejected");
            return Finality::Rejected { reason };
        }

        match self.ledger.apply(self.call) {
            Ok(block) => {
                debug!(hash = ?self.hash, block, "Sandbox transaction confirmed");
                Finality::Confirmed { block }
            }
            Err(reason) => {
                info!(hash = ?self.hash, reason = %reason, "Sandbox transaction reverted");
                Finality::Rejected { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn ledger() -> SandboxLedger {
        let ledger = SandboxLedger::new(addr(0xaa), addr(1), addr(2), addr(0x10));
        ledger.mint(addr(1), addr(0x10), amount("100"));
        ledger.mint(addr(2), addr(0x10), amount("100"));
        ledger
    }

    #[tokio::test]
    async fn test_approve_is_idempotent() {
        let ledger = ledger();
        for _ in 0..2 {
            let tx = ledger.approve(addr(1), addr(0xaa), amount("5")).await.unwrap();
            assert!(tx.await_finality().await.is_confirmed());
        }
        assert_eq!(ledger.allowance(addr(1), addr(0x10), addr(0xaa)), amount("5"));
    }

    #[tokio::test]
    async fn test_add_liquidity_requires_allowance() {
        let ledger = ledger();
        let tx = ledger.add_liquidity(amount("5"), amount("5")).await.unwrap();
        assert_eq!(
            tx.await_finality().await,
            Finality::Rejected {
                reason: "ERC20: insufficient allowance".to_string()
            }
        );
        assert_eq!(ledger.total_shares().await.unwrap(), Amount::zero());
    }

    #[tokio::test]
    async fn test_add_then_remove_liquidity() {
        let ledger = ledger();
        for token in [addr(1), addr(2)] {
            let tx = ledger.approve(token, addr(0xaa), amount("4")).await.unwrap();
            tx.await_finality().await;
        }
        let tx = ledger.add_liquidity(amount("4"), amount("4")).await.unwrap();
        assert!(tx.await_finality().await.is_confirmed());

        let shares = ledger.shares_of(addr(0x10)).await.unwrap();
        assert_eq!(shares, amount("4"));
        assert_eq!(ledger.get_reserves().await.unwrap(), (amount("4"), amount("4")));

        let tx = ledger.remove_liquidity(amount("1")).await.unwrap();
        assert!(tx.await_finality().await.is_confirmed());
        assert_eq!(ledger.balance_of(addr(1), addr(0x10)), amount("97"));
        assert_eq!(ledger.total_shares().await.unwrap(), amount("3"));

        let tx = ledger.remove_liquidity(amount("10")).await.unwrap();
        assert_eq!(
            tx.await_finality().await,
            Finality::Rejected {
                reason: "insufficient shares".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_swap_moves_reserves() {
        let ledger = ledger();
        ledger.seed_pool(amount("1000"), amount("1000"), &[(addr(0x20), amount("1000"))]);

        let tx = ledger.approve(addr(1), addr(0xaa), amount("10")).await.unwrap();
        tx.await_finality().await;
        let tx = ledger.swap(amount("10"), true).await.unwrap();
        assert!(tx.await_finality().await.is_confirmed());

        let (reserve1, reserve2) = ledger.get_reserves().await.unwrap();
        assert_eq!(reserve1, amount("1010"));
        assert!(reserve2 < amount("1000"));
        assert!(ledger.balance_of(addr(2), addr(0x10)) > amount("100"));
        assert_eq!(ledger.allowance(addr(1), addr(0x10), addr(0xaa)), Amount::zero());
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let ledger = ledger();
        ledger.reject_next(CallKind::Approve(addr(2)), "nope");
        ledger.deny_next_submission("user rejected");

        let denied = ledger.approve(addr(1), addr(0xaa), amount("1")).await;
        assert_eq!(denied.err(), Some(LedgerError::Rejected("user rejected".into())));

        let tx = ledger.approve(addr(1), addr(0xaa), amount("1")).await.unwrap();
        assert!(tx.await_finality().await.is_confirmed());
        let tx = ledger.approve(addr(2), addr(0xaa), amount("1")).await.unwrap();
        assert!(!tx.await_finality().await.is_confirmed());

        // only the accepted submissions are recorded
        assert_eq!(ledger.submissions().len(), 2);

        ledger.fail_read(ReadKind::TotalShares);
        assert!(ledger.total_shares().await.is_err());
        assert!(ledger.get_reserves().await.is_ok());
        ledger.restore_reads();
        assert!(ledger.total_shares().await.is_ok());
    }

    #[tokio::test]
    async fn test_hold_finality() {
        let ledger = ledger();
        ledger.hold_finality();
        let tx = ledger.approve(addr(1), addr(0xaa), amount("1")).await.unwrap();
        let waiting = tokio::spawn(tx.await_finality());

        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());

        ledger.release_finality();
        assert!(waiting.await.unwrap().is_confirmed());
    }
}
