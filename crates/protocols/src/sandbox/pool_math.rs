//! Share and reserve accounting of the simulated pool contract.

use primitive_types::{U256, U512};

/// Swap fee charged by the simulated pool, in basis points.
pub const SWAP_FEE_BPS: u32 = 30;

/// Basis-point denominator.
const BPS: u64 = 10_000;

/// Token balances the simulated pool prices against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reserves {
    pub token1: U256,
    pub token2: U256,
}

impl Reserves {
    pub fn new(token1: U256, token2: U256) -> Self {
        Self { token1, token2 }
    }

    /// Sells `amount_in` of token1 (or token2 when `token1_in` is false).
    ///
    /// Returns the amount paid out and the reserves after the trade. The fee
    /// stays in the pool, so `token1 * token2` never decreases.
    pub fn swap(self, amount_in: U256, token1_in: bool) -> Result<(U256, Reserves), &'static str> {
        let (reserve_in, reserve_out) = if token1_in {
            (self.token1, self.token2)
        } else {
            (self.token2, self.token1)
        };
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err("insufficient liquidity");
        }

        // out = reserve_out * in' / (reserve_in + in'), in' = in * (1 - fee), in U512
        let taxed_in = U512::from(amount_in) * U512::from(BPS - u64::from(SWAP_FEE_BPS));
        let scaled_reserve_in = U512::from(reserve_in) * U512::from(BPS);
        let out = U512::from(reserve_out) * taxed_in / (scaled_reserve_in + taxed_in);
        let out = U256::try_from(out).map_err(|_| "overflow")?;
        if out.is_zero() {
            return Err("insufficient output amount");
        }

        let grown_in = reserve_in.checked_add(amount_in).ok_or("overflow")?;
        let shrunk_out = reserve_out - out;
        let after = if token1_in {
            Reserves::new(grown_in, shrunk_out)
        } else {
            Reserves::new(shrunk_out, grown_in)
        };
        Ok((out, after))
    }
}

/// Shares minted for a deposit of `amount1`/`amount2`.
///
/// The first deposit mints `sqrt(amount1 * amount2)`; later deposits mint the
/// smaller of the two proportional claims, so surplus of either token is donated.
pub fn calculate_minted_shares(
    amount1: U256,
    amount2: U256,
    reserve1: U256,
    reserve2: U256,
    total_shares: U256,
) -> Result<U256, &'static str> {
    if total_shares.is_zero() {
        let product = amount1.checked_mul(amount2).ok_or("Overflow")?;
        return Ok(product.integer_sqrt());
    }
    if reserve1.is_zero() || reserve2.is_zero() {
        return Err("Reserves must be non-zero");
    }

    let by_token1 = amount1.checked_mul(total_shares).ok_or("Overflow")? / reserve1;
    let by_token2 = amount2.checked_mul(total_shares).ok_or("Overflow")? / reserve2;
    Ok(by_token1.min(by_token2))
}

/// Token amounts paid out for burning `shares`.
pub fn calculate_withdrawal(
    shares: U256,
    reserve1: U256,
    reserve2: U256,
    total_shares: U256,
) -> Result<(U256, U256), &'static str> {
    if total_shares.is_zero() {
        return Err("Pool has no shares");
    }
    let amount1 = shares.checked_mul(reserve1).ok_or("Overflow")? / total_shares;
    let amount2 = shares.checked_mul(reserve2).ok_or("Overflow")? / total_shares;
    Ok((amount1, amount2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_pays_out_after_fee() {
        // 10 in at 1000/1000: 1000 * 99700 / (10_000_000 + 99700) = 9.87 -> 9
        let reserves = Reserves::new(1000u64.into(), 1000u64.into());
        let (out, after) = reserves.swap(10u64.into(), true).unwrap();
        assert_eq!(out.as_u64(), 9);
        assert_eq!(after, Reserves::new(1010u64.into(), 991u64.into()));
    }

    #[test]
    fn test_reverse_swap_moves_other_side() {
        let reserves = Reserves::new(1000u64.into(), 4000u64.into());
        let (out, after) = reserves.swap(400u64.into(), false).unwrap();
        assert_eq!(after.token2.as_u64(), 4400);
        assert_eq!(after.token1, reserves.token1 - out);
        assert!(after.token1 * after.token2 >= reserves.token1 * reserves.token2);
    }

    #[test]
    fn test_swap_rejects_empty_pool_and_dust() {
        let empty = Reserves::new(U256::zero(), 1000u64.into());
        assert_eq!(empty.swap(10u64.into(), true), Err("insufficient liquidity"));

        let reserves = Reserves::new(1000u64.into(), 1000u64.into());
        assert_eq!(reserves.swap(1u64.into(), true), Err("insufficient output amount"));
    }

    #[test]
    fn test_first_deposit_mints_geometric_mean() {
        let shares = calculate_minted_shares(
            400u64.into(),
            100u64.into(),
            U256::zero(),
            U256::zero(),
            U256::zero(),
        )
        .unwrap();
        assert_eq!(shares.as_u64(), 200);
    }

    #[test]
    fn test_later_deposit_mints_smaller_claim() {
        // pool 1000/2000 with 1000 shares; deposit 100/100 -> min(100, 50)
        let shares = calculate_minted_shares(
            100u64.into(),
            100u64.into(),
            1000u64.into(),
            2000u64.into(),
            1000u64.into(),
        )
        .unwrap();
        assert_eq!(shares.as_u64(), 50);
    }

    #[test]
    fn test_withdrawal_is_proportional() {
        let (a, b) =
            calculate_withdrawal(250u64.into(), 1000u64.into(), 3000u64.into(), 1000u64.into())
                .unwrap();
        assert_eq!((a.as_u64(), b.as_u64()), (250, 750));
    }
}
