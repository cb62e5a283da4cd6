//! Constant product AMM math (x·y=k)

use crate::{AmmError, FEE_DENOMINATOR, GENESIS_SHARES};

#[inline]
fn mul(a: u128, b: u128) -> Result<u128, AmmError> {
    a.checked_mul(b).ok_or(AmmError::Overflow)
}

#[inline]
fn require_liquidity(reserve_a: u128, reserve_b: u128) -> Result<(), AmmError> {
    if reserve_a == 0 || reserve_b == 0 {
        return Err(AmmError::ZeroLiquidity);
    }
    Ok(())
}

/// Fee-adjusted swap input: `(1000 - fee) * amount_in / 1000`
///
/// The withheld part (plus the division remainder) never enters the pricing
/// formula but is still added to reserves by the caller, which is how the
/// fee accrues to liquidity providers.
pub fn effective_input(fee: u128, amount_in: u128) -> Result<u128, AmmError> {
    let multiplier = FEE_DENOMINATOR
        .checked_sub(fee)
        .ok_or(AmmError::InvalidFee)?;
    Ok(mul(multiplier, amount_in)? / FEE_DENOMINATOR)
}

/// Shares minted for depositing `amount1`/`amount2`
///
/// - Empty pool (`total_shares == 0`): the genesis deposit gets
///   `GENESIS_SHARES` and fixes the price ratio.
/// - Otherwise both amounts must imply the same floor-divided share count.
///
/// # Errors
/// * `NonEquivalentValue` - amounts are not in the reserve ratio
/// * `ThresholdNotReached` - share rounds to zero
/// * `ZeroLiquidity` - shares outstanding but a reserve is empty
pub fn shares_for_deposit(
    total_shares: u128,
    reserve1: u128,
    reserve2: u128,
    amount1: u128,
    amount2: u128,
) -> Result<u128, AmmError> {
    let share = if total_shares == 0 {
        GENESIS_SHARES
    } else {
        require_liquidity(reserve1, reserve2)?;

        let share1 = mul(total_shares, amount1)? / reserve1;
        let share2 = mul(total_shares, amount2)? / reserve2;
        if share1 != share2 {
            return Err(AmmError::NonEquivalentValue);
        }
        share1
    };

    if share == 0 {
        return Err(AmmError::ThresholdNotReached);
    }
    Ok(share)
}

/// Reserve amounts released by burning `share`
///
/// Returns `(share * reserve1 / total_shares, share * reserve2 / total_shares)`.
/// Floor division always rounds in favour of the pool.
pub fn withdraw_amounts(
    total_shares: u128,
    reserve1: u128,
    reserve2: u128,
    share: u128,
) -> Result<(u128, u128), AmmError> {
    require_liquidity(reserve1, reserve2)?;
    if total_shares == 0 {
        return Err(AmmError::ZeroLiquidity);
    }
    if share > total_shares {
        return Err(AmmError::InvalidShare);
    }

    let amount1 = mul(share, reserve1)? / total_shares;
    let amount2 = mul(share, reserve2)? / total_shares;
    Ok((amount1, amount2))
}

/// Amount of the wanted asset matching `amount` of the given asset at the
/// current reserve ratio: `reserve_want * amount / reserve_given`
pub fn equivalent_amount(
    reserve_given: u128,
    reserve_want: u128,
    amount: u128,
) -> Result<u128, AmmError> {
    require_liquidity(reserve_given, reserve_want)?;
    Ok(mul(reserve_want, amount)? / reserve_given)
}

/// Output received for an exact input
///
/// - x1 = x0 + Δx_in·(1000 - fee)/1000
/// - y1 = (x0·y0) / x1
/// - Δy_out = y0 - y1
///
/// If the output would drain the whole output reserve it is reduced by one.
///
/// # Arguments
/// * `reserve_in` - Reserve of the asset paid in
/// * `reserve_out` - Reserve of the asset paid out
/// * `fee` - Fee in thousandths
/// * `amount_in` - Amount paid in
pub fn quote_out_given_in(
    reserve_in: u128,
    reserve_out: u128,
    fee: u128,
    amount_in: u128,
) -> Result<u128, AmmError> {
    require_liquidity(reserve_in, reserve_out)?;

    let dx_net = effective_input(fee, amount_in)?;
    let k = mul(reserve_in, reserve_out)?;

    let x1 = reserve_in.checked_add(dx_net).ok_or(AmmError::Overflow)?;
    let y1 = k / x1;

    let mut dy_out = reserve_out.checked_sub(y1).ok_or(AmmError::Overflow)?;
    if dy_out == reserve_out {
        dy_out -= 1;
    }
    Ok(dy_out)
}

/// Input required for an exact output
///
/// - y1 = y0 - Δy_out
/// - x1 = (x0·y0) / y1
/// - Δx_in = (x1 - x0)·1000 / (1000 - fee)
///
/// # Errors
/// * `InsufficientLiquidity` - `amount_out` would drain the output reserve
pub fn quote_in_given_out(
    reserve_in: u128,
    reserve_out: u128,
    fee: u128,
    amount_out: u128,
) -> Result<u128, AmmError> {
    require_liquidity(reserve_in, reserve_out)?;
    if amount_out >= reserve_out {
        return Err(AmmError::InsufficientLiquidity);
    }

    let fee_divisor = FEE_DENOMINATOR
        .checked_sub(fee)
        .filter(|d| *d > 0)
        .ok_or(AmmError::InvalidFee)?;

    let k = mul(reserve_in, reserve_out)?;
    let y1 = reserve_out - amount_out;
    let x1 = k / y1;

    let dx_gross = x1.checked_sub(reserve_in).ok_or(AmmError::Overflow)?;
    Ok(mul(dx_gross, FEE_DENOMINATOR)? / fee_divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PRECISION;

    #[test]
    fn test_genesis_deposit_mints_fixed_shares() {
        assert_eq!(shares_for_deposit(0, 0, 0, 10, 20), Ok(100 * PRECISION));
        // Ratio is free on genesis
        assert_eq!(shares_for_deposit(0, 0, 0, 1, 999), Ok(GENESIS_SHARES));
    }

    #[test]
    fn test_proportional_deposit() {
        // Pool at 10:20 with 100M shares, depositing 1:2 mints 10M
        let share = shares_for_deposit(100_000_000, 10, 20, 1, 2).unwrap();
        assert_eq!(share, 10_000_000);
    }

    #[test]
    fn test_non_equivalent_deposit() {
        let result = shares_for_deposit(100_000_000, 10, 20, 1, 3);
        assert_eq!(result, Err(AmmError::NonEquivalentValue));
    }

    #[test]
    fn test_threshold_not_reached() {
        // 1 share outstanding against huge reserves rounds to zero
        let result = shares_for_deposit(1, 1_000, 2_000, 1, 2);
        assert_eq!(result, Err(AmmError::ThresholdNotReached));
    }

    #[test]
    fn test_withdraw_amounts_floor() {
        assert_eq!(withdraw_amounts(100_000_000, 10, 20, 20_000_000), Ok((2, 4)));
        // 1/3 of the pool floors both sides
        assert_eq!(withdraw_amounts(3, 10, 20, 1), Ok((3, 6)));
        assert_eq!(withdraw_amounts(3, 10, 20, 4), Err(AmmError::InvalidShare));
        assert_eq!(withdraw_amounts(0, 0, 0, 1), Err(AmmError::ZeroLiquidity));
    }

    #[test]
    fn test_equivalent_amount() {
        assert_eq!(equivalent_amount(20, 10, 5), Ok(2));
        assert_eq!(equivalent_amount(10, 20, 5), Ok(10));
        assert_eq!(equivalent_amount(0, 20, 5), Err(AmmError::ZeroLiquidity));
    }

    #[test]
    fn test_quote_out_no_fee() {
        // x=50, y=100, sell 50 -> x1=100, y1=50
        assert_eq!(quote_out_given_in(50, 100, 0, 50), Ok(50));
    }

    #[test]
    fn test_quote_out_with_fee() {
        // fee 10%: effective 45, x1=95, y1=5000/95=52
        assert_eq!(quote_out_given_in(50, 100, 100, 50), Ok(48));
    }

    #[test]
    fn test_quote_out_never_drains_reserve() {
        // Enormous input floors y1 to zero; output is capped one below reserve
        let out = quote_out_given_in(1, 100, 0, 1_000_000).unwrap();
        assert_eq!(out, 99);
    }

    #[test]
    fn test_quote_in_given_out() {
        // y1 = 50, x1 = 5000/50 = 100, dx = 50
        assert_eq!(quote_in_given_out(50, 100, 0, 50), Ok(50));
        // fee 10%: 50 * 1000 / 900 = 55
        assert_eq!(quote_in_given_out(50, 100, 100, 50), Ok(55));
    }

    #[test]
    fn test_quote_in_insufficient_liquidity() {
        assert_eq!(
            quote_in_given_out(50, 100, 0, 100),
            Err(AmmError::InsufficientLiquidity)
        );
        assert_eq!(
            quote_in_given_out(50, 100, 0, 101),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_fee_out_of_range() {
        assert_eq!(effective_input(1_001, 10), Err(AmmError::InvalidFee));
        assert_eq!(quote_in_given_out(50, 100, 1_000, 10), Err(AmmError::InvalidFee));
    }

    #[test]
    fn test_overflow_is_reported() {
        let big = u128::MAX / 2;
        assert_eq!(quote_out_given_in(big, big, 0, 1), Err(AmmError::Overflow));
    }

    #[test]
    fn test_invariant_increases_with_fees() {
        let x0: u128 = 1_000 * PRECISION;
        let y0: u128 = 60_000 * PRECISION;
        let k = x0 * y0;

        let dx = 50 * PRECISION;
        let dy = quote_out_given_in(x0, y0, 3, dx).unwrap();

        // Full input lands in reserves
        assert!((x0 + dx) * (y0 - dy) > k, "Invariant should increase due to fees");
    }
}
