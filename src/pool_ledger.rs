//! Constant-Product Pool Ledger
//!
//! Accounting core of a two-asset automated market maker:
//! 1. Liquidity providers deposit both assets in the current reserve ratio and
//!    receive proportional shares
//! 2. Shares are burned for a floor-divided slice of both reserves
//! 3. Swaps are priced on x·y=k with a fee withheld from the input
//! 4. Every operation validates fully before its first write, so a failed
//!    call leaves the ledger untouched
//!
//! The ledger is an explicit value. Hosts own it, pass the caller identity to
//! every mutating call, and are responsible for persisting it between calls.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(kani)]
extern crate kani;

extern crate alloc;
use alloc::collections::BTreeMap;
use core::fmt;

use log::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use amm_model::{self, AmmError, FEE_DENOMINATOR, GENESIS_SHARES, PRECISION};

// ============================================================================
// Core Data Structures
// ============================================================================

/// Direction of a swap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SwapDirection {
    /// Pay token1, receive token2
    Token1ToToken2,
    /// Pay token2, receive token1
    Token2ToToken1,
}

impl SwapDirection {
    fn assets(self) -> (Asset, Asset) {
        match self {
            SwapDirection::Token1ToToken2 => (Asset::Token1, Asset::Token2),
            SwapDirection::Token2ToToken1 => (Asset::Token2, Asset::Token1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Asset {
    Token1,
    Token2,
}

/// Free balances and shares of one account
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Holdings {
    /// Un-pooled token1 balance
    pub token1: u128,
    /// Un-pooled token2 balance
    pub token2: u128,
    /// Liquidity shares
    pub shares: u128,
}

/// Reserves, outstanding shares and fee of the pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolDetails {
    pub total_token1: u128,
    pub total_token2: u128,
    pub total_shares: u128,
    /// Fee in thousandths of the swap input
    pub fee: u128,
}

/// Pool ledger state - generic over the caller identity type
///
/// # Invariants
/// - `total_shares` equals the sum of every entry in `shares`
/// - `total_token1 == 0 ⇔ total_token2 == 0 ⇔ total_shares == 0`
/// - `fee < FEE_DENOMINATOR`
///
/// Balance maps treat an absent account as zero; entries that reach zero are
/// dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "A: serde::Serialize",
        deserialize = "A: Ord + serde::Deserialize<'de>"
    ))
)]
pub struct Pool<A> {
    /// Liquidity shares outstanding
    total_shares: u128,

    /// Token1 reserve held by the pool
    total_token1: u128,

    /// Token2 reserve held by the pool
    total_token2: u128,

    /// Shares per account
    shares: BTreeMap<A, u128>,

    /// Free token1 per account
    token1_balance: BTreeMap<A, u128>,

    /// Free token2 per account
    token2_balance: BTreeMap<A, u128>,

    /// Trading fee in thousandths, fixed at construction
    fee: u128,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// Price-dependent operation on an empty pool
    ZeroLiquidity,

    /// Amount must be positive
    ZeroAmount,

    /// Caller's balance is below the requested amount
    InsufficientAmount,

    /// Deposit amounts are not in the current reserve ratio
    NonEquivalentValue,

    /// Share issuance rounds to zero
    ThresholdNotReached,

    /// Share exceeds total outstanding shares
    InvalidShare,

    /// Requested output would drain the reserve
    InsufficientLiquidity,

    /// Realized price is worse than the caller's bound
    SlippageExceeded,

    /// Stored fee is not below the fee denominator
    InvalidFee,

    /// Arithmetic overflow
    Overflow,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::ZeroLiquidity => write!(f, "Pool has zero liquidity"),
            PoolError::ZeroAmount => write!(f, "Amount cannot be zero"),
            PoolError::InsufficientAmount => write!(f, "Insufficient balance for amount"),
            PoolError::NonEquivalentValue => {
                write!(f, "Amounts are not equivalent to the current reserve ratio")
            }
            PoolError::ThresholdNotReached => write!(f, "Share issuance rounds to zero"),
            PoolError::InvalidShare => write!(f, "Share exceeds total shares"),
            PoolError::InsufficientLiquidity => write!(f, "Insufficient liquidity in pool"),
            PoolError::SlippageExceeded => write!(f, "Slippage tolerance exceeded"),
            PoolError::InvalidFee => write!(f, "Fee must be below {}", FEE_DENOMINATOR),
            PoolError::Overflow => write!(f, "Arithmetic overflow"),
        }
    }
}

impl core::error::Error for PoolError {}

impl From<AmmError> for PoolError {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::ZeroLiquidity => PoolError::ZeroLiquidity,
            AmmError::NonEquivalentValue => PoolError::NonEquivalentValue,
            AmmError::ThresholdNotReached => PoolError::ThresholdNotReached,
            AmmError::InvalidShare => PoolError::InvalidShare,
            AmmError::InsufficientLiquidity => PoolError::InsufficientLiquidity,
            AmmError::InvalidFee => PoolError::InvalidFee,
            AmmError::Overflow => PoolError::Overflow,
        }
    }
}

pub type Result<T> = core::result::Result<T, PoolError>;

// ============================================================================
// Balance Helpers (absent entry reads as zero)
// ============================================================================

#[inline]
fn balance_of<A: Ord>(ledger: &BTreeMap<A, u128>, account: &A) -> u128 {
    ledger.get(account).copied().unwrap_or(0)
}

#[inline]
fn write_balance<A: Ord + Clone>(ledger: &mut BTreeMap<A, u128>, account: &A, value: u128) {
    if value == 0 {
        ledger.remove(account);
    } else {
        ledger.insert(account.clone(), value);
    }
}

/// Checks `amount` against the caller's balance and returns that balance
#[inline]
fn valid_amount<A: Ord>(ledger: &BTreeMap<A, u128>, account: &A, amount: u128) -> Result<u128> {
    if amount == 0 {
        return Err(PoolError::ZeroAmount);
    }
    let balance = balance_of(ledger, account);
    if amount > balance {
        return Err(PoolError::InsufficientAmount);
    }
    Ok(balance)
}

#[inline]
fn add_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

#[inline]
fn sub_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(PoolError::Overflow)
}

// ============================================================================
// Initialization and Views
// ============================================================================

impl<A> Pool<A>
where
    A: Ord + Clone + fmt::Debug,
{
    /// Create an empty pool
    ///
    /// A fee outside `[0, 1000)` is silently replaced by 0.
    pub fn new(fee: u128) -> Self {
        let fee = if fee < FEE_DENOMINATOR {
            fee
        } else {
            warn!("fee {} out of range, pool created with zero fee", fee);
            0
        };

        Self {
            total_shares: 0,
            total_token1: 0,
            total_token2: 0,
            shares: BTreeMap::new(),
            token1_balance: BTreeMap::new(),
            token2_balance: BTreeMap::new(),
            fee,
        }
    }

    pub fn fee(&self) -> u128 {
        self.fee
    }

    /// True once a genesis deposit has seeded the pool
    pub fn is_active(&self) -> bool {
        self.total_token1 != 0 && self.total_token2 != 0
    }

    pub fn get_holdings(&self, account: &A) -> Holdings {
        Holdings {
            token1: balance_of(&self.token1_balance, account),
            token2: balance_of(&self.token2_balance, account),
            shares: balance_of(&self.shares, account),
        }
    }

    pub fn get_pool_details(&self) -> PoolDetails {
        PoolDetails {
            total_token1: self.total_token1,
            total_token2: self.total_token2,
            total_shares: self.total_shares,
            fee: self.fee,
        }
    }

    /// Accounts holding shares, in key order
    pub fn liquidity_providers(&self) -> impl Iterator<Item = (&A, u128)> + '_ {
        self.shares.iter().map(|(account, share)| (account, *share))
    }

    /// Verify the ledger invariants
    ///
    /// - Σ shares == total_shares
    /// - reserves and shares are all zero or all non-zero
    /// - fee below the denominator
    pub fn check_invariants(&self) -> bool {
        let mut sum = 0u128;
        for share in self.shares.values() {
            sum = match sum.checked_add(*share) {
                Some(s) => s,
                None => return false,
            };
        }

        let empty1 = self.total_token1 == 0;
        let empty2 = self.total_token2 == 0;
        let no_shares = self.total_shares == 0;

        sum == self.total_shares
            && empty1 == empty2
            && empty2 == no_shares
            && self.fee < FEE_DENOMINATOR
    }

    fn require_active(&self) -> Result<()> {
        if !self.is_active() {
            return Err(PoolError::ZeroLiquidity);
        }
        Ok(())
    }

    fn reserve(&self, asset: Asset) -> u128 {
        match asset {
            Asset::Token1 => self.total_token1,
            Asset::Token2 => self.total_token2,
        }
    }

    fn set_reserve(&mut self, asset: Asset, value: u128) {
        match asset {
            Asset::Token1 => self.total_token1 = value,
            Asset::Token2 => self.total_token2 = value,
        }
    }

    fn balances(&self, asset: Asset) -> &BTreeMap<A, u128> {
        match asset {
            Asset::Token1 => &self.token1_balance,
            Asset::Token2 => &self.token2_balance,
        }
    }

    fn balances_mut(&mut self, asset: Asset) -> &mut BTreeMap<A, u128> {
        match asset {
            Asset::Token1 => &mut self.token1_balance,
            Asset::Token2 => &mut self.token2_balance,
        }
    }
}

// ============================================================================
// Account Operations
// ============================================================================

impl<A> Pool<A>
where
    A: Ord + Clone + fmt::Debug,
{
    /// Credit free balances to `account`
    ///
    /// Test allocator standing in for an external issuance mechanism: no cap,
    /// no validation beyond overflow.
    pub fn faucet(&mut self, account: &A, amount1: u128, amount2: u128) -> Result<()> {
        let new_balance1 = add_u128(balance_of(&self.token1_balance, account), amount1)?;
        let new_balance2 = add_u128(balance_of(&self.token2_balance, account), amount2)?;

        write_balance(&mut self.token1_balance, account, new_balance1);
        write_balance(&mut self.token2_balance, account, new_balance2);

        trace!("faucet {:?}: +{} token1, +{} token2", account, amount1, amount2);
        Ok(())
    }

    /// Deposit both assets and mint liquidity shares
    ///
    /// The first deposit into an empty pool mints `GENESIS_SHARES` and fixes
    /// the price. Later deposits must match the reserve ratio exactly under
    /// floor division, otherwise `NonEquivalentValue`.
    ///
    /// # Returns
    /// Shares minted
    pub fn provide(&mut self, account: &A, amount1: u128, amount2: u128) -> Result<u128> {
        let balance1 = valid_amount(&self.token1_balance, account, amount1)?;
        let balance2 = valid_amount(&self.token2_balance, account, amount2)?;

        let share = amm_model::shares_for_deposit(
            self.total_shares,
            self.total_token1,
            self.total_token2,
            amount1,
            amount2,
        )?;

        let total_token1 = add_u128(self.total_token1, amount1)?;
        let total_token2 = add_u128(self.total_token2, amount2)?;
        let total_shares = add_u128(self.total_shares, share)?;
        let account_shares = add_u128(balance_of(&self.shares, account), share)?;

        // Commit
        write_balance(&mut self.token1_balance, account, balance1 - amount1);
        write_balance(&mut self.token2_balance, account, balance2 - amount2);
        self.total_token1 = total_token1;
        self.total_token2 = total_token2;
        self.total_shares = total_shares;
        write_balance(&mut self.shares, account, account_shares);

        debug!(
            "provide {:?}: {} token1 + {} token2 -> {} shares",
            account, amount1, amount2, share
        );
        Ok(share)
    }

    /// Burn `share` and release the matching slice of both reserves
    ///
    /// # Returns
    /// `(amount1, amount2)` credited to the caller's free balances
    pub fn withdraw(&mut self, account: &A, share: u128) -> Result<(u128, u128)> {
        let account_shares = valid_amount(&self.shares, account, share)?;
        let (amount1, amount2) = self.estimate_withdraw(share)?;

        let total_token1 = sub_u128(self.total_token1, amount1)?;
        let total_token2 = sub_u128(self.total_token2, amount2)?;
        let total_shares = sub_u128(self.total_shares, share)?;
        let balance1 = add_u128(balance_of(&self.token1_balance, account), amount1)?;
        let balance2 = add_u128(balance_of(&self.token2_balance, account), amount2)?;

        // Commit
        write_balance(&mut self.shares, account, account_shares - share);
        self.total_shares = total_shares;
        self.total_token1 = total_token1;
        self.total_token2 = total_token2;
        write_balance(&mut self.token1_balance, account, balance1);
        write_balance(&mut self.token2_balance, account, balance2);

        debug!(
            "withdraw {:?}: {} shares -> {} token1 + {} token2",
            account, share, amount1, amount2
        );
        Ok((amount1, amount2))
    }
}

// ============================================================================
// Estimates and Quotes (read-only)
// ============================================================================

impl<A> Pool<A>
where
    A: Ord + Clone + fmt::Debug,
{
    /// Token1 needed alongside `amount2` token2 for a balanced deposit
    pub fn estimate_token1_for(&self, amount2: u128) -> Result<u128> {
        self.require_active()?;
        Ok(amm_model::equivalent_amount(self.total_token2, self.total_token1, amount2)?)
    }

    /// Token2 needed alongside `amount1` token1 for a balanced deposit
    pub fn estimate_token2_for(&self, amount1: u128) -> Result<u128> {
        self.require_active()?;
        Ok(amm_model::equivalent_amount(self.total_token1, self.total_token2, amount1)?)
    }

    /// Amounts released by burning `share`, without burning it
    pub fn estimate_withdraw(&self, share: u128) -> Result<(u128, u128)> {
        self.require_active()?;
        Ok(amm_model::withdraw_amounts(
            self.total_shares,
            self.total_token1,
            self.total_token2,
            share,
        )?)
    }

    /// Output paid for an exact input in `direction`
    pub fn quote_exact_in(&self, direction: SwapDirection, amount_in: u128) -> Result<u128> {
        self.require_active()?;
        let (asset_in, asset_out) = direction.assets();
        Ok(amm_model::quote_out_given_in(
            self.reserve(asset_in),
            self.reserve(asset_out),
            self.fee,
            amount_in,
        )?)
    }

    /// Input required for an exact output in `direction`
    pub fn quote_exact_out(&self, direction: SwapDirection, amount_out: u128) -> Result<u128> {
        self.require_active()?;
        let (asset_in, asset_out) = direction.assets();
        Ok(amm_model::quote_in_given_out(
            self.reserve(asset_in),
            self.reserve(asset_out),
            self.fee,
            amount_out,
        )?)
    }

    pub fn quote_token2_given_token1_in(&self, amount1_in: u128) -> Result<u128> {
        self.quote_exact_in(SwapDirection::Token1ToToken2, amount1_in)
    }

    pub fn quote_token1_given_token2_in(&self, amount2_in: u128) -> Result<u128> {
        self.quote_exact_in(SwapDirection::Token2ToToken1, amount2_in)
    }

    pub fn quote_token1_given_token2_out(&self, amount2_out: u128) -> Result<u128> {
        self.quote_exact_out(SwapDirection::Token1ToToken2, amount2_out)
    }

    pub fn quote_token2_given_token1_out(&self, amount1_out: u128) -> Result<u128> {
        self.quote_exact_out(SwapDirection::Token2ToToken1, amount1_out)
    }
}

// ============================================================================
// Swaps
// ============================================================================

impl<A> Pool<A>
where
    A: Ord + Clone + fmt::Debug,
{
    /// Swap an exact input for at least `min_out`
    ///
    /// The full `amount_in` is added to the input reserve; only the
    /// fee-adjusted part is priced, which is how fees accrue.
    ///
    /// # Returns
    /// Output amount credited to the caller
    pub fn swap_exact_in(
        &mut self,
        account: &A,
        direction: SwapDirection,
        amount_in: u128,
        min_out: u128,
    ) -> Result<u128> {
        let (asset_in, _) = direction.assets();
        let balance_in = valid_amount(self.balances(asset_in), account, amount_in)?;

        let amount_out = self.quote_exact_in(direction, amount_in)?;
        if amount_out < min_out {
            debug!(
                "swap rejected: {} out below minimum {} ({:?})",
                amount_out, min_out, direction
            );
            return Err(PoolError::SlippageExceeded);
        }

        self.settle_swap(account, direction, balance_in, amount_in, amount_out)?;
        Ok(amount_out)
    }

    /// Swap at most `max_in` for an exact output
    ///
    /// # Returns
    /// Input amount debited from the caller
    pub fn swap_exact_out(
        &mut self,
        account: &A,
        direction: SwapDirection,
        amount_out: u128,
        max_in: u128,
    ) -> Result<u128> {
        let amount_in = self.quote_exact_out(direction, amount_out)?;
        if amount_in > max_in {
            debug!(
                "swap rejected: {} in above maximum {} ({:?})",
                amount_in, max_in, direction
            );
            return Err(PoolError::SlippageExceeded);
        }

        let (asset_in, _) = direction.assets();
        let balance_in = valid_amount(self.balances(asset_in), account, amount_in)?;

        self.settle_swap(account, direction, balance_in, amount_in, amount_out)?;
        Ok(amount_in)
    }

    pub fn swap_exact_token1(
        &mut self,
        account: &A,
        amount1_in: u128,
        min_token2_out: u128,
    ) -> Result<u128> {
        self.swap_exact_in(account, SwapDirection::Token1ToToken2, amount1_in, min_token2_out)
    }

    pub fn swap_exact_token2(
        &mut self,
        account: &A,
        amount2_in: u128,
        min_token1_out: u128,
    ) -> Result<u128> {
        self.swap_exact_in(account, SwapDirection::Token2ToToken1, amount2_in, min_token1_out)
    }

    pub fn swap_for_exact_token2(
        &mut self,
        account: &A,
        amount2_out: u128,
        max_token1_in: u128,
    ) -> Result<u128> {
        self.swap_exact_out(account, SwapDirection::Token1ToToken2, amount2_out, max_token1_in)
    }

    pub fn swap_for_exact_token1(
        &mut self,
        account: &A,
        amount1_out: u128,
        max_token2_in: u128,
    ) -> Result<u128> {
        self.swap_exact_out(account, SwapDirection::Token2ToToken1, amount1_out, max_token2_in)
    }

    /// Move balances and reserves for a validated swap
    ///
    /// `balance_in` is the caller's input balance already checked to cover
    /// `amount_in`. All arithmetic is checked before the first write.
    fn settle_swap(
        &mut self,
        account: &A,
        direction: SwapDirection,
        balance_in: u128,
        amount_in: u128,
        amount_out: u128,
    ) -> Result<()> {
        let (asset_in, asset_out) = direction.assets();

        let reserve_in = add_u128(self.reserve(asset_in), amount_in)?;
        let reserve_out = sub_u128(self.reserve(asset_out), amount_out)?;
        let balance_out = add_u128(balance_of(self.balances(asset_out), account), amount_out)?;

        // Commit
        write_balance(self.balances_mut(asset_in), account, balance_in - amount_in);
        self.set_reserve(asset_in, reserve_in);
        self.set_reserve(asset_out, reserve_out);
        write_balance(self.balances_mut(asset_out), account, balance_out);

        debug!(
            "swap {:?} {:?}: {} in, {} out",
            account, direction, amount_in, amount_out
        );
        Ok(())
    }
}
