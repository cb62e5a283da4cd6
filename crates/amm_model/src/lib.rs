//! AMM Model - Pure constant product math (x·y=k) for the pool ledger
//!
//! This crate contains the share-issuance, withdrawal and swap-pricing
//! formulas used by the pool ledger. Every function is total: no panics,
//! checked arithmetic, floor division throughout.
//!
//! The ledger in the workspace root imports these functions directly
//! rather than re-deriving the formulas.

#![no_std]
#![forbid(unsafe_code)]

pub mod math;

pub use math::{
    effective_input, equivalent_amount, quote_in_given_out, quote_out_given_in,
    shares_for_deposit, withdraw_amounts,
};

/// Share scaling factor (1e6)
pub const PRECISION: u128 = 1_000_000;

/// Shares minted by the first deposit into an empty pool
pub const GENESIS_SHARES: u128 = 100 * PRECISION;

/// Fee denominator (fee is expressed in thousandths of the swap input)
pub const FEE_DENOMINATOR: u128 = 1_000;

/// Error types for AMM math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmmError {
    /// One of the reserves is zero, price is undefined
    ZeroLiquidity,
    /// Deposit amounts are not in the ratio of current reserves
    NonEquivalentValue,
    /// Computed share issuance rounds down to zero
    ThresholdNotReached,
    /// Share exceeds total outstanding shares
    InvalidShare,
    /// Requested output meets or exceeds the reserve
    InsufficientLiquidity,
    /// Fee is not below `FEE_DENOMINATOR`
    InvalidFee,
    /// Arithmetic overflow
    Overflow,
}
