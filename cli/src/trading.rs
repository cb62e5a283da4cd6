//! Swap quotes and swaps

use anyhow::{Context, Result};
use colored::Colorize;
use pool_ledger::SwapDirection;

use crate::config::PoolConfig;
use crate::liquidity::{print_details, print_holdings};
use crate::store;

/// (paid, received) token labels for a direction
fn labels(direction: SwapDirection) -> (&'static str, &'static str) {
    match direction {
        SwapDirection::Token1ToToken2 => ("token1", "token2"),
        SwapDirection::Token2ToToken1 => ("token2", "token1"),
    }
}

pub fn quote_exact_in(config: &PoolConfig, direction: SwapDirection, amount_in: u128) -> Result<()> {
    let pool = store::load(&config.state_path)?;
    let amount_out = pool.quote_exact_in(direction, amount_in)?;
    let (paid, received) = labels(direction);

    println!("{}", "=== Quote (exact input) ===".bright_green().bold());
    println!("{} {} {}", "Pay:".bright_cyan(), amount_in, paid);
    println!("{} {} {}", "Receive:".bright_cyan(), amount_out, received);
    Ok(())
}

pub fn quote_exact_out(config: &PoolConfig, direction: SwapDirection, amount_out: u128) -> Result<()> {
    let pool = store::load(&config.state_path)?;
    let amount_in = pool.quote_exact_out(direction, amount_out)?;
    let (paid, received) = labels(direction);

    println!("{}", "=== Quote (exact output) ===".bright_green().bold());
    println!("{} {} {}", "Receive:".bright_cyan(), amount_out, received);
    println!("{} {} {}", "Pay:".bright_cyan(), amount_in, paid);
    Ok(())
}

pub fn swap_exact_in(
    config: &PoolConfig,
    direction: SwapDirection,
    amount_in: u128,
    min_out: u128,
) -> Result<()> {
    let (paid, received) = labels(direction);

    println!("{}", "=== Swap (exact input) ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), config.account);
    println!("{} {} {}", "Pay:".bright_cyan(), amount_in, paid);
    println!("{} {} {}", "Minimum out:".bright_cyan(), min_out, received);

    let (amount_out, pool) = store::commit(&config.state_path, |pool| {
        pool.swap_exact_in(&config.account, direction, amount_in, min_out)
    })
    .context("Swap failed")?;

    println!("{} Received {} {}", "✓".bright_green(), amount_out, received);
    print_holdings(&pool.get_holdings(&config.account));
    print_details(&pool.get_pool_details());
    Ok(())
}

pub fn swap_exact_out(
    config: &PoolConfig,
    direction: SwapDirection,
    amount_out: u128,
    max_in: u128,
) -> Result<()> {
    let (paid, received) = labels(direction);

    println!("{}", "=== Swap (exact output) ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), config.account);
    println!("{} {} {}", "Receive:".bright_cyan(), amount_out, received);
    println!("{} {} {}", "Maximum in:".bright_cyan(), max_in, paid);

    let (amount_in, pool) = store::commit(&config.state_path, |pool| {
        pool.swap_exact_out(&config.account, direction, amount_out, max_in)
    })
    .context("Swap failed")?;

    println!("{} Paid {} {}", "✓".bright_green(), amount_in, paid);
    print_holdings(&pool.get_holdings(&config.account));
    print_details(&pool.get_pool_details());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquidity;
    use pool_ledger::{Holdings, PoolError};

    fn setup(fee: u128) -> (tempfile::TempDir, PoolConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = PoolConfig {
            state_path: dir.path().join("pool.json"),
            account: "trader".to_string(),
            default_fee: 0,
            config_path: None,
        };
        liquidity::init_pool(&config, Some(fee), false).unwrap();
        liquidity::faucet(&config, 100, 200).unwrap();
        liquidity::provide(&config, 50, 100).unwrap();
        (dir, config)
    }

    #[test]
    fn test_swap_exact_token1() {
        let (_dir, config) = setup(0);
        swap_exact_in(&config, SwapDirection::Token1ToToken2, 50, 50).unwrap();

        let pool = store::load(&config.state_path).unwrap();
        assert_eq!(
            pool.get_holdings(&config.account),
            Holdings {
                token1: 0,
                token2: 150,
                shares: 100_000_000,
            }
        );
    }

    #[test]
    fn test_slippage_does_not_write() {
        let (_dir, config) = setup(0);
        let before = std::fs::read(&config.state_path).unwrap();

        let err = swap_exact_in(&config, SwapDirection::Token1ToToken2, 50, 51).unwrap_err();
        let kind = err.chain().find_map(|e| e.downcast_ref::<store::CliError>());
        assert!(matches!(kind, Some(store::CliError::Pool(PoolError::SlippageExceeded))));
        assert_eq!(std::fs::read(&config.state_path).unwrap(), before);
    }

    #[test]
    fn test_swap_exact_out() {
        let (_dir, config) = setup(0);
        swap_exact_out(&config, SwapDirection::Token2ToToken1, 25, 100).unwrap();

        // y1 = 25, x1 = 5000 / 25 = 200, pays 100 token2
        let pool = store::load(&config.state_path).unwrap();
        assert_eq!(pool.get_holdings(&config.account).token1, 75);
        assert_eq!(pool.get_holdings(&config.account).token2, 0);
    }

    #[test]
    fn test_quotes_with_fee() {
        let (_dir, config) = setup(100);
        assert!(quote_exact_in(&config, SwapDirection::Token1ToToken2, 50).is_ok());
        assert!(quote_exact_out(&config, SwapDirection::Token1ToToken2, 100).is_err());
    }
}
