//! Reference scenarios run against an in-memory ledger
//!
//! Smoke test of the engine without touching the state file:
//! - Genesis deposit and share issuance
//! - Partial withdrawal
//! - Exact-input swap and slippage rejection
//! - Fee-adjusted quotes
//! - Zero-liquidity guards on a fresh pool

use anyhow::{ensure, Result};
use colored::Colorize;
use pool_ledger::{Holdings, Pool, PoolDetails, PoolError, GENESIS_SHARES};

type Ledger = Pool<&'static str>;

const ACCOUNT: &str = "scenario";

// ============================================================================
// Runner
// ============================================================================

pub fn run_scenarios() -> Result<()> {
    println!("{}", "=== Running Reference Scenarios ===".bright_yellow().bold());
    println!("{}", "In-memory ledger, state file untouched\n".dimmed());

    let scenarios: [(&str, fn() -> Result<()>); 6] = [
        ("Genesis deposit", scenario_genesis),
        ("Partial withdraw", scenario_withdraw),
        ("Exact-input swap", scenario_swap),
        ("Slippage rejection", scenario_slippage),
        ("Fee-adjusted quote", scenario_fee_quote),
        ("Zero-liquidity guards", scenario_zero_liquidity),
    ];

    let mut passed = 0;
    let mut failed = 0;

    for (name, scenario) in scenarios {
        match scenario() {
            Ok(()) => {
                println!("{} {}", "✓".bright_green(), name);
                passed += 1;
            }
            Err(e) => {
                println!("{} {}: {}", "✗".bright_red(), name, e);
                failed += 1;
            }
        }
    }

    print_summary("Scenario", passed, failed)
}

fn print_summary(suite_name: &str, passed: usize, failed: usize) -> Result<()> {
    println!("\n{}", format!("=== {} Results ===", suite_name).bright_cyan());
    println!("{} {} passed", "✓".bright_green(), passed);

    if failed > 0 {
        println!("{} {} failed", "✗".bright_red(), failed);
        anyhow::bail!("{} scenarios failed", failed);
    }

    println!("{}", format!("All {} checks passed!", suite_name).green().bold());
    Ok(())
}

// ============================================================================
// Scenarios
// ============================================================================

fn seeded(fee: u128, amount1: u128, amount2: u128) -> Result<(Ledger, u128)> {
    let mut pool = Ledger::new(fee);
    pool.faucet(&ACCOUNT, 100, 200)?;
    let share = pool.provide(&ACCOUNT, amount1, amount2)?;
    Ok((pool, share))
}

/// Compare caller holdings `(token1, token2, shares)` and pool reserves
/// `(total_token1, total_token2, total_shares)` against expected values
fn expect_state(
    pool: &Ledger,
    holdings: (u128, u128, u128),
    reserves: (u128, u128, u128),
) -> Result<()> {
    let (token1, token2, shares) = holdings;
    let expected = Holdings {
        token1,
        token2,
        shares,
    };
    let actual = pool.get_holdings(&ACCOUNT);
    ensure!(actual == expected, "holdings {:?}", actual);

    let (total_token1, total_token2, total_shares) = reserves;
    let expected = PoolDetails {
        total_token1,
        total_token2,
        total_shares,
        fee: pool.fee(),
    };
    let actual = pool.get_pool_details();
    ensure!(actual == expected, "details {:?}", actual);
    Ok(())
}

fn scenario_genesis() -> Result<()> {
    let (pool, share) = seeded(0, 10, 20)?;

    ensure!(share == GENESIS_SHARES, "minted {} shares", share);
    expect_state(&pool, (90, 180, share), (10, 20, share))
}

fn scenario_withdraw() -> Result<()> {
    let (mut pool, _) = seeded(0, 10, 20)?;
    let released = pool.withdraw(&ACCOUNT, 20_000_000)?;

    ensure!(released == (2, 4), "released {:?}", released);
    expect_state(&pool, (92, 184, 80_000_000), (8, 16, 80_000_000))
}

fn scenario_swap() -> Result<()> {
    let (mut pool, share) = seeded(0, 50, 100)?;
    let out = pool.swap_exact_token1(&ACCOUNT, 50, 50)?;

    ensure!(out == 50, "received {}", out);
    expect_state(&pool, (0, 150, share), (100, 50, share))
}

fn scenario_slippage() -> Result<()> {
    let (mut pool, _) = seeded(0, 50, 100)?;
    let before = pool.clone();

    let result = pool.swap_exact_token1(&ACCOUNT, 50, 51);
    ensure!(result == Err(PoolError::SlippageExceeded), "got {:?}", result);
    ensure!(pool == before, "ledger mutated by rejected swap");
    Ok(())
}

fn scenario_fee_quote() -> Result<()> {
    let (pool, _) = seeded(100, 50, 100)?;
    let out = pool.quote_token2_given_token1_in(50)?;
    ensure!(out == 48, "quoted {}", out);
    Ok(())
}

fn scenario_zero_liquidity() -> Result<()> {
    let pool = Ledger::new(0);
    let checks = [
        pool.estimate_token1_for(1).err(),
        pool.estimate_token2_for(1).err(),
        pool.estimate_withdraw(1).err(),
        pool.quote_token2_given_token1_in(1).err(),
        pool.quote_token1_given_token2_in(1).err(),
        pool.quote_token1_given_token2_out(1).err(),
        pool.quote_token2_given_token1_out(1).err(),
    ];
    for (i, err) in checks.iter().enumerate() {
        ensure!(*err == Some(PoolError::ZeroLiquidity), "check {} returned {:?}", i, err);
    }
    Ok(())
}
