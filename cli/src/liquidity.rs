//! Pool setup, balances and liquidity provider operations

use anyhow::{Context, Result};
use colored::Colorize;
use pool_ledger::{Holdings, PoolDetails};

use crate::config::PoolConfig;
use crate::store::{self, Ledger};

pub fn init_pool(config: &PoolConfig, fee: Option<u128>, force: bool) -> Result<()> {
    let fee = fee.unwrap_or(config.default_fee);

    println!("{}", "=== Initialize Pool ===".bright_green().bold());
    println!("{} {}", "State:".bright_cyan(), config.state_path.display());
    println!("{} {}/1000", "Fee:".bright_cyan(), fee);

    let pool = store::create(&config.state_path, fee, force)
        .context("Failed to initialize pool")?;

    if pool.fee() != fee {
        println!("{} fee out of range, pool created with fee 0", "⚠".yellow());
    }
    println!("{} Pool created", "✓".bright_green());
    Ok(())
}

pub fn faucet(config: &PoolConfig, amount1: u128, amount2: u128) -> Result<()> {
    println!("{}", "=== Faucet ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), config.account);

    let ((), pool) = store::commit(&config.state_path, |pool| {
        pool.faucet(&config.account, amount1, amount2)
    })
    .context("Faucet failed")?;

    println!("{} Credited {} token1, {} token2", "✓".bright_green(), amount1, amount2);
    print_holdings(&pool.get_holdings(&config.account));
    Ok(())
}

pub fn show_holdings(config: &PoolConfig, account: Option<String>) -> Result<()> {
    let account = account.unwrap_or_else(|| config.account.clone());
    let pool = store::load(&config.state_path)?;

    println!("{}", "=== Holdings ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), account);
    print_holdings(&pool.get_holdings(&account));
    Ok(())
}

pub fn show_details(config: &PoolConfig, verbose: bool) -> Result<()> {
    let pool = store::load(&config.state_path)?;

    println!("{}", "=== Pool Details ===".bright_green().bold());
    print_details(&pool.get_pool_details());

    if verbose {
        print_providers(&pool);
    }
    Ok(())
}

pub fn provide(config: &PoolConfig, amount1: u128, amount2: u128) -> Result<()> {
    println!("{}", "=== Provide Liquidity ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), config.account);
    println!("{} {}", "Token1:".bright_cyan(), amount1);
    println!("{} {}", "Token2:".bright_cyan(), amount2);

    let (share, pool) = store::commit(&config.state_path, |pool| {
        pool.provide(&config.account, amount1, amount2)
    })
    .context("Provide failed")?;

    println!("{} Minted {} shares", "✓".bright_green(), share);
    print_details(&pool.get_pool_details());
    Ok(())
}

pub fn withdraw(config: &PoolConfig, share: u128) -> Result<()> {
    println!("{}", "=== Withdraw Liquidity ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), config.account);
    println!("{} {}", "Shares:".bright_cyan(), share);

    let ((amount1, amount2), pool) = store::commit(&config.state_path, |pool| {
        pool.withdraw(&config.account, share)
    })
    .context("Withdraw failed")?;

    println!("{} Released {} token1, {} token2", "✓".bright_green(), amount1, amount2);
    print_details(&pool.get_pool_details());
    Ok(())
}

pub fn estimate_token1_for(config: &PoolConfig, amount2: u128) -> Result<()> {
    let pool = store::load(&config.state_path)?;
    let amount1 = pool.estimate_token1_for(amount2)?;

    println!("{}", "=== Estimate Deposit ===".bright_green().bold());
    println!("{} {}", "Token2:".bright_cyan(), amount2);
    println!("{} {}", "Token1 required:".bright_cyan(), amount1);
    Ok(())
}

pub fn estimate_token2_for(config: &PoolConfig, amount1: u128) -> Result<()> {
    let pool = store::load(&config.state_path)?;
    let amount2 = pool.estimate_token2_for(amount1)?;

    println!("{}", "=== Estimate Deposit ===".bright_green().bold());
    println!("{} {}", "Token1:".bright_cyan(), amount1);
    println!("{} {}", "Token2 required:".bright_cyan(), amount2);
    Ok(())
}

pub fn estimate_withdraw(config: &PoolConfig, share: u128) -> Result<()> {
    let pool = store::load(&config.state_path)?;
    let (amount1, amount2) = pool.estimate_withdraw(share)?;

    println!("{}", "=== Estimate Withdraw ===".bright_green().bold());
    println!("{} {}", "Shares:".bright_cyan(), share);
    println!("{} {}", "Token1:".bright_cyan(), amount1);
    println!("{} {}", "Token2:".bright_cyan(), amount2);
    Ok(())
}

pub(crate) fn print_holdings(holdings: &Holdings) {
    println!("  {} {}", "Token1:".bright_cyan(), holdings.token1);
    println!("  {} {}", "Token2:".bright_cyan(), holdings.token2);
    println!("  {} {}", "Shares:".bright_cyan(), holdings.shares);
}

pub(crate) fn print_details(details: &PoolDetails) {
    println!("  {} {}", "Reserve token1:".bright_cyan(), details.total_token1);
    println!("  {} {}", "Reserve token2:".bright_cyan(), details.total_token2);
    println!("  {} {}", "Total shares:".bright_cyan(), details.total_shares);
    println!("  {} {}/1000", "Fee:".bright_cyan(), details.fee);
}

fn print_providers(pool: &Ledger) {
    let details = pool.get_pool_details();
    println!("\n{}", "Liquidity providers:".bright_yellow());

    let mut any = false;
    for (account, share) in pool.liquidity_providers() {
        any = true;
        // Share of the pool in basis points
        let bps = share.saturating_mul(10_000) / details.total_shares.max(1);
        println!("  {} {} ({}.{:02}%)", account.bright_yellow(), share, bps / 100, bps % 100);
    }
    if !any {
        println!("  {}", "none".dimmed());
    }
}
