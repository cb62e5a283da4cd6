//! Pool CLI - local host for the constant-product pool ledger
//!
//! Each invocation loads the ledger from a JSON state file, applies one
//! operation as the selected account, and writes the file back only if the
//! operation succeeded.

use clap::{Parser, Subcommand};
use colored::Colorize;
use pool_ledger::SwapDirection;
use std::path::PathBuf;

mod config;
mod liquidity;
mod scenario;
mod store;
mod trading;

use config::PoolConfig;

#[derive(Parser)]
#[command(name = "pool")]
#[command(about = "Constant-product liquidity pool ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./pool.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ledger state file (overrides config)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Account acting as caller (overrides config)
    #[arg(short, long)]
    account: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty pool
    Init {
        /// Fee in thousandths of the swap input (defaults to config)
        #[arg(long)]
        fee: Option<u128>,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Credit free token balances to the caller
    Faucet {
        amount1: u128,
        amount2: u128,
    },

    /// Show free balances and shares of an account
    Holdings {
        /// Account to inspect (defaults to caller)
        account: Option<String>,
    },

    /// Show reserves, total shares and fee
    Details,

    /// Deposit both tokens and mint shares
    Provide {
        amount1: u128,
        amount2: u128,
    },

    /// Burn shares for a slice of both reserves
    Withdraw {
        share: u128,
    },

    /// Deposit and withdrawal estimates
    Estimate {
        #[command(subcommand)]
        command: EstimateCommands,
    },

    /// Swap price quotes
    Quote {
        #[command(subcommand)]
        command: QuoteCommands,
    },

    /// Swaps with slippage bounds
    Swap {
        #[command(subcommand)]
        command: SwapCommands,
    },

    /// Run reference scenarios against an in-memory pool
    Scenario,
}

#[derive(Subcommand)]
enum EstimateCommands {
    /// Token1 required alongside an amount of token2
    Token1For { amount2: u128 },

    /// Token2 required alongside an amount of token1
    Token2For { amount1: u128 },

    /// Tokens released by burning shares
    Withdraw { share: u128 },
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// Token2 received for an exact token1 input
    Token2GivenToken1In { amount1_in: u128 },

    /// Token1 received for an exact token2 input
    Token1GivenToken2In { amount2_in: u128 },

    /// Token1 required for an exact token2 output
    Token1GivenToken2Out { amount2_out: u128 },

    /// Token2 required for an exact token1 output
    Token2GivenToken1Out { amount1_out: u128 },
}

#[derive(Subcommand)]
enum SwapCommands {
    /// Sell an exact amount of token1 for token2
    ExactToken1 {
        amount1_in: u128,

        /// Minimum token2 to receive
        #[arg(long, default_value = "0")]
        min_out: u128,
    },

    /// Sell an exact amount of token2 for token1
    ExactToken2 {
        amount2_in: u128,

        /// Minimum token1 to receive
        #[arg(long, default_value = "0")]
        min_out: u128,
    },

    /// Buy an exact amount of token2 with token1
    ForExactToken2 {
        amount2_out: u128,

        /// Maximum token1 to pay
        #[arg(long)]
        max_in: u128,
    },

    /// Buy an exact amount of token1 with token2
    ForExactToken1 {
        amount1_out: u128,

        /// Maximum token2 to pay
        #[arg(long)]
        max_in: u128,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = PoolConfig::new(cli.config.clone(), cli.state.clone(), cli.account.clone())?;

    if cli.verbose {
        if let Some(path) = &config.config_path {
            println!("{} {}", "Config:".bright_cyan(), path.display());
        }
        println!("{} {}", "State:".bright_cyan(), config.state_path.display());
        println!("{} {}", "Account:".bright_cyan(), config.account);
    }

    match cli.command {
        Commands::Init { fee, force } => {
            liquidity::init_pool(&config, fee, force)?;
        }
        Commands::Faucet { amount1, amount2 } => {
            liquidity::faucet(&config, amount1, amount2)?;
        }
        Commands::Holdings { account } => {
            liquidity::show_holdings(&config, account)?;
        }
        Commands::Details => {
            liquidity::show_details(&config, cli.verbose)?;
        }
        Commands::Provide { amount1, amount2 } => {
            liquidity::provide(&config, amount1, amount2)?;
        }
        Commands::Withdraw { share } => {
            liquidity::withdraw(&config, share)?;
        }
        Commands::Estimate { command } => match command {
            EstimateCommands::Token1For { amount2 } => {
                liquidity::estimate_token1_for(&config, amount2)?;
            }
            EstimateCommands::Token2For { amount1 } => {
                liquidity::estimate_token2_for(&config, amount1)?;
            }
            EstimateCommands::Withdraw { share } => {
                liquidity::estimate_withdraw(&config, share)?;
            }
        },
        Commands::Quote { command } => match command {
            QuoteCommands::Token2GivenToken1In { amount1_in } => {
                trading::quote_exact_in(&config, SwapDirection::Token1ToToken2, amount1_in)?;
            }
            QuoteCommands::Token1GivenToken2In { amount2_in } => {
                trading::quote_exact_in(&config, SwapDirection::Token2ToToken1, amount2_in)?;
            }
            QuoteCommands::Token1GivenToken2Out { amount2_out } => {
                trading::quote_exact_out(&config, SwapDirection::Token1ToToken2, amount2_out)?;
            }
            QuoteCommands::Token2GivenToken1Out { amount1_out } => {
                trading::quote_exact_out(&config, SwapDirection::Token2ToToken1, amount1_out)?;
            }
        },
        Commands::Swap { command } => match command {
            SwapCommands::ExactToken1 { amount1_in, min_out } => {
                trading::swap_exact_in(&config, SwapDirection::Token1ToToken2, amount1_in, min_out)?;
            }
            SwapCommands::ExactToken2 { amount2_in, min_out } => {
                trading::swap_exact_in(&config, SwapDirection::Token2ToToken1, amount2_in, min_out)?;
            }
            SwapCommands::ForExactToken2 { amount2_out, max_in } => {
                trading::swap_exact_out(&config, SwapDirection::Token1ToToken2, amount2_out, max_in)?;
            }
            SwapCommands::ForExactToken1 { amount1_out, max_in } => {
                trading::swap_exact_out(&config, SwapDirection::Token2ToToken1, amount1_out, max_in)?;
            }
        },
        Commands::Scenario => {
            scenario::run_scenarios()?;
        }
    }

    Ok(())
}
