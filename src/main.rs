//! OKX DEX CLI
//!
//! Command-line interface for the OKX DEX actions and the interactive
//! trading bot.

use clap::{Parser, Subcommand};
use okx_dex_plugin::actions::{QuoteInput, SwapInput};
use okx_dex_plugin::amount::to_base_units;
use okx_dex_plugin::config::WALLET_KEY_ENVS;
use okx_dex_plugin::wallet::SecureWallet;
use okx_dex_plugin::{
    ActionContext, ActionKind, ActionRequest, ApiCredentials, Config, Error, OkxDexPlugin, Result,
    TradingBot,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "okx-dex")]
#[command(about = "OKX DEX aggregator for Solana: quotes, swaps and token data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a swap quote
    Quote {
        /// Token to sell (symbol or mint address)
        #[arg(long)]
        from: String,

        /// Token to buy (symbol or mint address)
        #[arg(long)]
        to: String,

        /// Amount to sell, human-readable (e.g. 1.5)
        #[arg(long)]
        amount: String,

        /// Slippage percentage
        #[arg(long)]
        slippage: Option<String>,
    },

    /// Execute a swap with the wallet from the environment
    Swap {
        /// Token to sell (symbol or mint address)
        #[arg(long)]
        from: String,

        /// Token to buy (symbol or mint address)
        #[arg(long)]
        to: String,

        /// Amount to sell, human-readable (e.g. 1.5)
        #[arg(long)]
        amount: String,

        /// Slippage percentage (upper bound with --auto-slippage)
        #[arg(long)]
        slippage: Option<String>,

        /// Let the aggregator pick slippage
        #[arg(long)]
        auto_slippage: bool,
    },

    /// List tokens supported by the aggregator
    Tokens,

    /// List liquidity sources
    Liquidity,

    /// Show supported chain metadata
    ChainData,

    /// Print the action table with input schemas
    Actions,

    /// Show current configuration
    Config,

    /// Start the interactive trading bot
    Bot,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    // Load config
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Actions => {
            let table: Vec<_> = ActionKind::ALL.iter().map(|kind| kind.describe()).collect();
            print_json(&json!(table))?;
        }
        Commands::Config => {
            print_json(&serde_json::to_value(&config)?)?;
        }
        Commands::Bot => {
            let (plugin, context) = build_plugin(config)?;
            TradingBot::new(plugin, context).run_stdio().await?;
        }
        command => run_action(command, config).await?,
    }

    Ok(())
}

/// Wire credentials, wallet and configuration into a plugin
fn build_plugin(config: Config) -> Result<(OkxDexPlugin, ActionContext)> {
    let credentials = match ApiCredentials::from_env() {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            tracing::warn!(error = %e, "OKX credentials not configured");
            None
        }
    };

    let wallet = match Config::wallet_key_from_env() {
        Some(key) => {
            let wallet = SecureWallet::from_base58(&key)?;
            tracing::info!(address = %wallet.address(), "Loaded Solana wallet");
            Some(wallet)
        }
        None => {
            tracing::warn!(
                "No {} set - running in read-only mode (quotes only)",
                WALLET_KEY_ENVS.join(" or ")
            );
            None
        }
    };

    let wallet_address = wallet.as_ref().map(|w| w.address().to_string());
    let plugin = OkxDexPlugin::from_config(&config, credentials, wallet)?;

    let mut context = ActionContext::new(Arc::new(config));
    if let Some(address) = wallet_address {
        context = context.with_wallet(address);
    }
    Ok((plugin, context))
}

async fn run_action(command: Commands, config: Config) -> Result<()> {
    let default_slippage = config.tokens.default_slippage_percent.clone();
    let (plugin, context) = build_plugin(config)?;
    let registry = plugin.client().tokens().clone();

    let request = match command {
        Commands::Quote {
            from,
            to,
            amount,
            slippage,
        } => {
            let from = registry.resolve(&from)?;
            let to = registry.resolve(&to)?;
            ActionRequest::Quote(QuoteInput {
                amount: to_base_units(&amount, from.decimals)?,
                from_token_address: from.address,
                to_token_address: to.address,
                slippage: slippage.unwrap_or(default_slippage),
            })
        }
        Commands::Swap {
            from,
            to,
            amount,
            slippage,
            auto_slippage,
        } => {
            let from = registry.resolve(&from)?;
            let to = registry.resolve(&to)?;
            ActionRequest::Swap(SwapInput {
                amount: to_base_units(&amount, from.decimals)?,
                from_token_address: from.address,
                to_token_address: to.address,
                slippage: slippage.unwrap_or(default_slippage),
                auto_slippage,
                max_auto_slippage_percent: None,
            })
        }
        Commands::Tokens => ActionRequest::Tokens,
        Commands::Liquidity => ActionRequest::Liquidity,
        Commands::ChainData => ActionRequest::ChainData,
        Commands::Actions | Commands::Config | Commands::Bot => {
            return Err(Error::InvalidInput("not an action command".to_string()))
        }
    };

    let response = plugin.invoke(&context, request).await?;
    print_json(&serde_json::to_value(&response)?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
