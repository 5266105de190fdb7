//! CLI Command Definitions
//!
//! Argument parsing for the bond desk binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Bond Desk - terminal client for the sovereign bond marketplace
#[derive(Parser, Debug)]
#[command(
    name = "bond-desk",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Terminal client for the sovereign bond marketplace",
    long_about = "Bond Desk lists tokenized sovereign bonds, shows portfolio and market \
                  statistics, and submits buy/sell trades against the marketplace API."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the marketplace API origin
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all bonds
    Bonds,

    /// Show one bond with its server-side yield
    Bond(BondCmd),

    /// Show a user's portfolio
    Portfolio(PortfolioCmd),

    /// Show market statistics
    Stats,

    /// Buy or sell a bond
    Trade(TradeCmd),

    /// Check that the marketplace API is reachable
    Health,

    /// Interactive dashboard with background refresh
    Dashboard(DashboardCmd),
}

/// Show one bond
#[derive(Parser, Debug)]
pub struct BondCmd {
    /// Bond id
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Show portfolio
#[derive(Parser, Debug)]
pub struct PortfolioCmd {
    /// User address (defaults to the configured session user)
    #[arg(short, long, value_name = "ADDR")]
    pub user: Option<String>,
}

/// Submit a trade
#[derive(Parser, Debug)]
pub struct TradeCmd {
    /// Bond id, country code or country name
    #[arg(value_name = "BOND_ID")]
    pub bond_id: String,

    /// Number of bond tokens
    #[arg(value_name = "QUANTITY")]
    pub quantity: String,

    /// Sell instead of buy
    #[arg(long)]
    pub sell: bool,

    /// User address (defaults to the configured session user)
    #[arg(short, long, value_name = "ADDR")]
    pub user: Option<String>,
}

/// Interactive dashboard
#[derive(Parser, Debug)]
pub struct DashboardCmd {
    /// Refresh interval in seconds (defaults to session.poll_interval_secs)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Disable ANSI colours
    #[arg(long)]
    pub no_color: bool,
}
