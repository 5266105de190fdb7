//! CLI Adapter
//!
//! Command-line interface for the bond desk.
//! Uses clap derive macros for argument parsing.

mod commands;
pub mod dashboard;

pub use commands::{BondCmd, CliApp, Command, DashboardCmd, PortfolioCmd, TradeCmd};
pub use dashboard::run_dashboard;

