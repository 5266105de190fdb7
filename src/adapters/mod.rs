//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Marketplace: HTTP/JSON client for the bond marketplace API
//! - Terminal: text rendering and the stdout/stderr notifier
//! - CLI: Command-line interface and interactive dashboard

pub mod marketplace;
pub mod terminal;
pub mod cli;

pub use marketplace::{MarketplaceClient, MarketplaceConfig};
pub use terminal::{Palette, TerminalNotifier};
pub use cli::CliApp;
