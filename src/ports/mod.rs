//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The marketplace backend (bonds, portfolio, market stats, trades)
//! - User-visible notifications
//!
//! `mocks` holds recording test doubles for both.

pub mod market_data;
pub mod notifier;
pub mod mocks;

pub use market_data::{ApiError, BondMarketPort};
pub use notifier::Notifier;
