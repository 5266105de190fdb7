//! Bond Desk - terminal view layer for a sovereign bond marketplace
//!
//! Lists tokenized sovereign bonds, tracks a user's portfolio and market
//! statistics, and submits buy/sell trades against the marketplace API.
//!
//! # Modules
//!
//! - `domain`: Bonds, portfolios, trades and the display rules (risk/yield bands, supply ratio)
//! - `ports`: Trait abstractions (BondMarketPort, Notifier) and recording mocks
//! - `adapters`: External implementations (marketplace HTTP client, terminal, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: View controller, UI state machine, request sequencing and polling

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
