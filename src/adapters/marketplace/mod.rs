//! Marketplace Adapter
//!
//! Implementation of the BondMarketPort over the backend's HTTP/JSON API.

mod client;

pub use client::{decode_body, MarketplaceClient, MarketplaceConfig};
