//! Domain Layer - Marketplace records and display rules
//!
//! Pure types deserialised from the marketplace API plus the presentation
//! helpers derived from them. No I/O happens here; all external
//! interactions go through the ports layer.

pub mod bond;
pub mod portfolio;
pub mod market;
pub mod trade;
pub mod display;

pub use bond::Bond;
pub use portfolio::{Holding, Portfolio, PortfolioPayload, PortfolioSummary, PortfolioView};
pub use market::{BondYieldQuote, MarketStats};
pub use trade::{
    parse_quantity, QuantityError, TradeDirection, TradeReceipt, TradeRequest, UnknownDirection,
};
pub use display::{
    displayed_yield, estimated_yield, format_pct, format_usd, supply_ratio_pct, DisplayedYield,
    RiskBand, YieldBand,
};
