use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Bond, BondYieldQuote, MarketStats, PortfolioView, TradeReceipt, TradeRequest};

/// Marketplace API error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection, timeout or other transport failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Non-2xx response; `detail` is the server's `{"detail": ...}` message
    #[error("Server rejected request ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// Response body did not match the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Server-provided message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 404, .. })
    }
}

/// Read and write operations of the marketplace backend
#[async_trait]
pub trait BondMarketPort: Send + Sync {
    /// API root greeting
    async fn health(&self) -> Result<String, ApiError>;

    async fn list_bonds(&self) -> Result<Vec<Bond>, ApiError>;

    async fn get_bond(&self, bond_id: &str) -> Result<Bond, ApiError>;

    /// Server-computed yield breakdown for one bond
    async fn get_bond_yield(&self, bond_id: &str) -> Result<BondYieldQuote, ApiError>;

    async fn get_portfolio(&self, user_address: &str) -> Result<PortfolioView, ApiError>;

    async fn market_stats(&self) -> Result<MarketStats, ApiError>;

    /// Sent exactly once per call, never retried
    async fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, ApiError>;
}
