use serde::{Deserialize, Serialize};

/// Market-wide totals from `/api/market-stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub total_market_value: f64,
    pub average_yield: f64,
    pub active_bonds: usize,
    #[serde(default)]
    pub total_volume_24h: f64,
    #[serde(default)]
    pub total_transactions: usize,
}

/// Server-side yield breakdown from `/api/bonds/{id}/yield`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondYieldQuote {
    pub bond_id: String,
    pub country: String,
    pub base_yield: f64,
    pub risk_factor: f64,
    pub dynamic_yield: f64,
    pub current_price: f64,
    pub face_value: f64,
}

impl BondYieldQuote {
    /// Yield added on top of the coupon by the risk engine
    pub fn risk_premium(&self) -> f64 {
        self.dynamic_yield - self.base_yield
    }
}
