use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of a trade request (`transaction_type` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    #[default]
    Buy,
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for TradeDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeDirection::Buy),
            "sell" => Ok(TradeDirection::Sell),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown trade direction: '{0}'")]
pub struct UnknownDirection(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    #[error("Quantity is not a number: '{0}'")]
    NotANumber(String),
}

/// Parse the quantity input of the trade form.
///
/// Only numeric parsing is done here; range checks (supply, holdings) are
/// the backend's job.
pub fn parse_quantity(input: &str) -> Result<f64, QuantityError> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(QuantityError::NotANumber(trimmed.to_string())),
    }
}

/// Body of `POST /api/trade`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub user_address: String,
    pub bond_id: String,
    pub quantity: f64,
    pub transaction_type: TradeDirection,
}

impl TradeRequest {
    pub fn new(user_address: &str, bond_id: &str, quantity: f64, direction: TradeDirection) -> Self {
        Self {
            user_address: user_address.to_string(),
            bond_id: bond_id.to_string(),
            quantity,
            transaction_type: direction,
        }
    }
}

impl fmt::Display for TradeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x {} for {}",
            self.transaction_type, self.quantity, self.bond_id, self.user_address
        )
    }
}

/// Successful response of `POST /api/trade`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub success: bool,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub trade_price: Option<f64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub new_portfolio_value: Option<f64>,
}

impl TradeReceipt {
    pub fn accepted(transaction_id: &str) -> Self {
        Self {
            success: true,
            transaction_id: transaction_id.to_string(),
            trade_price: None,
            total_amount: None,
            new_portfolio_value: None,
        }
    }
}
