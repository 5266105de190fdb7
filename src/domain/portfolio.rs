use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::bond::Bond;

/// Aggregate portfolio record as stored by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub id: String,
    pub user_address: String,
    /// bond id -> quantity held
    pub bonds: HashMap<String, f64>,
    #[serde(default)]
    pub total_value: f64,
    /// Value-weighted average dynamic yield
    #[serde(default)]
    pub total_yield: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    #[serde(default)]
    pub total_bonds: usize,
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub average_yield: f64,
}

/// A portfolio line item. `dynamic_yield` is computed server-side and is
/// the authoritative yield for the bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub bond: Bond,
    pub quantity: f64,
    pub current_value: f64,
    pub dynamic_yield: f64,
    pub unrealized_pnl: f64,
}

/// Wire shape of `GET /api/portfolio/{user}`.
///
/// Users without trades get the bare portfolio record instead of the
/// detailed envelope. A body with a `portfolio` key is decoded strictly as
/// the envelope; anything else must be a complete bare record.
#[derive(Debug, Clone)]
pub enum PortfolioPayload {
    Detailed {
        portfolio: Portfolio,
        summary: Option<PortfolioSummary>,
        detailed_holdings: Vec<Holding>,
    },
    Bare(Portfolio),
}

#[derive(Deserialize)]
struct Envelope {
    portfolio: Portfolio,
    #[serde(default)]
    summary: Option<PortfolioSummary>,
    #[serde(default)]
    detailed_holdings: Vec<Holding>,
}

impl<'de> Deserialize<'de> for PortfolioPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;

        if value.get("portfolio").is_some() {
            let envelope: Envelope = serde_json::from_value(value).map_err(D::Error::custom)?;
            return Ok(PortfolioPayload::Detailed {
                portfolio: envelope.portfolio,
                summary: envelope.summary,
                detailed_holdings: envelope.detailed_holdings,
            });
        }

        serde_json::from_value(value)
            .map(PortfolioPayload::Bare)
            .map_err(D::Error::custom)
    }
}

/// Read model of one user's portfolio
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioView {
    pub portfolio: Portfolio,
    pub summary: PortfolioSummary,
    pub holdings: Vec<Holding>,
}

impl From<PortfolioPayload> for PortfolioView {
    fn from(payload: PortfolioPayload) -> Self {
        match payload {
            PortfolioPayload::Detailed { portfolio, summary, detailed_holdings } => {
                let summary = summary.unwrap_or_else(|| PortfolioSummary {
                    total_bonds: portfolio.bonds.len(),
                    total_value: portfolio.total_value,
                    average_yield: portfolio.total_yield,
                });
                Self { portfolio, summary, holdings: detailed_holdings }
            }
            PortfolioPayload::Bare(portfolio) => {
                let summary = PortfolioSummary {
                    total_bonds: portfolio.bonds.len(),
                    total_value: portfolio.total_value,
                    average_yield: portfolio.total_yield,
                };
                Self { portfolio, summary, holdings: Vec::new() }
            }
        }
    }
}

impl PortfolioView {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn holding_for(&self, bond_id: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.bond.id == bond_id)
    }

    pub fn total_unrealized_pnl(&self) -> f64 {
        self.holdings.iter().map(|h| h.unrealized_pnl).sum()
    }
}
