//! Presentation-only values derived from already-fetched records.
//!
//! Nothing here is a pricing formula. The backend owns dynamic yield and
//! price; these helpers only decide how a fetched value is shown.

use rust_decimal::prelude::*;
use std::fmt;

use super::bond::Bond;
use super::portfolio::PortfolioView;

/// Risk colour band for a bond's `risk_factor`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_risk_factor(risk_factor: f64) -> Self {
        if risk_factor < 2.0 {
            RiskBand::Low
        } else if risk_factor < 4.0 {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "LOW",
            RiskBand::Medium => "MEDIUM",
            RiskBand::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Yield colour band for a displayed yield in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldBand {
    Standard,
    Elevated,
    Highest,
}

impl YieldBand {
    pub fn from_yield(yield_pct: f64) -> Self {
        if yield_pct > 8.0 {
            YieldBand::Highest
        } else if yield_pct > 6.0 {
            YieldBand::Elevated
        } else {
            YieldBand::Standard
        }
    }
}

/// Where a displayed yield came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayedYield {
    /// Server-computed `dynamic_yield` of a cached holding
    Server(f64),
    /// Local display estimate
    Estimate(f64),
}

impl DisplayedYield {
    pub fn value(&self) -> f64 {
        match self {
            DisplayedYield::Server(v) | DisplayedYield::Estimate(v) => *v,
        }
    }

    pub fn is_estimate(&self) -> bool {
        matches!(self, DisplayedYield::Estimate(_))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Risk-adjusted yield estimate for bond cards
pub fn estimated_yield(bond: &Bond) -> f64 {
    round2(bond.coupon_rate * (1.0 + bond.risk_factor / 100.0))
}

/// Prefer the server's `dynamic_yield` when the bond is held
pub fn displayed_yield(bond: &Bond, portfolio: Option<&PortfolioView>) -> DisplayedYield {
    portfolio
        .and_then(|p| p.holding_for(&bond.id))
        .map(|h| DisplayedYield::Server(h.dynamic_yield))
        .unwrap_or_else(|| DisplayedYield::Estimate(estimated_yield(bond)))
}

/// Share of supply still available, in percent, clamped to `[0, 100]`
pub fn supply_ratio_pct(bond: &Bond) -> f64 {
    if bond.total_supply == 0 {
        return 0.0;
    }
    let pct = bond.available_supply as f64 / bond.total_supply as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// `$1,234.56`, negative values as `-$1,234.56`
pub fn format_usd(value: f64) -> String {
    let Some(amount) = Decimal::from_f64(value) else {
        return "$--".to_string();
    };
    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = amount.is_sign_negative() && !amount.is_zero();
    let text = format!("{:.2}", amount.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

pub fn format_pct(value: f64) -> String {
    format!("{:.2}%", value)
}
