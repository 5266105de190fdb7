//! Stateless rendering of the view state as terminal text.
//!
//! Every function here is pure: same input, same string. Nothing reads
//! the network or the clock except through the values passed in.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::application::{ModalState, Tab, UiState, ViewState};
use crate::domain::{
    displayed_yield, format_pct, format_usd, supply_ratio_pct, Bond, BondYieldQuote,
    DisplayedYield, MarketStats, PortfolioView, RiskBand, YieldBand,
};

/// Width of the supply bar in characters
pub const SUPPLY_BAR_WIDTH: usize = 20;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// ANSI colouring, switchable for pipes and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub color: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn ansi() -> Self {
        Self { color: true }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    pub fn risk(&self, band: RiskBand, text: &str) -> String {
        let code = match band {
            RiskBand::Low => GREEN,
            RiskBand::Medium => YELLOW,
            RiskBand::High => RED,
        };
        self.paint(code, text)
    }

    pub fn yield_band(&self, band: YieldBand, text: &str) -> String {
        match band {
            YieldBand::Highest => self.paint(GREEN, text),
            YieldBand::Elevated => self.paint(YELLOW, text),
            YieldBand::Standard => text.to_string(),
        }
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    pub fn accent(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn pnl(&self, value: f64) -> String {
        let text = format_usd(value);
        if value > 0.0 {
            self.paint(GREEN, &text)
        } else if value < 0.0 {
            self.paint(RED, &text)
        } else {
            text
        }
    }
}

/// `[#######-------------]` filled by available supply
pub fn supply_bar(bond: &Bond) -> String {
    let filled = ((supply_ratio_pct(bond) / 100.0) * SUPPLY_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(SUPPLY_BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(SUPPLY_BAR_WIDTH - filled))
}

pub fn render_tabs(active: Tab, palette: Palette) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            if *tab == active {
                palette.bold(&format!("[ {} ]", tab.title()))
            } else {
                palette.dim(&format!("  {}  ", tab.title()))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn yield_text(shown: DisplayedYield, palette: Palette) -> String {
    let value = shown.value();
    let mut text = format_pct(value);
    if shown.is_estimate() {
        text.push_str(" est.");
    }
    palette.yield_band(YieldBand::from_yield(value), &text)
}

pub fn render_bond_card(index: usize, bond: &Bond, shown: DisplayedYield, palette: Palette) -> String {
    let risk = RiskBand::from_risk_factor(bond.risk_factor);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>2}. {} ({})  matures {}",
        index,
        palette.bold(&bond.country),
        bond.country_code,
        bond.maturity_date
    );
    let _ = writeln!(
        out,
        "    Price {}  Face {}  Coupon {}",
        format_usd(bond.current_price),
        format_usd(bond.face_value),
        format_pct(bond.coupon_rate)
    );
    let _ = writeln!(
        out,
        "    Yield {}  Risk {}",
        yield_text(shown, palette),
        palette.risk(risk, &format!("{} {}", format_pct(bond.risk_factor), risk))
    );
    let availability = if bond.is_sold_out() {
        palette.dim("sold out")
    } else {
        format!("{} / {} available", bond.available_supply, bond.total_supply)
    };
    let _ = writeln!(out, "    Supply {} {}", supply_bar(bond), availability);
    out
}

pub fn render_market(bonds: &[Bond], portfolio: Option<&PortfolioView>, palette: Palette) -> String {
    if bonds.is_empty() {
        return palette.dim("No bonds loaded yet.\n");
    }
    bonds
        .iter()
        .enumerate()
        .map(|(i, bond)| render_bond_card(i + 1, bond, displayed_yield(bond, portfolio), palette))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_portfolio(portfolio: Option<&PortfolioView>, palette: Palette) -> String {
    let Some(view) = portfolio else {
        return palette.dim("Portfolio not loaded yet.\n");
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total value {}  Avg yield {}  Bonds held {}",
        palette.bold(&format_usd(view.portfolio.total_value)),
        format_pct(view.portfolio.total_yield),
        view.summary.total_bonds
    );

    if view.is_empty() {
        let _ = writeln!(out, "{}", palette.dim("No holdings. Buy a bond from the marketplace."));
        return out;
    }

    for holding in &view.holdings {
        let _ = writeln!(
            out,
            "  {} ({})  qty {}  value {}  yield {}  P&L {}",
            holding.bond.country,
            holding.bond.country_code,
            holding.quantity,
            format_usd(holding.current_value),
            palette.yield_band(
                YieldBand::from_yield(holding.dynamic_yield),
                &format_pct(holding.dynamic_yield)
            ),
            palette.pnl(holding.unrealized_pnl)
        );
    }
    let _ = writeln!(out, "  Unrealized P&L {}", palette.pnl(view.total_unrealized_pnl()));
    out
}

pub fn render_analytics(stats: Option<&MarketStats>, bonds: &[Bond], palette: Palette) -> String {
    let Some(stats) = stats else {
        return palette.dim("Market statistics not loaded yet.\n");
    };

    let mut out = String::new();
    let _ = writeln!(out, "Total market value  {}", palette.bold(&format_usd(stats.total_market_value)));
    let _ = writeln!(out, "Average yield       {}", format_pct(stats.average_yield));
    let _ = writeln!(out, "Active bonds        {}", stats.active_bonds);
    let _ = writeln!(out, "24h volume          {}", format_usd(stats.total_volume_24h));
    let _ = writeln!(out, "Transactions        {}", stats.total_transactions);

    if !bonds.is_empty() {
        let count = |band: RiskBand| {
            bonds
                .iter()
                .filter(|b| RiskBand::from_risk_factor(b.risk_factor) == band)
                .count()
        };
        let _ = writeln!(
            out,
            "Risk distribution   {}  {}  {}",
            palette.risk(RiskBand::Low, &format!("low {}", count(RiskBand::Low))),
            palette.risk(RiskBand::Medium, &format!("medium {}", count(RiskBand::Medium))),
            palette.risk(RiskBand::High, &format!("high {}", count(RiskBand::High)))
        );
    }
    out
}

/// The trade form, or `None` while it is closed
pub fn render_trade_form(ui: &UiState, palette: Palette) -> Option<String> {
    if ui.modal == ModalState::Closed {
        return None;
    }
    let bond = ui.selected_bond.as_ref()?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", palette.accent(&format!("--- Trade {} ({}) ---", bond.country, bond.country_code)));
    let _ = writeln!(
        out,
        "  Price {}  Available {}",
        format_usd(bond.current_price),
        bond.available_supply
    );
    let _ = writeln!(out, "  Quantity: {}  Direction: {}", ui.quantity, ui.direction);
    if let Ok(quantity) = ui.quantity.trim().parse::<f64>() {
        let _ = writeln!(out, "  Estimated total {}", format_usd(quantity * bond.current_price));
    }
    if ui.loading {
        let _ = writeln!(out, "  {}", palette.dim("Submitting..."));
    } else {
        let _ = writeln!(out, "  {}", palette.dim("qty <n> | buy | sell | cancel"));
    }
    Some(out)
}

/// Single bond card with identifiers, time to maturity and the yield breakdown
pub fn render_bond_detail(
    bond: &Bond,
    quote: Option<&BondYieldQuote>,
    today: NaiveDate,
    palette: Palette,
) -> String {
    let shown = quote
        .map(|q| DisplayedYield::Server(q.dynamic_yield))
        .unwrap_or_else(|| displayed_yield(bond, None));

    let mut out = render_bond_card(1, bond, shown, palette);
    let _ = writeln!(out, "    Id {}  Issued {}  Currency {}", bond.id, bond.issue_date, bond.currency);
    match bond.years_to_maturity(today) {
        Some(years) if years > 0.0 => {
            let _ = writeln!(out, "    Matures in {:.1} years", years);
        }
        Some(_) => {
            let _ = writeln!(out, "    {}", palette.dim("Matured"));
        }
        None => {}
    }
    if let Some(pct) = bond.price_to_par_pct() {
        let _ = writeln!(out, "    Price to par {}", format_pct(pct));
    }
    if let Some(q) = quote {
        let _ = writeln!(
            out,
            "    Base yield {}  Risk premium {}",
            format_pct(q.base_yield),
            format_pct(q.risk_premium())
        );
    }
    out
}

/// Full dashboard frame for the current state
pub fn render_view(state: &ViewState, user_address: &str, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  {}", palette.bold("Sovereign Bond Desk"), palette.dim(user_address));
    let _ = writeln!(out, "{}", render_tabs(state.ui.tab, palette));
    out.push('\n');

    let body = match state.ui.tab {
        Tab::Market => render_market(&state.bonds, state.portfolio.as_ref(), palette),
        Tab::Portfolio => render_portfolio(state.portfolio.as_ref(), palette),
        Tab::Analytics => render_analytics(state.market_stats.as_ref(), &state.bonds, palette),
    };
    out.push_str(&body);

    if let Some(form) = render_trade_form(&state.ui, palette) {
        out.push('\n');
        out.push_str(&form);
    }

    let updated = state
        .last_refresh
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let _ = writeln!(out, "\n{}", palette.dim(&format!("Last update {}", updated)));
    out
}
