use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "USD".to_string()
}

/// A mock sovereign debt instrument as served by `/api/bonds`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub id: String,
    pub country: String,
    pub country_code: String,
    pub face_value: f64,
    /// Annual coupon rate in percent
    pub coupon_rate: f64,
    pub maturity_date: String,
    #[serde(default)]
    pub issue_date: String,
    pub current_price: f64,
    /// Country risk in percent
    pub risk_factor: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub total_supply: u64,
    pub available_supply: u64,
}

impl Bond {
    /// Units already placed with holders
    pub fn sold_supply(&self) -> u64 {
        self.total_supply.saturating_sub(self.available_supply)
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_supply == 0
    }

    /// Price relative to face value, in percent (100.0 = par)
    pub fn price_to_par_pct(&self) -> Option<f64> {
        if self.face_value <= 0.0 {
            return None;
        }
        Some(self.current_price / self.face_value * 100.0)
    }

    pub fn maturity(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.maturity_date, "%Y-%m-%d").ok()
    }

    /// Fractional years between `today` and maturity. Negative once matured.
    pub fn years_to_maturity(&self, today: NaiveDate) -> Option<f64> {
        let maturity = self.maturity()?;
        Some((maturity - today).num_days() as f64 / 365.25)
    }

    /// Case-insensitive match on id, country code or country name
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        self.id == needle
            || self.country_code.eq_ignore_ascii_case(needle)
            || self.country.eq_ignore_ascii_case(needle)
    }
}
