//! Marketplace API Client
//!
//! HTTP client for the sovereign bond marketplace backend.
//! One request per call; failures are returned to the caller, never retried.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{
    Bond, BondYieldQuote, MarketStats, PortfolioPayload, PortfolioView, TradeReceipt, TradeRequest,
};
use crate::ports::{ApiError, BondMarketPort};

/// Marketplace client configuration
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Backend origin, e.g. `http://localhost:8001`. `/api/...` is appended.
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Marketplace backend client
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    base: Url,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct RootResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl MarketplaceClient {
    pub fn new(config: MarketplaceConfig) -> Result<Self, ApiError> {
        let base = Url::parse(config.base_url.trim())
            .map_err(|e| ApiError::Transport(format!("Invalid base URL '{}': {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!("Invalid base URL '{}'", config.base_url)));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base, http })
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `{base}/api/{segments...}` with each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode_body(status, &body)
    }
}

/// Map a status and raw body to a typed result.
///
/// Non-2xx bodies of the form `{"detail": ...}` become the rejection
/// detail; a non-string detail (e.g. validation errors) is kept as JSON.
pub fn decode_body<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .map(|e| match e.detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            });
        return Err(ApiError::Rejected { status, detail });
    }

    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl BondMarketPort for MarketplaceClient {
    async fn health(&self) -> Result<String, ApiError> {
        let root: RootResponse = self.get(self.endpoint(&[""])).await?;
        Ok(root.message)
    }

    async fn list_bonds(&self) -> Result<Vec<Bond>, ApiError> {
        self.get(self.endpoint(&["bonds"])).await
    }

    async fn get_bond(&self, bond_id: &str) -> Result<Bond, ApiError> {
        self.get(self.endpoint(&["bonds", bond_id])).await
    }

    async fn get_bond_yield(&self, bond_id: &str) -> Result<BondYieldQuote, ApiError> {
        self.get(self.endpoint(&["bonds", bond_id, "yield"])).await
    }

    async fn get_portfolio(&self, user_address: &str) -> Result<PortfolioView, ApiError> {
        let payload: PortfolioPayload = self.get(self.endpoint(&["portfolio", user_address])).await?;
        Ok(payload.into())
    }

    async fn market_stats(&self) -> Result<MarketStats, ApiError> {
        self.get(self.endpoint(&["market-stats"])).await
    }

    async fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, ApiError> {
        let url = self.endpoint(&["trade"]);
        tracing::debug!("POST {} {}", url, request);

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Self::handle_response(response).await
    }
}
