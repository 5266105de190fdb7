use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::{Bond, BondYieldQuote, MarketStats, PortfolioView, TradeReceipt, TradeRequest};
use super::market_data::{ApiError, BondMarketPort};
use super::notifier::Notifier;

/// Marketplace endpoints, for call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Bonds,
    Bond,
    BondYield,
    Portfolio,
    MarketStats,
    Trade,
}

#[derive(Debug, Default)]
struct MarketState {
    bonds: Vec<Bond>,
    portfolio: PortfolioView,
    portfolio_errors: VecDeque<ApiError>,
    stats: MarketStats,
    yields: HashMap<String, BondYieldQuote>,
    failing_reads: bool,
    trade_responses: VecDeque<Result<TradeReceipt, ApiError>>,
    trade_requests: Vec<TradeRequest>,
    calls: HashMap<Endpoint, usize>,
    bond_gates: VecDeque<oneshot::Receiver<()>>,
    trade_gates: VecDeque<oneshot::Receiver<()>>,
}

/// Mock marketplace that records calls and serves scripted responses.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MockBondMarket {
    state: Arc<Mutex<MarketState>>,
}

impl MockBondMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the bonds list
    pub fn with_bonds(self, bonds: Vec<Bond>) -> Self {
        self.set_bonds(bonds);
        self
    }

    pub fn with_portfolio(self, portfolio: PortfolioView) -> Self {
        self.state.lock().unwrap().portfolio = portfolio;
        self
    }

    pub fn with_stats(self, stats: MarketStats) -> Self {
        self.state.lock().unwrap().stats = stats;
        self
    }

    pub fn with_yield(self, quote: BondYieldQuote) -> Self {
        self.state.lock().unwrap().yields.insert(quote.bond_id.clone(), quote);
        self
    }

    /// Queue the response for the next trade submission
    pub fn with_trade_response(self, response: Result<TradeReceipt, ApiError>) -> Self {
        self.state.lock().unwrap().trade_responses.push_back(response);
        self
    }

    /// Fail the next `get_portfolio` call with `error`
    pub fn fail_next_portfolio(&self, error: ApiError) {
        self.state.lock().unwrap().portfolio_errors.push_back(error);
    }

    pub fn set_bonds(&self, bonds: Vec<Bond>) {
        self.state.lock().unwrap().bonds = bonds;
    }

    /// Make every read endpoint fail with a transport error
    pub fn set_failing_reads(&self, failing: bool) {
        self.state.lock().unwrap().failing_reads = failing;
    }

    /// Hold the next `list_bonds` response until the returned sender fires.
    /// The response body is captured when the call starts.
    pub fn hold_next_bonds(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().bond_gates.push_back(rx);
        tx
    }

    /// Hold the next trade response until the returned sender fires
    pub fn hold_next_trade(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().trade_gates.push_back(rx);
        tx
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state.lock().unwrap().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Get all recorded trade requests
    pub fn trade_requests(&self) -> Vec<TradeRequest> {
        self.state.lock().unwrap().trade_requests.clone()
    }

    fn record(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(endpoint).or_insert(0) += 1;
        if state.failing_reads && endpoint != Endpoint::Trade {
            return Err(ApiError::Transport("mock read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BondMarketPort for MockBondMarket {
    async fn health(&self) -> Result<String, ApiError> {
        self.record(Endpoint::Health)?;
        Ok("Sovereign Bond Marketplace API".to_string())
    }

    async fn list_bonds(&self) -> Result<Vec<Bond>, ApiError> {
        self.record(Endpoint::Bonds)?;
        let (bonds, gate) = {
            let mut state = self.state.lock().unwrap();
            (state.bonds.clone(), state.bond_gates.pop_front())
        };
        if let Some(gate) = gate {
            gate.await.ok();
        }
        Ok(bonds)
    }

    async fn get_bond(&self, bond_id: &str) -> Result<Bond, ApiError> {
        self.record(Endpoint::Bond)?;
        self.state
            .lock()
            .unwrap()
            .bonds
            .iter()
            .find(|b| b.id == bond_id)
            .cloned()
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                detail: Some("Bond not found".to_string()),
            })
    }

    async fn get_bond_yield(&self, bond_id: &str) -> Result<BondYieldQuote, ApiError> {
        self.record(Endpoint::BondYield)?;
        self.state
            .lock()
            .unwrap()
            .yields
            .get(bond_id)
            .cloned()
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                detail: Some("Bond not found".to_string()),
            })
    }

    async fn get_portfolio(&self, _user_address: &str) -> Result<PortfolioView, ApiError> {
        self.record(Endpoint::Portfolio)?;
        let mut state = self.state.lock().unwrap();
        match state.portfolio_errors.pop_front() {
            Some(error) => Err(error),
            None => Ok(state.portfolio.clone()),
        }
    }

    async fn market_stats(&self) -> Result<MarketStats, ApiError> {
        self.record(Endpoint::MarketStats)?;
        Ok(self.state.lock().unwrap().stats.clone())
    }

    async fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, ApiError> {
        self.record(Endpoint::Trade)?;
        let (response, gate) = {
            let mut state = self.state.lock().unwrap();
            state.trade_requests.push(request.clone());
            let response = state
                .trade_responses
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("No response configured".to_string())));
            (response, state.trade_gates.pop_front())
        };
        if let Some(gate) = gate {
            gate.await.ok();
        }
        response
    }
}

/// A message captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Info(String),
    Alert(String),
}

/// Notifier that records every message
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Notification> {
        self.messages.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Notification::Info(text) => Some(text),
                Notification::Alert(_) => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Notification::Alert(text) => Some(text),
                Notification::Info(_) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(Notification::Info(message.to_string()));
    }

    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(Notification::Alert(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeDirection;

    #[tokio::test]
    async fn test_mock_market_counts_calls() {
        let mock = MockBondMarket::new().with_stats(MarketStats {
            active_bonds: 4,
            ..Default::default()
        });

        let stats = mock.market_stats().await.unwrap();
        assert_eq!(stats.active_bonds, 4);
        assert_eq!(mock.calls(Endpoint::MarketStats), 1);
        assert_eq!(mock.calls(Endpoint::Bonds), 0);
    }

    #[tokio::test]
    async fn test_mock_failing_reads() {
        let mock = MockBondMarket::new();
        mock.set_failing_reads(true);

        assert!(mock.list_bonds().await.is_err());
        assert_eq!(mock.calls(Endpoint::Bonds), 1);
    }

    #[tokio::test]
    async fn test_mock_trade_records_request() {
        let mock = MockBondMarket::new().with_trade_response(Ok(TradeReceipt::accepted("tx-1")));
        let request = TradeRequest::new("0xabc", "bond-gh", 2.0, TradeDirection::Buy);

        let receipt = mock.submit_trade(&request).await.unwrap();
        assert_eq!(receipt.transaction_id, "tx-1");
        assert_eq!(mock.trade_requests(), vec![request.clone()]);

        // Nothing queued for the second call
        assert!(mock.submit_trade(&request).await.is_err());
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify("done");
        notifier.alert("failed");

        assert_eq!(notifier.infos(), vec!["done".to_string()]);
        assert_eq!(notifier.alerts(), vec!["failed".to_string()]);
    }
}
