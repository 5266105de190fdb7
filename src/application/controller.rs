//! View Controller
//!
//! Owns the UI state and the three read-model caches (bonds, portfolio,
//! market stats) and keeps them in sync with the marketplace backend.
//! Reads are refreshed by user actions, after trades, and by the poller.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{
    parse_quantity, Bond, MarketStats, PortfolioView, TradeDirection, TradeReceipt, TradeRequest,
};
use crate::ports::{ApiError, BondMarketPort, Notifier};
use super::poller::{spawn_poller, PollHandle};
use super::sequencer::{AppliedTokens, ReadKind, RequestSequencer, RequestToken};
use super::state::{SubmitTicket, Tab, TransitionError, UiState};

/// Alert text when the server gives no reason for a failed trade
pub const GENERIC_TRADE_FAILURE: &str = "Trade failed. Please try again.";

/// Everything the rendering layer needs, cloned out by [`ViewController::snapshot`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub ui: UiState,
    pub bonds: Vec<Bond>,
    pub portfolio: Option<PortfolioView>,
    pub market_stats: Option<MarketStats>,
    pub last_refresh: Option<DateTime<Utc>>,
    applied: AppliedTokens,
}

/// Result of one read refresh. Never surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cache replaced with the response
    Applied,
    /// A newer response was already applied; this one was dropped
    Superseded,
    /// Request failed; previous cache kept
    Failed,
}

/// Result of a trade submission
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Executed(TradeReceipt),
    /// Server or transport failure; carries the alert shown to the user
    Rejected(String),
    /// Quantity input did not parse; nothing was sent
    InvalidQuantity(String),
}

/// Main view controller
pub struct ViewController<M, N> {
    market: Arc<M>,
    notifier: Arc<N>,
    user_address: String,
    state: Arc<RwLock<ViewState>>,
    sequencer: Arc<RequestSequencer>,
}

impl<M, N> Clone for ViewController<M, N> {
    fn clone(&self) -> Self {
        Self {
            market: Arc::clone(&self.market),
            notifier: Arc::clone(&self.notifier),
            user_address: self.user_address.clone(),
            state: Arc::clone(&self.state),
            sequencer: Arc::clone(&self.sequencer),
        }
    }
}

impl<M, N> ViewController<M, N>
where
    M: BondMarketPort + 'static,
    N: Notifier + 'static,
{
    pub fn new(market: M, notifier: N, user_address: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(market), Arc::new(notifier), user_address)
    }

    pub fn from_shared(market: Arc<M>, notifier: Arc<N>, user_address: impl Into<String>) -> Self {
        Self {
            market,
            notifier,
            user_address: user_address.into(),
            state: Arc::new(RwLock::new(ViewState::default())),
            sequencer: Arc::new(RequestSequencer::new()),
        }
    }

    pub fn user_address(&self) -> &str {
        &self.user_address
    }

    pub fn market(&self) -> &M {
        &self.market
    }

    /// Clone of the current state for rendering
    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn refresh_bonds(&self) -> RefreshOutcome {
        let token = self.sequencer.issue(ReadKind::Bonds);
        match self.market.list_bonds().await {
            Ok(bonds) => {
                let count = bonds.len();
                let outcome = self.apply(token, |state| state.bonds = bonds).await;
                tracing::debug!("Bonds refresh #{}: {:?} ({} bonds)", token.value, outcome, count);
                outcome
            }
            Err(e) => self.read_failed("bonds", e),
        }
    }

    pub async fn refresh_portfolio(&self) -> RefreshOutcome {
        let token = self.sequencer.issue(ReadKind::Portfolio);
        match self.market.get_portfolio(&self.user_address).await {
            Ok(portfolio) => {
                let outcome = self.apply(token, |state| state.portfolio = Some(portfolio)).await;
                tracing::debug!("Portfolio refresh #{}: {:?}", token.value, outcome);
                outcome
            }
            Err(e) => self.read_failed("portfolio", e),
        }
    }

    pub async fn refresh_market_stats(&self) -> RefreshOutcome {
        let token = self.sequencer.issue(ReadKind::MarketStats);
        match self.market.market_stats().await {
            Ok(stats) => {
                let outcome = self.apply(token, |state| state.market_stats = Some(stats)).await;
                tracing::debug!("Market stats refresh #{}: {:?}", token.value, outcome);
                outcome
            }
            Err(e) => self.read_failed("market stats", e),
        }
    }

    /// All three reads, concurrently
    pub async fn refresh_all(&self) -> [RefreshOutcome; 3] {
        let (bonds, portfolio, stats) = tokio::join!(
            self.refresh_bonds(),
            self.refresh_portfolio(),
            self.refresh_market_stats(),
        );
        [bonds, portfolio, stats]
    }

    /// One poller tick: bonds and market stats
    pub async fn poll_once(&self) {
        tokio::join!(self.refresh_bonds(), self.refresh_market_stats());
    }

    /// Start the recurring bonds/market-stats refresh.
    ///
    /// Polling stops when the returned handle is shut down or dropped.
    pub fn start_polling(&self, interval: Duration) -> PollHandle {
        let controller = self.clone();
        spawn_poller(interval, move || {
            let controller = controller.clone();
            async move { controller.poll_once().await }
        })
    }

    async fn apply<F>(&self, token: RequestToken, write: F) -> RefreshOutcome
    where
        F: FnOnce(&mut ViewState),
    {
        let mut state = self.state.write().await;
        if !state.applied.accept(token) {
            tracing::debug!(
                "Dropping {:?} response #{} (already showing #{})",
                token.kind,
                token.value,
                state.applied.last(token.kind)
            );
            return RefreshOutcome::Superseded;
        }
        write(&mut *state);
        state.last_refresh = Some(Utc::now());
        RefreshOutcome::Applied
    }

    fn read_failed(&self, what: &str, error: ApiError) -> RefreshOutcome {
        tracing::warn!("Failed to refresh {}: {}", what, error);
        RefreshOutcome::Failed
    }

    // ------------------------------------------------------------------
    // UI actions
    // ------------------------------------------------------------------

    pub async fn select_tab(&self, tab: Tab) {
        self.state.write().await.ui.select_tab(tab);
    }

    /// Open the trade form on a cached bond (id, country code or name)
    pub async fn open_trade(&self, bond: &str) -> Result<(), TransitionError> {
        let mut state = self.state.write().await;
        let selected = state
            .bonds
            .iter()
            .find(|b| b.matches(bond))
            .cloned()
            .ok_or_else(|| TransitionError::UnknownBond(bond.to_string()))?;
        state.ui.open_trade(selected)
    }

    pub async fn set_quantity(&self, input: &str) -> Result<(), TransitionError> {
        self.state.write().await.ui.set_quantity(input)
    }

    pub async fn set_direction(&self, direction: TradeDirection) -> Result<(), TransitionError> {
        self.state.write().await.ui.set_direction(direction)
    }

    pub async fn cancel_trade(&self) -> Result<(), TransitionError> {
        self.state.write().await.ui.cancel()
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Submit the open trade form.
    ///
    /// Success notifies with the transaction id, closes the form and
    /// refreshes all three caches once. Failure alerts and reopens the form
    /// with its input intact. Nothing is retried.
    pub async fn submit_trade(&self) -> Result<TradeOutcome, TransitionError> {
        let ticket = {
            let mut state = self.state.write().await;
            if state.ui.loading {
                return Err(TransitionError::AlreadySubmitting);
            }
            if !state.ui.is_form_open() {
                return Err(TransitionError::FormClosed);
            }
            let quantity = match parse_quantity(&state.ui.quantity) {
                Ok(quantity) => quantity,
                Err(e) => {
                    drop(state);
                    let message = format!("Please enter a valid quantity. {}", e);
                    self.notifier.alert(&message);
                    return Ok(TradeOutcome::InvalidQuantity(message));
                }
            };
            state.ui.begin_submit(quantity)?
        };

        let request = TradeRequest::new(
            &self.user_address,
            &ticket.bond.id,
            ticket.quantity,
            ticket.direction,
        );
        tracing::info!("Submitting trade: {}", request);

        match self.market.submit_trade(&request).await {
            Ok(receipt) if receipt.success => {
                tracing::info!("Trade executed, transaction {}", receipt.transaction_id);
                self.notifier.notify(&format!(
                    "Trade executed successfully! Transaction ID: {}",
                    receipt.transaction_id
                ));
                if !self.state.write().await.ui.finish_submit(&ticket, true) {
                    tracing::debug!("Trade form changed while submitting; leaving it as is");
                }
                self.refresh_all().await;
                Ok(TradeOutcome::Executed(receipt))
            }
            Ok(_) => {
                tracing::warn!("Trade not accepted by server: {}", request);
                Ok(self.trade_failed(&ticket, GENERIC_TRADE_FAILURE.to_string()).await)
            }
            Err(e) => {
                tracing::warn!("Trade failed: {}", e);
                let message = e.detail().unwrap_or(GENERIC_TRADE_FAILURE).to_string();
                Ok(self.trade_failed(&ticket, message).await)
            }
        }
    }

    /// Open the form on `bond`, fill it in and submit in one go
    pub async fn quick_trade(
        &self,
        bond: &str,
        quantity: &str,
        direction: TradeDirection,
    ) -> Result<TradeOutcome, TransitionError> {
        self.open_trade(bond).await?;
        self.set_quantity(quantity).await?;
        self.set_direction(direction).await?;
        self.submit_trade().await
    }

    async fn trade_failed(&self, ticket: &SubmitTicket, message: String) -> TradeOutcome {
        self.notifier.alert(&message);
        self.state.write().await.ui.finish_submit(ticket, false);
        TradeOutcome::Rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::ModalState;
    use crate::domain::bond::fixtures::{ghana, south_africa};
    use crate::ports::mocks::{Endpoint, MockBondMarket, RecordingNotifier};
    use crate::ports::notifier::MockNotifier;

    fn market() -> MockBondMarket {
        MockBondMarket::new()
            .with_bonds(vec![ghana(), south_africa()])
            .with_stats(MarketStats { active_bonds: 2, ..Default::default() })
    }

    #[tokio::test]
    async fn test_refresh_replaces_caches() {
        let controller = ViewController::new(market(), RecordingNotifier::new(), "0xabc");

        let outcomes = controller.refresh_all().await;
        assert_eq!(outcomes, [RefreshOutcome::Applied; 3]);

        let view = controller.snapshot().await;
        assert_eq!(view.bonds.len(), 2);
        assert!(view.portfolio.is_some());
        assert_eq!(view.market_stats.unwrap().active_bonds, 2);
        assert!(view.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_cache() {
        let mock = market();
        let controller = ViewController::new(mock.clone(), RecordingNotifier::new(), "0xabc");
        controller.refresh_bonds().await;

        mock.set_failing_reads(true);
        assert_eq!(controller.refresh_bonds().await, RefreshOutcome::Failed);
        assert_eq!(controller.snapshot().await.bonds.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_read_leaves_empty_state() {
        let mock = market();
        mock.set_failing_reads(true);
        let notifier = RecordingNotifier::new();
        let controller = ViewController::new(mock, notifier.clone(), "0xabc");

        controller.refresh_all().await;
        let view = controller.snapshot().await;
        assert!(view.bonds.is_empty());
        assert!(view.portfolio.is_none());
        assert!(view.market_stats.is_none());
        // Read failures are not surfaced to the user
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_portfolio_keeps_previous_view() {
        use crate::adapters::marketplace::decode_body;
        use crate::domain::{Portfolio, PortfolioPayload};

        let cached = PortfolioView {
            portfolio: Portfolio {
                user_address: "0xabc".to_string(),
                total_value: 9500.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mock = market().with_portfolio(cached.clone());
        let controller = ViewController::new(mock.clone(), RecordingNotifier::new(), "0xabc");
        assert_eq!(controller.refresh_portfolio().await, RefreshOutcome::Applied);

        let body = std::fs::read(format!(
            "{}/fixtures/marketplace/portfolio_malformed_v1.json",
            env!("CARGO_MANIFEST_DIR")
        ))
        .unwrap();
        let error = decode_body::<PortfolioPayload>(200, &body).unwrap_err();
        assert!(matches!(error, ApiError::Decode(_)));
        mock.fail_next_portfolio(error);

        assert_eq!(controller.refresh_portfolio().await, RefreshOutcome::Failed);
        assert_eq!(controller.snapshot().await.portfolio, Some(cached));
    }

    #[tokio::test]
    async fn test_stale_bonds_response_is_discarded() {
        let mock = MockBondMarket::new().with_bonds(vec![ghana()]);
        let controller = ViewController::new(mock.clone(), RecordingNotifier::new(), "0xabc");

        let release = mock.hold_next_bonds();
        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh_bonds().await })
        };
        tokio::task::yield_now().await;
        while mock.calls(Endpoint::Bonds) == 0 {
            tokio::task::yield_now().await;
        }

        mock.set_bonds(vec![ghana(), south_africa()]);
        assert_eq!(controller.refresh_bonds().await, RefreshOutcome::Applied);

        release.send(()).unwrap();
        assert_eq!(slow.await.unwrap(), RefreshOutcome::Superseded);
        assert_eq!(controller.snapshot().await.bonds.len(), 2);
    }

    #[tokio::test]
    async fn test_trade_success_notifies_once_with_transaction_id() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|message| message.contains("abc123"))
            .times(1)
            .return_const(());
        notifier.expect_alert().times(0);

        let mock = market().with_trade_response(Ok(TradeReceipt::accepted("abc123")));
        let controller = ViewController::new(mock.clone(), notifier, "0xabc");
        controller.refresh_bonds().await;

        let outcome = controller
            .quick_trade("bond-gh", "2", TradeDirection::Buy)
            .await
            .unwrap();
        assert!(matches!(outcome, TradeOutcome::Executed(ref r) if r.transaction_id == "abc123"));
        assert_eq!(mock.calls(Endpoint::Trade), 1);
    }

    #[tokio::test]
    async fn test_trade_success_refreshes_each_cache_once_and_closes() {
        let mock = market().with_trade_response(Ok(TradeReceipt::accepted("tx-9")));
        let controller = ViewController::new(mock.clone(), RecordingNotifier::new(), "0xabc");
        controller.refresh_bonds().await;
        let bonds_before = mock.calls(Endpoint::Bonds);

        controller.quick_trade("GH", "3", TradeDirection::Sell).await.unwrap();

        assert_eq!(mock.calls(Endpoint::Bonds), bonds_before + 1);
        assert_eq!(mock.calls(Endpoint::Portfolio), 1);
        assert_eq!(mock.calls(Endpoint::MarketStats), 1);

        let request = &mock.trade_requests()[0];
        assert_eq!(request.bond_id, "bond-gh");
        assert_eq!(request.quantity, 3.0);
        assert_eq!(request.transaction_type, TradeDirection::Sell);
        assert_eq!(request.user_address, "0xabc");

        let ui = controller.snapshot().await.ui;
        assert_eq!(ui.modal, ModalState::Closed);
        assert_eq!(ui.quantity, "1");
        assert!(!ui.loading);
    }

    #[tokio::test]
    async fn test_trade_rejection_shows_server_detail() {
        let mock = market().with_trade_response(Err(ApiError::Rejected {
            status: 400,
            detail: Some("Insufficient bond supply".to_string()),
        }));
        let notifier = RecordingNotifier::new();
        let controller = ViewController::new(mock.clone(), notifier.clone(), "0xabc");
        controller.refresh_bonds().await;
        let bonds_before = mock.calls(Endpoint::Bonds);

        let outcome = controller
            .quick_trade("bond-gh", "99999", TradeDirection::Buy)
            .await
            .unwrap();

        assert_eq!(outcome, TradeOutcome::Rejected("Insufficient bond supply".to_string()));
        assert_eq!(notifier.alerts(), vec!["Insufficient bond supply".to_string()]);
        assert_eq!(mock.calls(Endpoint::Bonds), bonds_before);
        assert_eq!(mock.calls(Endpoint::Portfolio), 0);
        assert_eq!(mock.calls(Endpoint::MarketStats), 0);

        let ui = controller.snapshot().await.ui;
        assert_eq!(ui.modal, ModalState::Open);
        assert_eq!(ui.quantity, "99999");
        assert_eq!(ui.selected_bond.unwrap().id, "bond-gh");
    }

    #[tokio::test]
    async fn test_trade_transport_error_uses_generic_message() {
        let mock = market().with_trade_response(Err(ApiError::Transport("timeout".to_string())));
        let notifier = RecordingNotifier::new();
        let controller = ViewController::new(mock, notifier.clone(), "0xabc");
        controller.refresh_bonds().await;

        controller.quick_trade("bond-za", "1", TradeDirection::Buy).await.unwrap();
        assert_eq!(notifier.alerts(), vec![GENERIC_TRADE_FAILURE.to_string()]);
    }

    #[tokio::test]
    async fn test_unsuccessful_flag_is_a_failure() {
        let receipt = TradeReceipt { success: false, ..TradeReceipt::accepted("") };
        let mock = market().with_trade_response(Ok(receipt));
        let notifier = RecordingNotifier::new();
        let controller = ViewController::new(mock.clone(), notifier.clone(), "0xabc");
        controller.refresh_bonds().await;

        let outcome = controller.quick_trade("bond-gh", "1", TradeDirection::Buy).await.unwrap();
        assert_eq!(outcome, TradeOutcome::Rejected(GENERIC_TRADE_FAILURE.to_string()));
        assert!(notifier.infos().is_empty());
        assert_eq!(mock.calls(Endpoint::Portfolio), 0);
    }

    #[tokio::test]
    async fn test_invalid_quantity_sends_nothing() {
        let mock = market();
        let notifier = RecordingNotifier::new();
        let controller = ViewController::new(mock.clone(), notifier.clone(), "0xabc");
        controller.refresh_bonds().await;

        let outcome = controller.quick_trade("bond-gh", "ten", TradeDirection::Buy).await.unwrap();
        assert!(matches!(outcome, TradeOutcome::InvalidQuantity(_)));
        assert_eq!(mock.calls(Endpoint::Trade), 0);
        assert_eq!(notifier.alerts().len(), 1);

        let ui = controller.snapshot().await.ui;
        assert_eq!(ui.modal, ModalState::Open);
        assert_eq!(ui.quantity, "ten");
    }

    #[tokio::test]
    async fn test_submit_without_open_form() {
        let controller = ViewController::new(market(), RecordingNotifier::new(), "0xabc");
        assert_eq!(controller.submit_trade().await, Err(TransitionError::FormClosed));
    }

    #[tokio::test]
    async fn test_open_unknown_bond() {
        let controller = ViewController::new(market(), RecordingNotifier::new(), "0xabc");
        controller.refresh_bonds().await;
        assert_eq!(
            controller.open_trade("XX").await,
            Err(TransitionError::UnknownBond("XX".to_string()))
        );
    }

    #[tokio::test]
    async fn test_cancel_resets_form() {
        let controller = ViewController::new(market(), RecordingNotifier::new(), "0xabc");
        controller.refresh_bonds().await;
        controller.open_trade("ZA").await.unwrap();
        controller.set_quantity("12").await.unwrap();

        controller.cancel_trade().await.unwrap();
        let ui = controller.snapshot().await.ui;
        assert_eq!(ui.modal, ModalState::Closed);
        assert_eq!(ui.quantity, "1");
        assert!(ui.selected_bond.is_none());
    }

    #[tokio::test]
    async fn test_late_trade_result_after_cancel() {
        let mock = market().with_trade_response(Ok(TradeReceipt::accepted("late-1")));
        let notifier = RecordingNotifier::new();
        let controller = ViewController::new(mock.clone(), notifier.clone(), "0xabc");
        controller.refresh_bonds().await;

        let release = mock.hold_next_trade();
        controller.open_trade("bond-gh").await.unwrap();
        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit_trade().await })
        };
        while mock.calls(Endpoint::Trade) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(controller.snapshot().await.ui.loading);

        controller.cancel_trade().await.unwrap();
        controller.open_trade("bond-za").await.unwrap();

        release.send(()).unwrap();
        let outcome = pending.await.unwrap().unwrap();
        assert!(matches!(outcome, TradeOutcome::Executed(_)));

        // The user still hears about the trade, but the new form stays open
        assert_eq!(notifier.infos().len(), 1);
        let ui = controller.snapshot().await.ui;
        assert_eq!(ui.modal, ModalState::Open);
        assert_eq!(ui.selected_bond.unwrap().id, "bond-za");
        assert_eq!(mock.calls(Endpoint::Portfolio), 1);
    }

    #[tokio::test]
    async fn test_second_submit_while_loading_is_rejected() {
        let mock = market().with_trade_response(Ok(TradeReceipt::accepted("tx")));
        let controller = ViewController::new(mock.clone(), RecordingNotifier::new(), "0xabc");
        controller.refresh_bonds().await;

        let release = mock.hold_next_trade();
        controller.open_trade("bond-gh").await.unwrap();
        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit_trade().await })
        };
        while mock.calls(Endpoint::Trade) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(controller.submit_trade().await, Err(TransitionError::AlreadySubmitting));
        release.send(()).unwrap();
        pending.await.unwrap().unwrap();
        assert_eq!(mock.trade_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_refreshes_bonds_and_stats_until_dropped() {
        let mock = market();
        let controller = ViewController::new(mock.clone(), RecordingNotifier::new(), "0xabc");

        let handle = controller.start_polling(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(mock.calls(Endpoint::Bonds), 2);
        assert_eq!(mock.calls(Endpoint::MarketStats), 2);
        assert_eq!(mock.calls(Endpoint::Portfolio), 0);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(mock.calls(Endpoint::Bonds), 2);
    }

    #[tokio::test]
    async fn test_tab_selection() {
        let controller = ViewController::new(market(), RecordingNotifier::new(), "0xabc");
        controller.select_tab(Tab::Analytics).await;
        assert_eq!(controller.snapshot().await.ui.tab, Tab::Analytics);
    }
}
