//! Application Layer - view controller and the state it owns

pub mod state;
pub mod sequencer;
pub mod poller;
pub mod controller;

pub use controller::{RefreshOutcome, TradeOutcome, ViewController, ViewState, GENERIC_TRADE_FAILURE};
pub use poller::PollHandle;
pub use sequencer::{ReadKind, RequestSequencer};
pub use state::{ModalState, Tab, TransitionError, UiState, DEFAULT_QUANTITY};
