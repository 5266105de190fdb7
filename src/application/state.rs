//! UI state of the bond desk and its transitions.
//!
//! The trade form is a small state machine:
//!
//! ```text
//! Closed --open_trade--> Open --begin_submit--> Submitting --success--> Closed
//!                         ^  \                      |
//!                         |   `--cancel--> Closed   `--failure--> Open
//! ```
//!
//! Cancelling while Submitting closes the form and invalidates the
//! in-flight submission; its late result no longer touches the form.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Bond, TradeDirection};

/// Quantity shown in a freshly opened trade form
pub const DEFAULT_QUANTITY: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Market,
    Portfolio,
    Analytics,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Market, Tab::Portfolio, Tab::Analytics];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Market => "Marketplace",
            Tab::Portfolio => "Portfolio",
            Tab::Analytics => "Analytics",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Tab {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" | "marketplace" | "bonds" => Ok(Tab::Market),
            "portfolio" => Ok(Tab::Portfolio),
            "analytics" | "stats" => Ok(Tab::Analytics),
            other => Err(TransitionError::UnknownTab(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("Trade form is already open")]
    FormAlreadyOpen,
    #[error("Trade form is not open")]
    FormClosed,
    #[error("A trade is already being submitted")]
    AlreadySubmitting,
    #[error("Unknown bond: {0}")]
    UnknownBond(String),
    #[error("Unknown tab: {0}")]
    UnknownTab(String),
}

/// Snapshot of an accepted submission, taken when the form enters Submitting
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub generation: u64,
    pub bond: Bond,
    pub quantity: f64,
    pub direction: TradeDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub tab: Tab,
    pub selected_bond: Option<Bond>,
    /// Raw text of the quantity field
    pub quantity: String,
    pub direction: TradeDirection,
    pub modal: ModalState,
    /// True exactly while a submission is in flight
    pub loading: bool,
    generation: u64,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: Tab::default(),
            selected_bond: None,
            quantity: DEFAULT_QUANTITY.to_string(),
            direction: TradeDirection::default(),
            modal: ModalState::Closed,
            loading: false,
            generation: 0,
        }
    }
}

impl UiState {
    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn is_form_open(&self) -> bool {
        self.modal != ModalState::Closed
    }

    /// Closed -> Open with `bond` selected
    pub fn open_trade(&mut self, bond: Bond) -> Result<(), TransitionError> {
        if self.modal != ModalState::Closed {
            return Err(TransitionError::FormAlreadyOpen);
        }
        self.selected_bond = Some(bond);
        self.modal = ModalState::Open;
        Ok(())
    }

    pub fn set_quantity(&mut self, input: &str) -> Result<(), TransitionError> {
        self.require_open()?;
        self.quantity = input.to_string();
        Ok(())
    }

    pub fn set_direction(&mut self, direction: TradeDirection) -> Result<(), TransitionError> {
        self.require_open()?;
        self.direction = direction;
        Ok(())
    }

    /// Open -> Submitting. `quantity` is the already-parsed form value.
    pub fn begin_submit(&mut self, quantity: f64) -> Result<SubmitTicket, TransitionError> {
        self.require_open()?;
        let bond = self.selected_bond.clone().ok_or(TransitionError::FormClosed)?;

        self.generation += 1;
        self.modal = ModalState::Submitting;
        self.loading = true;

        Ok(SubmitTicket {
            generation: self.generation,
            bond,
            quantity,
            direction: self.direction,
        })
    }

    /// Submitting -> Closed (success) or Open (failure).
    ///
    /// Returns false and leaves the form alone when the ticket was
    /// superseded by a cancel.
    pub fn finish_submit(&mut self, ticket: &SubmitTicket, success: bool) -> bool {
        if self.modal != ModalState::Submitting || self.generation != ticket.generation {
            return false;
        }
        if success {
            self.close();
        } else {
            self.modal = ModalState::Open;
            self.loading = false;
        }
        true
    }

    /// Open | Submitting -> Closed
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        match self.modal {
            ModalState::Closed => Err(TransitionError::FormClosed),
            ModalState::Open => {
                self.close();
                Ok(())
            }
            ModalState::Submitting => {
                self.generation += 1;
                self.close();
                Ok(())
            }
        }
    }

    fn close(&mut self) {
        self.modal = ModalState::Closed;
        self.selected_bond = None;
        self.quantity = DEFAULT_QUANTITY.to_string();
        self.direction = TradeDirection::default();
        self.loading = false;
    }

    fn require_open(&self) -> Result<(), TransitionError> {
        match self.modal {
            ModalState::Open => Ok(()),
            ModalState::Submitting => Err(TransitionError::AlreadySubmitting),
            ModalState::Closed => Err(TransitionError::FormClosed),
        }
    }
}
