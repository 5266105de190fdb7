//! Interactive dashboard
//!
//! Reads one command per line from stdin and drives the view controller.
//! The poller keeps bonds and market stats fresh in the background; the
//! frame is redrawn after every command and on every poll tick.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::adapters::terminal::{render_view, Palette};
use crate::application::{Tab, TradeOutcome, TransitionError, ViewController};
use crate::domain::TradeDirection;
use crate::ports::{BondMarketPort, Notifier};

pub const HELP: &str = "\
Commands:
  tab market|portfolio|analytics   switch tab
  select <id|code|index>           open the trade form on a bond
  qty <n>                          set the trade quantity
  buy | sell                       submit the open form in that direction
  cancel                           close the trade form
  refresh                          reload bonds, portfolio and stats
  help                             show this text
  quit                             leave the dashboard";

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardInput {
    Empty,
    Tab(Tab),
    Select(String),
    Quantity(String),
    Submit(TradeDirection),
    Cancel,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Unknown command '{0}'. Type 'help' for the list.")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub fn parse_input(line: &str) -> Result<DashboardInput, InputError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(DashboardInput::Empty);
    };
    let argument = words.next();

    let input = match command.to_ascii_lowercase().as_str() {
        "tab" => DashboardInput::Tab(argument.ok_or(InputError::MissingArgument("tab"))?.parse()?),
        "select" | "s" => DashboardInput::Select(
            argument.ok_or(InputError::MissingArgument("select"))?.to_string(),
        ),
        "qty" | "q" => DashboardInput::Quantity(
            argument.ok_or(InputError::MissingArgument("qty"))?.to_string(),
        ),
        "buy" => DashboardInput::Submit(TradeDirection::Buy),
        "sell" => DashboardInput::Submit(TradeDirection::Sell),
        "cancel" | "c" => DashboardInput::Cancel,
        "refresh" | "r" => DashboardInput::Refresh,
        "help" | "h" | "?" => DashboardInput::Help,
        "quit" | "exit" => DashboardInput::Quit,
        other => match other.parse::<Tab>() {
            Ok(tab) => DashboardInput::Tab(tab),
            Err(_) => return Err(InputError::Unknown(other.to_string())),
        },
    };
    Ok(input)
}

/// Apply one input to the controller. Returns a line to show, if any.
pub async fn apply_input<M, N>(
    controller: &ViewController<M, N>,
    input: DashboardInput,
) -> Result<Option<String>, InputError>
where
    M: BondMarketPort + 'static,
    N: Notifier + 'static,
{
    match input {
        DashboardInput::Empty | DashboardInput::Quit => Ok(None),
        DashboardInput::Tab(tab) => {
            controller.select_tab(tab).await;
            Ok(None)
        }
        DashboardInput::Select(target) => {
            let key = resolve_bond(controller, &target).await;
            controller.open_trade(&key).await?;
            Ok(None)
        }
        DashboardInput::Quantity(quantity) => {
            controller.set_quantity(&quantity).await?;
            Ok(None)
        }
        DashboardInput::Submit(direction) => {
            controller.set_direction(direction).await?;
            // Outcome is reported through the notifier
            if let TradeOutcome::Executed(receipt) = controller.submit_trade().await? {
                tracing::debug!("Dashboard trade {} done", receipt.transaction_id);
            }
            Ok(None)
        }
        DashboardInput::Cancel => {
            controller.cancel_trade().await?;
            Ok(None)
        }
        DashboardInput::Refresh => {
            controller.refresh_all().await;
            Ok(None)
        }
        DashboardInput::Help => Ok(Some(HELP.to_string())),
    }
}

/// A 1-based card index maps to that bond's id; anything else is passed through
async fn resolve_bond<M, N>(controller: &ViewController<M, N>, target: &str) -> String
where
    M: BondMarketPort + 'static,
    N: Notifier + 'static,
{
    if let Ok(index) = target.parse::<usize>() {
        let state = controller.snapshot().await;
        if let Some(bond) = index.checked_sub(1).and_then(|i| state.bonds.get(i)) {
            return bond.id.clone();
        }
    }
    target.to_string()
}

/// Frame, optional message line, then the prompt
fn write_frame<W: Write>(out: &mut W, frame: &str, message: Option<&str>) -> io::Result<()> {
    write!(out, "{}", frame)?;
    if let Some(message) = message {
        writeln!(out, "{}", message)?;
    }
    write!(out, "> ")?;
    out.flush()
}

async fn redraw<M, N>(
    controller: &ViewController<M, N>,
    palette: Palette,
    message: Option<&str>,
) -> io::Result<()>
where
    M: BondMarketPort + 'static,
    N: Notifier + 'static,
{
    let state = controller.snapshot().await;
    let frame = render_view(&state, controller.user_address(), palette);
    write_frame(&mut std::io::stdout().lock(), &frame, message)
}

/// Run the dashboard until `quit`, end of input, or Ctrl+C
pub async fn run_dashboard<M, N>(
    controller: ViewController<M, N>,
    interval: Duration,
    palette: Palette,
) -> Result<()>
where
    M: BondMarketPort + 'static,
    N: Notifier + 'static,
{
    controller.refresh_all().await;
    let poller = controller.start_polling(interval);
    tracing::info!("Dashboard started, refreshing every {:?}", poller.interval());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut redraw_timer = tokio::time::interval(interval);
    redraw_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let message = match parse_input(&line) {
                    Ok(DashboardInput::Quit) => break,
                    Ok(input) => match apply_input(&controller, input).await {
                        Ok(text) => text,
                        Err(e) => Some(e.to_string()),
                    },
                    Err(e) => Some(e.to_string()),
                };
                redraw(&controller, palette, message.as_deref()).await?;
            }
            _ = redraw_timer.tick() => {
                if !controller.snapshot().await.ui.is_form_open() {
                    redraw(&controller, palette, None).await?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    poller.shutdown().await;
    tracing::info!("Dashboard stopped");
    Ok(())
}
