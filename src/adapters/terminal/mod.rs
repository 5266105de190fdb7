//! Terminal Adapter
//!
//! Text rendering of the view state and a stdout/stderr notifier.

pub mod render;
mod notifier;

pub use notifier::TerminalNotifier;
pub use render::{render_view, Palette};
