//! Notifier that writes user-facing messages to the terminal

use std::io::Write;

use super::render::Palette;
use crate::ports::Notifier;

/// Prints notices to stdout and alerts to stderr
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    palette: Palette,
}

impl TerminalNotifier {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn notice_line(&self, message: &str) -> String {
        format!("{} {}", self.palette.accent("[ok]"), message)
    }

    pub fn alert_line(&self, message: &str) -> String {
        format!("{} {}", self.palette.risk(crate::domain::RiskBand::High, "[!]"), message)
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new(Palette::ansi())
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        tracing::info!("{}", message);
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", self.notice_line(message));
    }

    fn alert(&self, message: &str) {
        tracing::warn!("{}", message);
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", self.alert_line(message));
    }
}
