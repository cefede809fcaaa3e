//! Policy state carried from one cycle to the next.

use std::collections::HashSet;
use std::time::Instant;

use scr_telemetry::ControlCommand;

use crate::manual::InputSymbol;

/// Everything a policy remembers between cycles of one episode.
///
/// A fresh value is created at every episode start, so nothing here survives
/// a restart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarryState {
    /// Engine speed seen on the last cycle that reported one.
    pub prev_rpm: Option<f64>,
    /// Command sent on the previous cycle. Its gear is also the manually
    /// selected gear in capture mode.
    pub command: ControlCommand,
    /// Manual inputs currently held down.
    pub held: HashSet<InputSymbol>,
    /// Timestamp of the last applied manual gear change.
    pub last_shift: Option<Instant>,
}

impl CarryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, symbol: InputSymbol) -> bool {
        self.held.contains(&symbol)
    }

    pub(crate) fn remember_rpm(&mut self, rpm: Option<f64>) {
        if let Some(rpm) = rpm {
            self.prev_rpm = Some(rpm);
        }
    }
}
