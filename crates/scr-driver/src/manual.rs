//! Operator-driven control for data capture.
//!
//! An external input source (keyboard hook, stdin reader, test script) owns an
//! [`InputSender`] and pushes press/release events from its own thread. The
//! control thread drains the matching [`InputReceiver`] at the start of every
//! decision without blocking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender, TrySendError};
use scr_telemetry::{MAX_GEAR, MIN_GEAR, NEUTRAL_GEAR, SensorSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::carry::CarryState;
use crate::policy::Decision;

/// Gear up/down presses closer than this to the last applied shift are
/// ignored.
pub const GEAR_SHIFT_DEBOUNCE: Duration = Duration::from_millis(200);

const INPUT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputSymbol {
    Accelerate,
    Brake,
    SteerLeft,
    SteerRight,
    GearUp,
    GearDown,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputAction {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub action: InputAction,
    pub symbol: InputSymbol,
    pub at: Instant,
}

impl InputEvent {
    pub fn press(symbol: InputSymbol) -> Self {
        Self::press_at(symbol, Instant::now())
    }

    pub fn release(symbol: InputSymbol) -> Self {
        Self::release_at(symbol, Instant::now())
    }

    pub fn press_at(symbol: InputSymbol, at: Instant) -> Self {
        Self {
            action: InputAction::Press,
            symbol,
            at,
        }
    }

    pub fn release_at(symbol: InputSymbol, at: Instant) -> Self {
        Self {
            action: InputAction::Release,
            symbol,
            at,
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn input_channel() -> (InputSender, InputReceiver) {
    let (tx, rx) = crossbeam::channel::bounded(INPUT_QUEUE_CAPACITY);
    let active = Arc::new(AtomicBool::new(true));
    (
        InputSender {
            tx,
            active: Arc::clone(&active),
        },
        InputReceiver { rx, active },
    )
}

/// Producer half, held by the input source.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: Sender<InputEvent>,
    active: Arc<AtomicBool>,
}

impl InputSender {
    /// Whether the session still wants input. Sources stop once this is false.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Queue an event. Returns false if it was not delivered.
    pub fn send(&self, event: InputEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(symbol = ?event.symbol, "input queue full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half, held by the manual capture policy.
#[derive(Debug, Clone)]
pub struct InputReceiver {
    rx: Receiver<InputEvent>,
    active: Arc<AtomicBool>,
}

impl InputReceiver {
    /// Take every queued event without blocking.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }

    /// Throw away queued events, keeping the channel open.
    pub fn discard_pending(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Signal the source to stop and drop anything still queued.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        self.discard_pending();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Controls come from held inputs, gears from discrete presses.
#[derive(Debug, Clone)]
pub struct ManualCapturePolicy {
    input: InputReceiver,
}

impl ManualCapturePolicy {
    pub fn new(input: InputReceiver) -> Self {
        Self { input }
    }

    pub fn input(&self) -> &InputReceiver {
        &self.input
    }

    pub fn decide(&mut self, _snapshot: &SensorSnapshot, mut carry: CarryState) -> Decision {
        for event in self.input.drain() {
            apply_event(&mut carry, event);
        }

        let accelerate = carry.is_held(InputSymbol::Accelerate);
        let brake = carry.is_held(InputSymbol::Brake);
        let left = carry.is_held(InputSymbol::SteerLeft);
        let right = carry.is_held(InputSymbol::SteerRight);

        let mut command = carry.command;
        command.accel = if accelerate && !brake { 1.0 } else { 0.0 };
        command.brake = if brake { 1.0 } else { 0.0 };
        command.steer = match (left, right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        command.clutch = 0.0;

        trace!(
            accel = command.accel,
            brake = command.brake,
            steer = command.steer,
            gear = command.gear,
            "manual decision"
        );

        carry.command = command;
        Decision { command, carry }
    }
}

fn apply_event(carry: &mut CarryState, event: InputEvent) {
    match event.action {
        InputAction::Release => {
            carry.held.remove(&event.symbol);
        }
        InputAction::Press => match event.symbol {
            InputSymbol::GearUp => shift(carry, 1, event.at),
            InputSymbol::GearDown => shift(carry, -1, event.at),
            InputSymbol::Reverse => {
                carry.command.gear = MIN_GEAR;
                carry.last_shift = Some(event.at);
                debug!(gear = MIN_GEAR, "manual reverse");
            }
            symbol => {
                carry.held.insert(symbol);
            }
        },
    }
}

fn shift(carry: &mut CarryState, delta: i32, at: Instant) {
    let debounced = carry
        .last_shift
        .is_some_and(|last| at.saturating_duration_since(last) < GEAR_SHIFT_DEBOUNCE);
    if debounced {
        trace!("gear press debounced");
        return;
    }
    let gear = carry
        .command
        .gear
        .saturating_add(delta)
        .clamp(NEUTRAL_GEAR, MAX_GEAR);
    carry.command.gear = gear;
    carry.last_shift = Some(at);
    debug!(gear, "manual gear change");
}
