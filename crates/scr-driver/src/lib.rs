//! Control policies for the SCR racing client.
//!
//! A [`ControlPolicy`] turns one [`SensorSnapshot`](scr_telemetry::SensorSnapshot)
//! plus the [`CarryState`] of the previous cycle into a [`Decision`]. The caller
//! owns the carry-state and hands it back every cycle; policies never keep
//! cross-cycle state of their own.
//!
//! Three policies are available:
//!
//! - [`RuleBasedPolicy`] steers on angle and lateral offset, regulates throttle
//!   toward a target speed and shifts on rpm
//! - [`ModelAssistedPolicy`] asks a [`PredictionProvider`] for analog controls
//!   and shifts with the extended gear rules
//! - [`ManualCapturePolicy`] applies operator input delivered over an
//!   [`input_channel`]

#![deny(static_mut_refs)]

pub mod carry;
pub mod error;
pub mod gears;
pub mod manual;
pub mod model;
pub mod policy;
pub mod rule_based;

pub use carry::CarryState;
pub use error::{PredictionError, PredictionResult};
pub use gears::{GearInputs, GearStrategy};
pub use manual::{
    GEAR_SHIFT_DEBOUNCE, InputAction, InputEvent, InputReceiver, InputSender, InputSymbol,
    ManualCapturePolicy, input_channel,
};
pub use model::{
    ModelAssistedPolicy, PREDICTION_OUTPUTS, PredictionProvider, ProviderLoader,
};
pub use policy::{ControlPolicy, Decision, PolicyFactory, PolicyKind, TeardownReason};
pub use rule_based::{RuleBasedConfig, RuleBasedPolicy};
