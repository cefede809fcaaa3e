//! Data model of the SCR racing client.
//!
//! - [`SensorSnapshot`] - the decoded sensor state of one protocol cycle
//! - [`ControlCommand`] - the outbound actuator command of one cycle
//! - [`schema`] - the fixed feature/record column order shared by the
//!   dataset recorder and the model-assisted policy
//! - [`rangefinder`] - track-edge sensor geometry declared at identification

#![deny(static_mut_refs)]

pub mod command;
pub mod rangefinder;
pub mod schema;
pub mod snapshot;

pub use command::{ControlCommand, MAX_GEAR, MIN_GEAR, NEUTRAL_GEAR};
pub use rangefinder::{RANGEFINDER_ANGLES, identification_message};
pub use schema::{
    CONTROL_COLUMNS, DatasetRecord, FEATURE_COUNT, FOCUS_SENSORS, OPPONENT_FAR_DISTANCE,
    OPPONENT_SENSORS, SCALAR_FEATURES, TRACK_SENSORS, WHEEL_SENSORS, feature_names,
    feature_vector,
};
pub use snapshot::{ConversionFailure, FieldDiagnostic, SensorArray, SensorSnapshot, tags};
