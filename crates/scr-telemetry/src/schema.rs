//! Fixed column order shared by the dataset recorder and the model-assisted
//! policy.
//!
//! Both consumers must agree on this order; a model trained on recorded
//! datasets reads its features in exactly the sequence [`feature_names`]
//! returns.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::command::ControlCommand;
use crate::snapshot::SensorSnapshot;

pub const FOCUS_SENSORS: usize = 5;
pub const TRACK_SENSORS: usize = 19;
pub const OPPONENT_SENSORS: usize = 36;
pub const WHEEL_SENSORS: usize = 4;

/// Opponent distance used when the sensor is absent (nothing in range).
pub const OPPONENT_FAR_DISTANCE: f64 = 200.0;

pub const SCALAR_FEATURES: [&str; 15] = [
    "speedX",
    "speedY",
    "speedZ",
    "rpm",
    "fuel",
    "damage",
    "sensor_gear",
    "racePos",
    "distFromStart",
    "distRaced",
    "curLapTime",
    "lastLapTime",
    "trackPos",
    "angle",
    "z",
];

pub const FEATURE_COUNT: usize =
    SCALAR_FEATURES.len() + TRACK_SENSORS + OPPONENT_SENSORS + WHEEL_SENSORS;

pub const CONTROL_COLUMNS: [&str; 4] = ["accel", "brake", "steer", "clutch"];

/// Feature names in model input order.
pub fn feature_names() -> &'static [String] {
    static NAMES: OnceLock<Vec<String>> = OnceLock::new();
    NAMES.get_or_init(|| {
        let mut names: Vec<String> = SCALAR_FEATURES.iter().map(|s| (*s).to_owned()).collect();
        names.extend((0..TRACK_SENSORS).map(|i| format!("track_{i}")));
        names.extend((0..OPPONENT_SENSORS).map(|i| format!("opponents_{i}")));
        names.extend((0..WHEEL_SENSORS).map(|i| format!("wheelSpinVel_{i}")));
        names
    })
}

fn scalar_values(snapshot: &SensorSnapshot) -> [Option<f64>; 15] {
    [
        snapshot.speed_x,
        snapshot.speed_y,
        snapshot.speed_z,
        snapshot.rpm,
        snapshot.fuel,
        snapshot.damage,
        snapshot.gear.map(f64::from),
        snapshot.race_pos.map(f64::from),
        snapshot.dist_from_start,
        snapshot.dist_raced,
        snapshot.cur_lap_time,
        snapshot.last_lap_time,
        snapshot.track_pos,
        snapshot.angle,
        snapshot.z,
    ]
}

/// Model input vector for a snapshot.
///
/// Absent values are filled with 0.0, except opponents which read as
/// [`OPPONENT_FAR_DISTANCE`].
pub fn feature_vector(snapshot: &SensorSnapshot) -> Vec<f64> {
    let mut features = Vec::with_capacity(FEATURE_COUNT);
    features.extend(scalar_values(snapshot).iter().map(|v| v.unwrap_or(0.0)));
    features.extend(snapshot.track.iter().map(|v| v.unwrap_or(0.0)));
    features.extend(
        snapshot
            .opponents
            .iter()
            .map(|v| v.unwrap_or(OPPONENT_FAR_DISTANCE)),
    );
    features.extend(snapshot.wheel_spin_vel.iter().map(|v| v.unwrap_or(0.0)));
    features
}

/// One captured cycle: the sensors the driver saw and the controls applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub scalars: Vec<Option<f64>>,
    pub track: Vec<Option<f64>>,
    pub opponents: Vec<Option<f64>>,
    pub wheel_spin_vel: Vec<Option<f64>>,
    /// accel, brake, steer, clutch
    pub controls: Vec<f64>,
}

impl DatasetRecord {
    pub fn from_cycle(snapshot: &SensorSnapshot, command: &ControlCommand) -> Self {
        let command = command.sanitized();
        Self {
            scalars: scalar_values(snapshot).to_vec(),
            track: snapshot.track.as_slice().to_vec(),
            opponents: snapshot.opponents.as_slice().to_vec(),
            wheel_spin_vel: snapshot.wheel_spin_vel.as_slice().to_vec(),
            controls: vec![command.accel, command.brake, command.steer, command.clutch],
        }
    }

    /// Column names of a record, features first then controls.
    pub fn columns() -> Vec<String> {
        let mut columns = feature_names().to_vec();
        columns.extend(CONTROL_COLUMNS.iter().map(|s| (*s).to_owned()));
        columns
    }

    /// Number of values; equals `columns().len()` for a well-formed record.
    pub fn width(&self) -> usize {
        self.scalars.len()
            + self.track.len()
            + self.opponents.len()
            + self.wheel_spin_vel.len()
            + self.controls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 74);
        assert_eq!(feature_names().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_feature_name_boundaries() {
        let names = feature_names();
        assert_eq!(names.first().map(String::as_str), Some("speedX"));
        assert_eq!(names.get(14).map(String::as_str), Some("z"));
        assert_eq!(names.get(15).map(String::as_str), Some("track_0"));
        assert_eq!(names.get(34).map(String::as_str), Some("opponents_0"));
        assert_eq!(names.last().map(String::as_str), Some("wheelSpinVel_3"));
    }

    #[test]
    fn test_feature_vector_defaults() {
        let features = feature_vector(&SensorSnapshot::unavailable());
        assert_eq!(features.len(), FEATURE_COUNT);
        assert_eq!(features.get(0), Some(&0.0));
        assert_eq!(features.get(15), Some(&0.0));
        assert_eq!(features.get(34), Some(&OPPONENT_FAR_DISTANCE));
        assert_eq!(features.get(69), Some(&OPPONENT_FAR_DISTANCE));
        assert_eq!(features.get(70), Some(&0.0));
    }

    #[test]
    fn test_feature_vector_reads_values() {
        let snapshot = SensorSnapshot::from_message("(speedX 42)(gear 3)(z 0.5)(opponents 7)");
        let features = feature_vector(&snapshot);
        assert_eq!(features.get(0), Some(&42.0));
        assert_eq!(features.get(6), Some(&3.0));
        assert_eq!(features.get(14), Some(&0.5));
        assert_eq!(features.get(34), Some(&7.0));
        assert_eq!(features.get(35), Some(&OPPONENT_FAR_DISTANCE));
    }

    #[test]
    fn test_record_width_matches_columns() {
        let record = DatasetRecord::from_cycle(
            &SensorSnapshot::unavailable(),
            &ControlCommand::default(),
        );
        assert_eq!(record.width(), DatasetRecord::columns().len());
        assert_eq!(record.width(), 78);
        assert_eq!(record.controls, vec![0.0, 0.0, 0.0, 0.0]);
    }
}
