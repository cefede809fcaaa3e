//! Snapshot decoding against full server frames.

use scr_telemetry::{
    ControlCommand, DatasetRecord, FEATURE_COUNT, SensorSnapshot, feature_vector,
    identification_message,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SERVER_FRAME: &str = "(angle 0.00341)(curLapTime -0.982)(damage 0)\
(distFromStart 2057.56)(distRaced 0)(fuel 94)(gear 0)(lastLapTime 0)\
(opponents 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 \
200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200)\
(racePos 1)(rpm 942.478)(speedX 0.0021)(speedY 0.0017)(speedZ -0.0003)\
(track 4.00001 4.14113 4.61881 5.65686 7.99999 11.6952 15.4545 22.9813 45.6462 200 \
46.0285 23.2095 15.5987 11.7975 8.06994 5.70312 4.65625 4.17504 4.03288)\
(trackPos 0.00033)(wheelSpinVel 0 0 0 0)(z 0.345256)(focus -1 -1 -1 -1 -1)";

#[test]
fn test_full_frame_decodes_every_field() -> TestResult {
    let s = SensorSnapshot::from_message(SERVER_FRAME);
    assert!(s.sensors_available());
    assert!(s.diagnostics().is_empty(), "{:?}", s.diagnostics());
    assert_eq!(s.gear, Some(0));
    assert_eq!(s.race_pos, Some(1));
    assert_eq!(s.rpm, Some(942.478));
    assert_eq!(s.track.present_count(), 19);
    assert_eq!(s.track.get(9), Some(200.0));
    assert_eq!(s.opponents.present_count(), 36);
    assert_eq!(s.wheel_spin_vel.present_count(), 4);
    assert_eq!(s.focus.get(4), Some(-1.0));
    assert_eq!(s.z, Some(0.345256));
    Ok(())
}

#[test]
fn test_bad_rpm_token_leaves_other_fields() -> TestResult {
    let s = SensorSnapshot::from_message("(rpm NaNtoken)(speedX 12)");
    assert!(s.sensors_available());
    assert_eq!(s.rpm, None);
    assert_eq!(s.speed_x, Some(12.0));
    Ok(())
}

#[test]
fn test_snapshot_is_rebuilt_not_merged() {
    let first = SensorSnapshot::from_message("(rpm 5000)(speedX 80)");
    let second = SensorSnapshot::from_message("(speedX 81)");
    assert_eq!(first.rpm, Some(5000.0));
    assert_eq!(second.rpm, None);
}

#[test]
fn test_record_and_features_agree_on_order() {
    let s = SensorSnapshot::from_message(SERVER_FRAME);
    let record = DatasetRecord::from_cycle(&s, &ControlCommand::default());
    let features = feature_vector(&s);
    assert_eq!(features.len(), FEATURE_COUNT);

    let recorded: Vec<f64> = record
        .scalars
        .iter()
        .chain(&record.track)
        .chain(&record.opponents)
        .chain(&record.wheel_spin_vel)
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    assert_eq!(recorded, features);
}

#[test]
fn test_identification_lists_nineteen_angles() {
    let msg = identification_message("bot7");
    let inner = msg
        .strip_prefix("bot7(init ")
        .and_then(|rest| rest.strip_suffix(')'));
    assert_eq!(inner.map(|s| s.split_whitespace().count()), Some(19));
}

#[test]
fn test_record_serializes_absent_as_null() -> TestResult {
    let record = DatasetRecord::from_cycle(
        &SensorSnapshot::from_message("(speedX 3)"),
        &ControlCommand::default(),
    );
    let json = serde_json::to_string(&record)?;
    assert!(json.starts_with("{\"scalars\":[3.0,null"));
    let back: DatasetRecord = serde_json::from_str(&json)?;
    assert_eq!(back, record);
    Ok(())
}
