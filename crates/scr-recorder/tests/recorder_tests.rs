//! Dataset files written by the JSON-lines recorder.

use std::io::Write;
use std::path::Path;

use scr_driver::{PolicyFactory, RuleBasedConfig};
use scr_recorder::{JsonLinesRecorder, load_records};
use scr_session::{Recorder, RecorderError, Session, SessionConfig};
use scr_telemetry::{ControlCommand, DatasetRecord, SensorSnapshot};
use scr_test_helpers::prelude::*;

fn record(speed: f64) -> DatasetRecord {
    let snapshot = SensorSnapshot::from_message(&SensorFrameBuilder::new().speed(speed).build());
    DatasetRecord::from_cycle(&snapshot, &ControlCommand::default())
}

#[test]
fn test_episode_round_trip() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut recorder = JsonLinesRecorder::new(dir.path().join("out"), Some("oval".to_string()));

    recorder.start_episode(1)?;
    let path = must_some(recorder.current_path().map(Path::to_path_buf), "open file");
    recorder.write(&record(10.0))?;
    recorder.write(&record(11.0))?;
    recorder.finish_episode()?;

    let name = must_some(path.file_name().and_then(|n| n.to_str()), "file name");
    assert!(name.starts_with("race_oval_episode1_"));
    assert!(name.ends_with(".jsonl"));

    let (header, records) = load_records(&path)?;
    assert_eq!(header.episode, 1);
    assert_eq!(header.track.as_deref(), Some("oval"));
    assert_eq!(header.columns.len(), 78);
    assert_eq!(records, vec![record(10.0), record(11.0)]);
    assert_eq!(recorder.written_files(), &[path]);
    Ok(())
}

#[test]
fn test_write_without_episode_fails() {
    let dir = must(tempfile::tempdir());
    let mut recorder = JsonLinesRecorder::new(dir.path(), None);
    assert!(matches!(
        recorder.write(&record(1.0)),
        Err(RecorderError::NoEpisode)
    ));
    assert!(matches!(
        recorder.finish_episode(),
        Err(RecorderError::NoEpisode)
    ));
}

#[test]
fn test_drop_flushes_open_episode() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = {
        let mut recorder = JsonLinesRecorder::new(dir.path(), None);
        recorder.start_episode(4)?;
        recorder.write(&record(5.0))?;
        must_some(recorder.current_path().map(Path::to_path_buf), "open file")
    };
    let (_, records) = load_records(&path)?;
    assert_eq!(records.len(), 1);
    Ok(())
}

#[test]
fn test_header_mismatch_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.jsonl");
    let mut file = std::fs::File::create(&path)?;
    writeln!(
        file,
        r#"{{"columns":["speedX"],"episode":1,"track":null,"started_at":"now"}}"#
    )?;
    drop(file);
    assert!(matches!(
        load_records(&path),
        Err(RecorderError::InvalidFile(_))
    ));
    Ok(())
}

#[test]
fn test_session_writes_one_file_per_episode() -> TestResult {
    let dir = tempfile::tempdir()?;
    let frame = SensorFrameBuilder::standing_start().build();
    let transport = ScriptedTransport::new()
        .frame("***identified***")
        .frame(frame.clone())
        .frame(frame.clone())
        .frame("***restart***")
        .frame("***identified***")
        .frame(frame)
        .frame("***shutdown***");
    let config = SessionConfig {
        max_episodes: 2,
        track: Some("g-track".to_string()),
        ..SessionConfig::default()
    };
    let recorder = JsonLinesRecorder::new(dir.path(), config.track.clone());
    let mut session = Session::new(
        config,
        transport,
        PolicyFactory::rule_based(RuleBasedConfig::default()),
    )
    .with_recorder(Box::new(recorder));
    session.run()?;
    drop(session);

    let mut files: Vec<_> = std::fs::read_dir(dir.path())?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    files.sort();
    assert_eq!(files.len(), 2);

    let mut counts = Vec::new();
    for file in &files {
        let (header, records) = load_records(file)?;
        counts.push((header.episode, records.len()));
    }
    counts.sort_unstable();
    assert_eq!(counts, vec![(1, 2), (2, 1)]);
    Ok(())
}
