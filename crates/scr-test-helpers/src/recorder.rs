//! In-memory dataset sink.

use std::sync::Arc;

use parking_lot::Mutex;
use scr_session::{Recorder, RecorderError};
use scr_telemetry::DatasetRecord;

#[derive(Debug, Default)]
struct Captured {
    started: Vec<u32>,
    finished: Vec<u32>,
    records: Vec<(u32, DatasetRecord)>,
    current: Option<u32>,
}

/// Recorder that keeps everything in memory. Clones share the captured data.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    captured: Arc<Mutex<Captured>>,
    fail_start: bool,
    fail_writes: bool,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `start_episode` always fails.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// `write` always fails.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn started_episodes(&self) -> Vec<u32> {
        self.captured.lock().started.clone()
    }

    pub fn finished_episodes(&self) -> Vec<u32> {
        self.captured.lock().finished.clone()
    }

    pub fn records(&self) -> Vec<DatasetRecord> {
        self.captured
            .lock()
            .records
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn records_for(&self, episode: u32) -> Vec<DatasetRecord> {
        self.captured
            .lock()
            .records
            .iter()
            .filter(|(ep, _)| *ep == episode)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

impl Recorder for MemoryRecorder {
    fn start_episode(&mut self, episode: u32) -> Result<(), RecorderError> {
        if self.fail_start {
            return Err(RecorderError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "scripted start failure",
            )));
        }
        let mut captured = self.captured.lock();
        captured.started.push(episode);
        captured.current = Some(episode);
        Ok(())
    }

    fn write(&mut self, record: &DatasetRecord) -> Result<(), RecorderError> {
        if self.fail_writes {
            return Err(RecorderError::Encode("scripted write failure".to_string()));
        }
        let mut captured = self.captured.lock();
        let episode = captured.current.ok_or(RecorderError::NoEpisode)?;
        captured.records.push((episode, record.clone()));
        Ok(())
    }

    fn finish_episode(&mut self) -> Result<(), RecorderError> {
        let mut captured = self.captured.lock();
        let episode = captured.current.take().ok_or(RecorderError::NoEpisode)?;
        captured.finished.push(episode);
        Ok(())
    }
}
