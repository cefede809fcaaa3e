//! Dataset capture to JSON-lines files, one file per episode.
//!
//! Each file starts with a [`RecordingHeader`] line naming the columns,
//! followed by one serialized [`DatasetRecord`] per processed cycle.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use scr_session::{Recorder, RecorderError};
use scr_telemetry::DatasetRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_DATA_DIR: &str = "collected_data";
const UNKNOWN_TRACK: &str = "unknown_track";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub enabled: bool,
    pub data_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// First line of every dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingHeader {
    pub columns: Vec<String>,
    pub episode: u32,
    pub track: Option<String>,
    pub started_at: String,
}

struct OpenEpisode {
    episode: u32,
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
}

/// Writes each episode to its own `.jsonl` file under a data directory.
pub struct JsonLinesRecorder {
    data_dir: PathBuf,
    track: Option<String>,
    current: Option<OpenEpisode>,
    written: Vec<PathBuf>,
}

impl JsonLinesRecorder {
    /// The directory is created when the first episode starts.
    pub fn new(data_dir: impl Into<PathBuf>, track: Option<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            track,
            current: None,
            written: Vec::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file being written, if an episode is open.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|open| open.path.as_path())
    }

    /// Files completed so far.
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    fn file_name(&self, episode: u32, stamp: &str) -> String {
        let track = self
            .track
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(sanitize_track)
            .unwrap_or_else(|| UNKNOWN_TRACK.to_string());
        format!("race_{track}_episode{episode}_{stamp}.jsonl")
    }

    fn close(&mut self) -> Result<(), RecorderError> {
        let Some(mut open) = self.current.take() else {
            return Err(RecorderError::NoEpisode);
        };
        open.writer.flush()?;
        info!(
            episode = open.episode,
            records = open.records,
            path = %open.path.display(),
            "closed dataset file"
        );
        self.written.push(open.path);
        Ok(())
    }
}

impl Recorder for JsonLinesRecorder {
    fn start_episode(&mut self, episode: u32) -> Result<(), RecorderError> {
        if self.current.is_some() {
            warn!("previous episode still open, closing it");
            self.close()?;
        }

        std::fs::create_dir_all(&self.data_dir)?;
        let now = Local::now();
        let path = self
            .data_dir
            .join(self.file_name(episode, &now.format("%Y%m%d_%H%M%S").to_string()));
        let mut writer = BufWriter::new(File::create(&path)?);

        let header = RecordingHeader {
            columns: DatasetRecord::columns(),
            episode,
            track: self.track.clone(),
            started_at: now.to_rfc3339(),
        };
        serde_json::to_writer(&mut writer, &header)
            .map_err(|e| RecorderError::Encode(e.to_string()))?;
        writer.write_all(b"\n")?;

        info!(episode, path = %path.display(), "opened dataset file");
        self.current = Some(OpenEpisode {
            episode,
            path,
            writer,
            records: 0,
        });
        Ok(())
    }

    fn write(&mut self, record: &DatasetRecord) -> Result<(), RecorderError> {
        let open = self.current.as_mut().ok_or(RecorderError::NoEpisode)?;
        serde_json::to_writer(&mut open.writer, record)
            .map_err(|e| RecorderError::Encode(e.to_string()))?;
        open.writer.write_all(b"\n")?;
        open.records += 1;
        Ok(())
    }

    fn finish_episode(&mut self) -> Result<(), RecorderError> {
        self.close()
    }
}

impl Drop for JsonLinesRecorder {
    fn drop(&mut self) {
        if self.current.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, "failed to flush dataset file on drop");
            }
        }
    }
}

fn sanitize_track(track: &str) -> String {
    track
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read a dataset file back.
///
/// # Errors
///
/// Fails on I/O errors, malformed lines, or a header whose columns differ
/// from [`DatasetRecord::columns`].
pub fn load_records<P: AsRef<Path>>(
    path: P,
) -> Result<(RecordingHeader, Vec<DatasetRecord>), RecorderError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let first = lines
        .next()
        .ok_or_else(|| RecorderError::InvalidFile("empty file".to_string()))??;
    let header: RecordingHeader = serde_json::from_str(&first)
        .map_err(|e| RecorderError::InvalidFile(format!("bad header: {e}")))?;
    if header.columns != DatasetRecord::columns() {
        return Err(RecorderError::InvalidFile(format!(
            "expected {} columns, header lists {}",
            DatasetRecord::columns().len(),
            header.columns.len()
        )));
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DatasetRecord = serde_json::from_str(&line).map_err(|e| {
            RecorderError::InvalidFile(format!("line {}: {e}", index.saturating_add(2)))
        })?;
        records.push(record);
    }
    Ok((header, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_with_track() {
        let recorder = JsonLinesRecorder::new("data", Some("e-track 3".to_string()));
        assert_eq!(
            recorder.file_name(2, "20240101_120000"),
            "race_e-track_3_episode2_20240101_120000.jsonl"
        );
    }

    #[test]
    fn test_file_name_without_track() {
        let recorder = JsonLinesRecorder::new("data", None);
        assert_eq!(
            recorder.file_name(1, "20240101_120000"),
            "race_unknown_track_episode1_20240101_120000.jsonl"
        );
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize_track("../evil/track"), "___evil_track");
    }

    #[test]
    fn test_default_config() {
        let config = RecorderConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.data_dir, PathBuf::from("collected_data"));
    }
}
