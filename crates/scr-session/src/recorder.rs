use scr_telemetry::DatasetRecord;

use crate::error::RecorderError;

/// Sink for captured cycles.
///
/// The session logs recorder failures and keeps racing; a failed
/// `start_episode` turns recording off until the next episode.
pub trait Recorder {
    fn start_episode(&mut self, episode: u32) -> Result<(), RecorderError>;

    fn write(&mut self, record: &DatasetRecord) -> Result<(), RecorderError>;

    fn finish_episode(&mut self) -> Result<(), RecorderError>;
}
