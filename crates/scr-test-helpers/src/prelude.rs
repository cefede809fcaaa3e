//! Convenience re-exports for common test utilities.

pub use crate::frames::SensorFrameBuilder;
pub use crate::must::{must, must_parse, must_some, must_with};
pub use crate::provider::FixedPredictionProvider;
pub use crate::recorder::MemoryRecorder;
pub use crate::transport::{ScriptStep, ScriptedTransport};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
