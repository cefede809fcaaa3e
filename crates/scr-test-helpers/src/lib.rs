//! Shared test utilities for the SCR racing client.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`transport`] - [`ScriptedTransport`], a replayable server conversation
//! - [`recorder`] - [`MemoryRecorder`], an inspectable in-memory dataset sink
//! - [`frames`] - [`SensorFrameBuilder`] for server sensor messages
//! - [`provider`] - [`FixedPredictionProvider`] for model-assisted tests
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use scr_test_helpers::prelude::*;
//! ```

#![allow(clippy::unwrap_used, clippy::panic)]

pub mod frames;
pub mod must;
pub mod prelude;
pub mod provider;
pub mod recorder;
pub mod transport;

pub use frames::SensorFrameBuilder;
pub use must::*;
pub use provider::FixedPredictionProvider;
pub use recorder::MemoryRecorder;
pub use transport::{ScriptStep, ScriptedTransport};
