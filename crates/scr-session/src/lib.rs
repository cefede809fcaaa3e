//! Session control for the SCR racing client.
//!
//! [`Session`] drives one connection through identification, racing and
//! termination. Network access goes through the [`Transport`] seam and
//! captured cycles through the [`Recorder`] seam, so the state machine runs
//! unchanged against a UDP socket or a scripted test double.

#![deny(static_mut_refs)]

pub mod config;
pub mod error;
pub mod phase;
pub mod recorder;
pub mod session;
pub mod transport;

pub use config::{RaceStage, SessionConfig};
pub use error::{RecorderError, SessionError, SessionResult, TransportError};
pub use phase::Phase;
pub use recorder::Recorder;
pub use session::{Session, SessionReport};
pub use transport::{Transport, TransportConfig, UdpTransport};
