//! Wire codec for the SCR (Simulated Car Racing) server protocol.
//!
//! Every datagram exchanged with the race server is ASCII text made of
//! parenthesised groups:
//!
//! ```text
//! (angle 0.0083)(gear 1)(track 7.33 7.52 ... 200)(rpm 942.4)
//! ```
//!
//! The first token of a group is its tag, the remaining tokens are its
//! values. Out-of-band control messages (`***identified***`,
//! `***shutdown***`, `***restart***`) are not groups at all and are
//! recognised by [`Sentinel::detect`] before the group codec runs.
//!
//! # Usage
//!
//! ```
//! use scr_codec::{OutboundMessage, decode};
//!
//! let tags = decode("(speedX 12.5)(rpm 4100)")?;
//! assert_eq!(tags.get("rpm").map(Vec::as_slice), Some(&["4100".to_string()][..]));
//!
//! let wire = OutboundMessage::new().with("accel", 1.0).with("gear", 2).encode();
//! assert_eq!(wire, "(accel 1.0)(gear 2)");
//! # Ok::<(), scr_codec::CodecError>(())
//! ```

#![deny(static_mut_refs)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod sentinel;

pub use decode::{TagMap, decode};
pub use encode::{OutboundMessage, Token, encode};
pub use error::{CodecError, CodecResult};
pub use sentinel::Sentinel;
