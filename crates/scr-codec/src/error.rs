//! Codec error types.

use thiserror::Error;

/// Structural failures that invalidate a whole message.
///
/// Problems confined to a single group (a tag without values) are not
/// errors; the decoder skips them and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unterminated group opened at byte {offset}")]
    UnterminatedGroup { offset: usize },
}

pub type CodecResult<T> = Result<T, CodecError>;
