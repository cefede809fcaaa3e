//! Inbound message decoding.

use indexmap::IndexMap;
use tracing::warn;

use crate::{CodecError, CodecResult};

/// Decoded groups keyed by tag, in order of first appearance.
pub type TagMap = IndexMap<String, Vec<String>>;

/// Decode an inbound message into its tag/value groups.
///
/// Groups are located by scanning for `(` and then for the closing `)`.
/// A group whose interior holds fewer than two tokens is skipped. An opening
/// parenthesis that is not closed before the next `(` or the end of the text
/// makes the whole message invalid; nothing is returned in that case.
///
/// When a tag repeats, the later values replace the earlier ones while the
/// entry keeps its original position.
///
/// # Errors
///
/// Returns [`CodecError::UnterminatedGroup`] for an unmatched `(`.
pub fn decode(text: &str) -> CodecResult<TagMap> {
    let mut tags = TagMap::new();
    let mut cursor = 0usize;

    while let Some(open) = find_from(text, cursor, '(') {
        let body_start = open.saturating_add(1);
        let close = match next_delimiter(text, body_start) {
            Some((index, ')')) => index,
            _ => return Err(CodecError::UnterminatedGroup { offset: open }),
        };

        let body = text.get(body_start..close).unwrap_or_default();
        let mut tokens = body.split_whitespace();
        match tokens.next() {
            Some(tag) => {
                let values: Vec<String> = tokens.map(str::to_owned).collect();
                if values.is_empty() {
                    warn!(group = body, "skipping group without values");
                } else {
                    tags.insert(tag.to_owned(), values);
                }
            }
            None => warn!("skipping empty group"),
        }

        cursor = close.saturating_add(1);
    }

    Ok(tags)
}

fn find_from(text: &str, from: usize, needle: char) -> Option<usize> {
    text.get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|index| index.saturating_add(from))
}

fn next_delimiter(text: &str, from: usize) -> Option<(usize, char)> {
    text.get(from..)?
        .char_indices()
        .find(|(_, c)| matches!(c, '(' | ')'))
        .map(|(index, c)| (index.saturating_add(from), c))
}
