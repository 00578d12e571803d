//! Wire format: the text protocol the model is instructed to answer in.
//!
//! Version 1:
//! - single record: `name,score,reason`. Only the first two commas delimit; anything after
//!   the second comma belongs to `reason`.
//! - batch: records joined by `;`. Blank segments are skipped.
//! - newlines are flattened to spaces before any splitting.
//!
//! This module only splits text. Validation of the fields lives in `parser`.

pub const WIRE_FORMAT_VERSION: u32 = 1;
pub const FIELD_DELIMITER: char = ',';
pub const RECORD_DELIMITER: char = ';';

/// The three raw fields of one record, trimmed but not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFields<'a> {
    pub name: &'a str,
    pub score: &'a str,
    pub reason: &'a str,
}

/// Replaces line breaks with spaces and trims the result.
pub fn flatten(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Splits on the first two commas. `None` when fewer than two commas are present.
pub fn split_record(segment: &str) -> Option<RawFields<'_>> {
    let segment = strip_wrapping_quotes(segment.trim());
    let (name, rest) = segment.split_once(FIELD_DELIMITER)?;
    let (score, reason) = rest.split_once(FIELD_DELIMITER)?;
    Some(RawFields {
        name: name.trim(),
        score: score.trim(),
        reason: reason.trim(),
    })
}

/// Splits a flattened batch reply into non-blank record segments, in order.
pub fn split_batch(flattened: &str) -> Vec<&str> {
    flattened
        .split(RECORD_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn strip_wrapping_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
