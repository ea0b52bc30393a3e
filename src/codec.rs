//! Shared text codec helpers for stored records and topic payloads.
//!
//! Everything written by this crate is JSON. The legacy delimiter grammar (`::` between
//! record fields, `;;` between list items) is still understood when decoding so rooms
//! written by older deployments keep working until their TTL runs out.

use thiserror::Error;

/// Separator between the fields of a legacy record or topic payload.
pub const RECORD_SEP: &str = "::";
/// Separator between the items of a legacy joined list.
pub const ITEM_SEP: &str = ";;";

/// Failure to turn a stored value or topic payload back into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Structured payload was not valid JSON for the expected shape.
    #[error("invalid structured payload")]
    Json(#[from] serde_json::Error),
    /// Legacy payload carried a type tag nobody knows about.
    #[error("unknown message type `{0}`")]
    UnknownType(String),
    /// Legacy payload was split into the wrong number of fields.
    #[error("expected {expected} fields for `{kind}`, found {actual}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Payload did not contain the record separator at all.
    #[error("missing `::` record separator")]
    MissingSeparator,
}

/// Returns whether a raw value uses the structured JSON encoding.
pub fn is_structured(raw: &str) -> bool {
    raw.trim_start().starts_with('{')
}

/// Split a legacy value on [`RECORD_SEP`], requiring exactly `expected` fields.
pub fn split_fields<'a>(
    raw: &'a str,
    kind: &'static str,
    expected: usize,
) -> Result<Vec<&'a str>, DecodeError> {
    if expected > 1 && !raw.contains(RECORD_SEP) {
        return Err(DecodeError::MissingSeparator);
    }
    let fields = raw.split(RECORD_SEP).collect::<Vec<_>>();
    if fields.len() != expected {
        return Err(DecodeError::FieldCount {
            kind,
            expected,
            actual: fields.len(),
        });
    }
    Ok(fields)
}

/// Split a legacy [`ITEM_SEP`]-joined list. The empty string is the empty list.
pub fn split_items(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(ITEM_SEP).map(str::to_owned).collect()
}
