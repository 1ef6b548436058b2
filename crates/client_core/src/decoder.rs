//! Extracts the payload from the generation function's raw result.

use serde_json::Value;
use shared::{error::DecodeError, protocol::GenerationEnvelope};

const BODY_MARKER: &str = "body=";

/// Structured decode: unwrap stray string layers, validate the envelope
/// shape, return its body. An empty body counts as a failure.
pub fn decode(raw: &Value) -> Result<String, DecodeError> {
    let envelope = parse_envelope(raw)?;
    if envelope.body.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    Ok(envelope.body)
}

/// Parses the raw function result into a typed envelope.
///
/// The remote function returns its result as a JSON string, and that string
/// has been observed both singly and doubly encoded; up to two string layers
/// are unwrapped before the envelope shape is enforced. Whether the double
/// encoding is a real protocol artifact or an upstream bug is unresolved, so
/// both forms are accepted.
pub fn parse_envelope(raw: &Value) -> Result<GenerationEnvelope, DecodeError> {
    let mut value = raw.clone();
    for _ in 0..2 {
        match value {
            Value::String(text) => value = serde_json::from_str(&text)?,
            other => {
                value = other;
                break;
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Legacy textual decode, kept for conformance with historical behavior:
/// serialize the raw result to text, unwrap a second serialization layer if
/// one is present, then take everything between the first `body=` marker and
/// the next comma.
///
/// This scrapes a specific serialization shape instead of validating one;
/// [`decode`] is the primary path.
pub fn decode_legacy(raw: &Value) -> Result<String, DecodeError> {
    let mut text = serde_json::to_string(raw)?;
    if let Ok(inner) = serde_json::from_str::<String>(&text) {
        text = inner;
    }

    let start = text.find(BODY_MARKER).ok_or(DecodeError::MarkerNotFound)? + BODY_MARKER.len();
    let payload = text[start..].split(',').next().unwrap_or_default();
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    Ok(payload.to_string())
}

#[cfg(test)]
#[path = "tests/decoder_tests.rs"]
mod tests;
