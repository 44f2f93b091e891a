//! Display-message extraction for failed calls.
//!
//! Backends fill `message` and `detail` inconsistently, so the message shown
//! to the user is taken from the first extractor in [`EXTRACTORS`] that yields
//! a non-blank string. The order is part of the contract:
//!
//! 1. `envelope.message`
//! 2. `envelope.detail.message` when `detail` is an object
//! 3. `envelope.detail` when it is a plain string
//! 4. `envelope.detail[0].msg` when `detail` is a list of validation errors
//! 5. the transport error's own message
//! 6. [`FALLBACK_MESSAGE`]

use serde_json::Value;

use crate::error::ErrorSource;

/// Message used when nothing else is available.
pub const FALLBACK_MESSAGE: &str = "request failed";

/// A single step of the message lookup.
pub type Extractor = fn(&ErrorSource) -> Option<String>;

/// Extractors in priority order.
pub const EXTRACTORS: &[Extractor] = &[
    envelope_message,
    detail_message,
    detail_text,
    detail_validation_msg,
    transport_message,
];

/// Extract the display message for a failure.
pub fn classify(source: &ErrorSource) -> String {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(source))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn detail(source: &ErrorSource) -> Option<&Value> {
    match source {
        ErrorSource::Envelope(envelope) => envelope.detail.as_ref(),
        _ => None,
    }
}

pub fn envelope_message(source: &ErrorSource) -> Option<String> {
    match source {
        ErrorSource::Envelope(envelope) => envelope.message.as_ref().and_then(non_blank),
        _ => None,
    }
}

pub fn detail_message(source: &ErrorSource) -> Option<String> {
    detail(source)?.get("message").and_then(non_blank)
}

pub fn detail_text(source: &ErrorSource) -> Option<String> {
    detail(source).and_then(non_blank)
}

// FastAPI request validation: [{"loc": [...], "msg": "...", "type": "..."}]
pub fn detail_validation_msg(source: &ErrorSource) -> Option<String> {
    detail(source)?
        .as_array()?
        .first()?
        .get("msg")
        .and_then(non_blank)
}

pub fn transport_message(source: &ErrorSource) -> Option<String> {
    match source {
        ErrorSource::Transport(error) => {
            let message = error.message.trim();
            (!message.is_empty()).then(|| message.to_string())
        }
        _ => None,
    }
}
