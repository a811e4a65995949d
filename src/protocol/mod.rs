//! Wire-protocol generations and envelope handling.
//!
//! Two incompatible revisions of the remote automation protocol are in the
//! wild: the legacy JSON wire protocol (numeric status codes, results wrapped
//! in `{sessionId, status, value}`) and the W3C WebDriver standard (results
//! wrapped in `{value}`, failures as `{value: {error, message, stacktrace}}`).
//! Everything above this module is protocol-agnostic.

mod commands;

pub use commands::{Binding, Command, TimeoutKind};
pub(crate) use commands::{keys_payload, locator_payload, switch_window_payload, timeout_payload};

use serde_json::Value;

use crate::error::{Result, RudderError};

/// Which wire-protocol generation the remote endpoint speaks. Determined
/// once during session establishment and fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// The pre-standard JSON wire protocol.
    Legacy,
    /// The W3C WebDriver standard.
    W3c,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Legacy => write!(f, "legacy"),
            Protocol::W3c => write!(f, "W3C"),
        }
    }
}

/// Element locator strategy.
///
/// The legacy generation accepts all eight slugs on the wire; W3C dropped
/// `id`, `name` and `class name`, so those are rewritten as CSS selectors
/// before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum By {
    Id,
    Name,
    ClassName,
    Css,
    XPath,
    LinkText,
    PartialLinkText,
    TagName,
}

impl By {
    /// The `(using, value)` pair to put on the wire for this strategy.
    pub(crate) fn wire(self, value: &str, protocol: Protocol) -> (&'static str, String) {
        match (self, protocol) {
            (By::Id, Protocol::Legacy) => ("id", value.to_string()),
            (By::Id, Protocol::W3c) => ("css selector", format!("[id=\"{value}\"]")),
            (By::Name, Protocol::Legacy) => ("name", value.to_string()),
            (By::Name, Protocol::W3c) => ("css selector", format!("[name=\"{value}\"]")),
            (By::ClassName, Protocol::Legacy) => ("class name", value.to_string()),
            (By::ClassName, Protocol::W3c) => ("css selector", format!(".{value}")),
            (By::Css, _) => ("css selector", value.to_string()),
            (By::XPath, _) => ("xpath", value.to_string()),
            (By::LinkText, _) => ("link text", value.to_string()),
            (By::PartialLinkText, _) => ("partial link text", value.to_string()),
            (By::TagName, _) => ("tag name", value.to_string()),
        }
    }
}

/// Map a legacy numeric status code to the machine-readable slug the W3C
/// generation would have used, so callers see one error vocabulary.
pub(crate) fn legacy_status_slug(status: i64) -> &'static str {
    match status {
        6 => "invalid session id",
        7 => "no such element",
        8 => "no such frame",
        9 => "unknown command",
        10 => "stale element reference",
        11 => "element not interactable",
        12 => "invalid element state",
        13 => "unknown error",
        15 => "element is not selectable",
        17 => "javascript error",
        19 | 32 => "invalid selector",
        21 => "timeout",
        23 => "no such window",
        24 => "invalid cookie domain",
        25 => "unable to set cookie",
        26 => "unexpected alert open",
        27 => "no such alert",
        28 => "script timeout",
        29 => "invalid element coordinates",
        33 => "session not created",
        34 => "move target out of bounds",
        _ => "unknown error",
    }
}

/// Unwrap a raw wire response into its inner `value`, or map the remote
/// failure shape of the given generation into [`RudderError::Remote`].
pub(crate) fn decode_response(protocol: Protocol, status: u16, body: Value) -> Result<Value> {
    match protocol {
        Protocol::W3c => decode_w3c(status, body),
        Protocol::Legacy => decode_legacy(status, body),
    }
}

fn decode_w3c(status: u16, body: Value) -> Result<Value> {
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if (200..300).contains(&status) {
        return Ok(value);
    }
    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(RudderError::Remote { error, message })
}

fn decode_legacy(status: u16, body: Value) -> Result<Value> {
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    let wire_status = body.get("status").and_then(Value::as_i64).unwrap_or(0);
    if wire_status == 0 && (200..300).contains(&status) {
        return Ok(value);
    }
    // Some legacy endpoints answer HTTP 500 with no status field; treat any
    // non-2xx the same as a nonzero wire status.
    let slug = if wire_status != 0 {
        legacy_status_slug(wire_status)
    } else {
        "unknown error"
    };
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    Err(RudderError::Remote {
        error: slug.to_string(),
        message,
    })
}
