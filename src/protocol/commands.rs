//! The static command table.
//!
//! One entry per logical command, at most one binding per protocol
//! generation. A `None` binding is the defined "unsupported in this
//! generation" outcome, not an error in the table: the two generations
//! genuinely disagree on which commands exist (window rect and action
//! release are W3C-only; element toggle and displayed are legacy-only),
//! and some shipping W3C endpoints omit spec-mandated commands such as
//! the timeout getter.

use reqwest::Method;
use serde_json::{json, Value};

use super::{By, Protocol};

/// Protocol-version-independent name for an automation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NewSession,
    DeleteSession,
    Status,
    NavigateTo,
    CurrentUrl,
    Back,
    Forward,
    Refresh,
    Title,
    PageSource,
    GetWindowHandle,
    GetWindowHandles,
    SwitchToWindow,
    CloseWindow,
    GetWindowRect,
    SetWindowRect,
    SetTimeout,
    GetTimeouts,
    ExecuteScript,
    ExecuteAsyncScript,
    FindElement,
    FindElements,
    FindElementFromElement,
    ElementClick,
    ElementSendKeys,
    ElementClear,
    ElementText,
    ElementTagName,
    ElementAttribute,
    ElementProperty,
    ElementRect,
    ElementLocation,
    ElementSize,
    ElementDisplayed,
    ElementToggle,
    ElementScreenshot,
    TakeScreenshot,
    PerformActions,
    ReleaseActions,
    SendKeysToActiveElement,
}

/// A concrete wire binding: HTTP method plus a path template with
/// `{session}`, `{element}` and `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub method: Method,
    pub path: &'static str,
}

fn bind(method: Method, path: &'static str) -> Binding {
    Binding { method, path }
}

impl Command {
    /// Every logical command, for exhaustiveness checks.
    pub const ALL: [Command; 40] = [
        Command::NewSession,
        Command::DeleteSession,
        Command::Status,
        Command::NavigateTo,
        Command::CurrentUrl,
        Command::Back,
        Command::Forward,
        Command::Refresh,
        Command::Title,
        Command::PageSource,
        Command::GetWindowHandle,
        Command::GetWindowHandles,
        Command::SwitchToWindow,
        Command::CloseWindow,
        Command::GetWindowRect,
        Command::SetWindowRect,
        Command::SetTimeout,
        Command::GetTimeouts,
        Command::ExecuteScript,
        Command::ExecuteAsyncScript,
        Command::FindElement,
        Command::FindElements,
        Command::FindElementFromElement,
        Command::ElementClick,
        Command::ElementSendKeys,
        Command::ElementClear,
        Command::ElementText,
        Command::ElementTagName,
        Command::ElementAttribute,
        Command::ElementProperty,
        Command::ElementRect,
        Command::ElementLocation,
        Command::ElementSize,
        Command::ElementDisplayed,
        Command::ElementToggle,
        Command::ElementScreenshot,
        Command::TakeScreenshot,
        Command::PerformActions,
        Command::ReleaseActions,
        Command::SendKeysToActiveElement,
    ];

    /// Resolve this command to its wire binding under the given protocol
    /// generation. Pure and total: `None` means "no such command in this
    /// generation".
    pub fn binding(self, protocol: Protocol) -> Option<Binding> {
        use Protocol::{Legacy, W3c};
        let b = match (self, protocol) {
            (Command::NewSession, _) => bind(Method::POST, "/session"),
            (Command::DeleteSession, _) => bind(Method::DELETE, "/session/{session}"),
            (Command::Status, _) => bind(Method::GET, "/status"),

            (Command::NavigateTo, _) => bind(Method::POST, "/session/{session}/url"),
            (Command::CurrentUrl, _) => bind(Method::GET, "/session/{session}/url"),
            (Command::Back, _) => bind(Method::POST, "/session/{session}/back"),
            (Command::Forward, _) => bind(Method::POST, "/session/{session}/forward"),
            (Command::Refresh, _) => bind(Method::POST, "/session/{session}/refresh"),
            (Command::Title, _) => bind(Method::GET, "/session/{session}/title"),
            (Command::PageSource, _) => bind(Method::GET, "/session/{session}/source"),

            (Command::GetWindowHandle, Legacy) => {
                bind(Method::GET, "/session/{session}/window_handle")
            }
            (Command::GetWindowHandle, W3c) => bind(Method::GET, "/session/{session}/window"),
            (Command::GetWindowHandles, Legacy) => {
                bind(Method::GET, "/session/{session}/window_handles")
            }
            (Command::GetWindowHandles, W3c) => {
                bind(Method::GET, "/session/{session}/window/handles")
            }
            (Command::SwitchToWindow, _) => bind(Method::POST, "/session/{session}/window"),
            (Command::CloseWindow, _) => bind(Method::DELETE, "/session/{session}/window"),
            (Command::GetWindowRect, W3c) => bind(Method::GET, "/session/{session}/window/rect"),
            (Command::GetWindowRect, Legacy) => return None,
            (Command::SetWindowRect, W3c) => bind(Method::POST, "/session/{session}/window/rect"),
            (Command::SetWindowRect, Legacy) => return None,

            (Command::SetTimeout, _) => bind(Method::POST, "/session/{session}/timeouts"),
            (Command::GetTimeouts, W3c) => bind(Method::GET, "/session/{session}/timeouts"),
            (Command::GetTimeouts, Legacy) => return None,

            (Command::ExecuteScript, Legacy) => bind(Method::POST, "/session/{session}/execute"),
            (Command::ExecuteScript, W3c) => bind(Method::POST, "/session/{session}/execute/sync"),
            (Command::ExecuteAsyncScript, Legacy) => {
                bind(Method::POST, "/session/{session}/execute_async")
            }
            (Command::ExecuteAsyncScript, W3c) => {
                bind(Method::POST, "/session/{session}/execute/async")
            }

            (Command::FindElement, _) => bind(Method::POST, "/session/{session}/element"),
            (Command::FindElements, _) => bind(Method::POST, "/session/{session}/elements"),
            (Command::FindElementFromElement, _) => {
                bind(Method::POST, "/session/{session}/element/{element}/element")
            }

            (Command::ElementClick, _) => {
                bind(Method::POST, "/session/{session}/element/{element}/click")
            }
            (Command::ElementSendKeys, _) => {
                bind(Method::POST, "/session/{session}/element/{element}/value")
            }
            (Command::ElementClear, _) => {
                bind(Method::POST, "/session/{session}/element/{element}/clear")
            }
            (Command::ElementText, _) => {
                bind(Method::GET, "/session/{session}/element/{element}/text")
            }
            (Command::ElementTagName, _) => {
                bind(Method::GET, "/session/{session}/element/{element}/name")
            }
            (Command::ElementAttribute, _) => bind(
                Method::GET,
                "/session/{session}/element/{element}/attribute/{name}",
            ),
            (Command::ElementProperty, W3c) => bind(
                Method::GET,
                "/session/{session}/element/{element}/property/{name}",
            ),
            (Command::ElementProperty, Legacy) => return None,
            (Command::ElementRect, W3c) => {
                bind(Method::GET, "/session/{session}/element/{element}/rect")
            }
            (Command::ElementRect, Legacy) => return None,
            (Command::ElementLocation, Legacy) => {
                bind(Method::GET, "/session/{session}/element/{element}/location")
            }
            (Command::ElementLocation, W3c) => return None,
            (Command::ElementSize, Legacy) => {
                bind(Method::GET, "/session/{session}/element/{element}/size")
            }
            (Command::ElementSize, W3c) => return None,
            (Command::ElementDisplayed, Legacy) => {
                bind(Method::GET, "/session/{session}/element/{element}/displayed")
            }
            (Command::ElementDisplayed, W3c) => return None,
            (Command::ElementToggle, Legacy) => {
                bind(Method::POST, "/session/{session}/element/{element}/toggle")
            }
            (Command::ElementToggle, W3c) => return None,
            (Command::ElementScreenshot, W3c) => bind(
                Method::GET,
                "/session/{session}/element/{element}/screenshot",
            ),
            (Command::ElementScreenshot, Legacy) => return None,

            (Command::TakeScreenshot, _) => bind(Method::GET, "/session/{session}/screenshot"),

            (Command::PerformActions, W3c) => bind(Method::POST, "/session/{session}/actions"),
            (Command::PerformActions, Legacy) => return None,
            (Command::ReleaseActions, W3c) => bind(Method::DELETE, "/session/{session}/actions"),
            (Command::ReleaseActions, Legacy) => return None,
            (Command::SendKeysToActiveElement, Legacy) => {
                bind(Method::POST, "/session/{session}/keys")
            }
            (Command::SendKeysToActiveElement, W3c) => return None,
        };
        Some(b)
    }
}

/// Timeout categories shared by both generations, with different wire
/// spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Implicit,
    PageLoad,
    Script,
}

impl TimeoutKind {
    fn legacy_slug(self) -> &'static str {
        match self {
            TimeoutKind::Implicit => "implicit",
            TimeoutKind::PageLoad => "page load",
            TimeoutKind::Script => "script",
        }
    }

    fn w3c_key(self) -> &'static str {
        match self {
            TimeoutKind::Implicit => "implicit",
            TimeoutKind::PageLoad => "pageLoad",
            TimeoutKind::Script => "script",
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter shape normalization
// ---------------------------------------------------------------------------
// The dispatcher hands over canonical parameters; the functions below emit
// the dictionary shape each generation expects.

/// Keystroke payload: W3C wants both a `text` string and a `value` char
/// array, legacy wants only the char array.
pub(crate) fn keys_payload(protocol: Protocol, text: &str) -> Value {
    let chars: Vec<String> = text.chars().map(|c| c.to_string()).collect();
    match protocol {
        Protocol::Legacy => json!({ "value": chars }),
        Protocol::W3c => json!({ "text": text, "value": chars }),
    }
}

/// Window-switch payload: the target key was renamed between generations.
pub(crate) fn switch_window_payload(protocol: Protocol, handle: &str) -> Value {
    match protocol {
        Protocol::Legacy => json!({ "name": handle }),
        Protocol::W3c => json!({ "handle": handle }),
    }
}

/// Timeout payload: legacy takes a `{type, ms}` pair, W3C keys the map by
/// timeout category directly.
pub(crate) fn timeout_payload(protocol: Protocol, kind: TimeoutKind, ms: u64) -> Value {
    match protocol {
        Protocol::Legacy => json!({ "type": kind.legacy_slug(), "ms": ms }),
        Protocol::W3c => json!({ kind.w3c_key(): ms }),
    }
}

/// Element-lookup payload, with the locator strategy rewritten for the
/// generation where needed.
pub(crate) fn locator_payload(protocol: Protocol, by: By, value: &str) -> Value {
    let (using, value) = by.wire(value, protocol);
    json!({ "using": using, "value": value })
}
