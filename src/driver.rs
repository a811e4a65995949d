//! The caller-facing driver handle.
//!
//! Owns the session and the dispatcher; every high-level action funnels
//! through [`CommandClient::dispatch`]. A locally supervised driver binary
//! is injected as configuration rather than inherited from a browser-flavor
//! subclass, so the same handle works against a pre-existing remote server
//! and a process the supervisor just launched.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::capabilities::Capabilities;
use crate::client::CommandClient;
use crate::element::{canonical_element_id, Element};
use crate::error::{Result, RudderError};
use crate::protocol::{keys_payload, locator_payload, switch_window_payload, timeout_payload};
use crate::protocol::{By, Command, TimeoutKind};
use crate::session::Session;
use crate::supervisor::{DriverSupervisor, RunningDriver, SupervisorConfig};
use crate::transport::WireTransport;

/// Window geometry, W3C generation only.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug)]
pub struct Driver {
    client: CommandClient,
    supervised: Option<RunningDriver>,
}

impl Driver {
    /// Connect to a pre-existing remote endpoint and establish a session.
    pub async fn connect(server_url: &str, caps: Capabilities) -> Result<Driver> {
        let transport = WireTransport::new(server_url);
        let session = Session::establish(&transport, &caps).await?;
        Ok(Driver {
            client: CommandClient::new(transport, session),
            supervised: None,
        })
    }

    /// Launch a driver binary under supervision, then establish a session
    /// against it. If establishment fails, the freshly spawned process is
    /// stopped before the error propagates — no orphan on any path.
    pub async fn start(config: SupervisorConfig, caps: Capabilities) -> Result<Driver> {
        let mut running = DriverSupervisor::new(config).launch().await?;
        let transport = WireTransport::new(running.url());
        let session = match Session::establish(&transport, &caps).await {
            Ok(session) => session,
            Err(e) => {
                running.stop().await;
                return Err(e);
            }
        };
        Ok(Driver {
            client: CommandClient::new(transport, session),
            supervised: Some(running),
        })
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub(crate) fn client(&self) -> &CommandClient {
        &self.client
    }

    // --- Navigation ---

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.client
            .dispatch(Command::NavigateTo, Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        self.dispatch_string(Command::CurrentUrl).await
    }

    pub async fn title(&self) -> Result<String> {
        self.dispatch_string(Command::Title).await
    }

    pub async fn back(&self) -> Result<()> {
        self.client.dispatch(Command::Back, Some(json!({}))).await?;
        Ok(())
    }

    pub async fn forward(&self) -> Result<()> {
        self.client.dispatch(Command::Forward, Some(json!({}))).await?;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<()> {
        self.client.dispatch(Command::Refresh, Some(json!({}))).await?;
        Ok(())
    }

    pub async fn source(&self) -> Result<String> {
        self.dispatch_string(Command::PageSource).await
    }

    // --- Windows ---

    pub async fn window_handle(&self) -> Result<String> {
        self.dispatch_string(Command::GetWindowHandle).await
    }

    pub async fn window_handles(&self) -> Result<Vec<String>> {
        let value = self.client.dispatch(Command::GetWindowHandles, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    pub async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let payload = switch_window_payload(self.session().protocol(), handle);
        self.client
            .dispatch(Command::SwitchToWindow, Some(payload))
            .await?;
        Ok(())
    }

    pub async fn close_window(&self) -> Result<()> {
        self.client.dispatch(Command::CloseWindow, None).await?;
        Ok(())
    }

    /// Window geometry; `UnsupportedCommand` under a legacy session.
    pub async fn window_rect(&self) -> Result<Rect> {
        let value = self.client.dispatch(Command::GetWindowRect, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    pub async fn set_window_rect(&self, rect: Rect) -> Result<()> {
        let body = json!({
            "x": rect.x, "y": rect.y,
            "width": rect.width, "height": rect.height,
        });
        self.client.dispatch(Command::SetWindowRect, Some(body)).await?;
        Ok(())
    }

    // --- Timeouts ---

    pub async fn set_timeout(&self, kind: TimeoutKind, ms: u64) -> Result<()> {
        let payload = timeout_payload(self.session().protocol(), kind, ms);
        self.client.dispatch(Command::SetTimeout, Some(payload)).await?;
        Ok(())
    }

    /// Read back the session timeouts.
    ///
    /// Real-world W3C endpoints are known to omit this command despite the
    /// published protocol carrying it; an endpoint answering with an
    /// unknown-command slug is folded into `UnsupportedCommand` so both
    /// kinds of absence look the same to callers.
    pub async fn timeouts(&self) -> Result<Value> {
        match self.client.dispatch(Command::GetTimeouts, None).await {
            Err(e) if e.is_unsupported() => Err(RudderError::UnsupportedCommand {
                command: Command::GetTimeouts,
                protocol: self.session().protocol(),
            }),
            other => other,
        }
    }

    // --- Script execution ---

    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .dispatch(
                Command::ExecuteScript,
                Some(json!({ "script": script, "args": args })),
            )
            .await
    }

    pub async fn execute_async(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .dispatch(
                Command::ExecuteAsyncScript,
                Some(json!({ "script": script, "args": args })),
            )
            .await
    }

    // --- Element factories ---

    /// Find one element. A zero-match lookup is a `Remote` error carrying
    /// the endpoint's "no such element" slug.
    pub async fn find_element(&self, by: By, selector: &str) -> Result<Element<'_>> {
        let payload = locator_payload(self.session().protocol(), by, selector);
        let value = self.client.dispatch(Command::FindElement, Some(payload)).await?;
        let id = canonical_element_id(&value)?;
        Ok(Element::new(self, id, Some(selector.to_string()), Some(by)))
    }

    /// Find all matching elements, in document order. Zero matches yields an
    /// empty vector, never an error.
    pub async fn find_elements(&self, by: By, selector: &str) -> Result<Vec<Element<'_>>> {
        let payload = locator_payload(self.session().protocol(), by, selector);
        let value = self
            .client
            .dispatch(Command::FindElements, Some(payload))
            .await?;
        let raw: Vec<Value> = serde_json::from_value(value)?;
        raw.iter()
            .map(|entry| {
                let id = canonical_element_id(entry)?;
                Ok(Element::new(self, id, Some(selector.to_string()), Some(by)))
            })
            .collect()
    }

    // --- Input & capture ---

    /// Legacy-only keystrokes against the focused element.
    pub async fn send_keys_to_active_element(&self, text: &str) -> Result<()> {
        let payload = keys_payload(self.session().protocol(), text);
        self.client
            .dispatch(Command::SendKeysToActiveElement, Some(payload))
            .await?;
        Ok(())
    }

    /// W3C-only: release any held action-chain inputs.
    pub async fn release_actions(&self) -> Result<()> {
        self.client.dispatch(Command::ReleaseActions, None).await?;
        Ok(())
    }

    /// W3C-only: perform an action-chain payload built by a caller-side
    /// sequencing helper; passed through opaquely.
    pub async fn perform_actions(&self, actions: Value) -> Result<()> {
        self.client
            .dispatch(Command::PerformActions, Some(json!({ "actions": actions })))
            .await?;
        Ok(())
    }

    /// Viewport screenshot, decoded from the base64 the wire carries.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.client.dispatch(Command::TakeScreenshot, None).await?;
        decode_base64_value(&value)
    }

    /// End the session, then tear down the supervised binary if this driver
    /// launched one. The teardown runs even when the quit command itself
    /// fails, so a dead endpoint cannot leak the child process.
    pub async fn quit(mut self) -> Result<()> {
        let quit_result = self.client.dispatch(Command::DeleteSession, None).await;
        if let Some(mut running) = self.supervised.take() {
            running.stop().await;
        }
        quit_result.map(|_| ())
    }

    async fn dispatch_string(&self, command: Command) -> Result<String> {
        let value = self.client.dispatch(command, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }
}

pub(crate) fn decode_base64_value(value: &Value) -> Result<Vec<u8>> {
    use base64::{engine::general_purpose, Engine as _};
    let encoded = value.as_str().ok_or_else(|| RudderError::Remote {
        error: "unknown error".to_string(),
        message: format!("expected base64 string, got {value}"),
    })?;
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| RudderError::Remote {
            error: "unknown error".to_string(),
            message: format!("invalid base64 screenshot payload: {e}"),
        })
}
