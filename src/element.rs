//! Element handles.
//!
//! An element handle is a short-lived capability token scoped to the driver
//! that produced it: the driver stays the authority, the handle only carries
//! the canonical remote id (plus the selector it was found by, which the
//! script click strategy needs). Handles borrow the driver rather than own
//! it and are re-created per lookup.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::driver::{decode_base64_value, Driver, Rect};
use crate::error::{Result, RudderError};
use crate::protocol::{keys_payload, By, Command};

/// The magic key the W3C generation wraps element ids in.
pub(crate) const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How a click is executed on the remote end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickStrategy {
    /// The element-click wire command.
    #[default]
    Wire,
    /// Synthetic keyboard activation: send Enter to the element.
    Keyboard,
    /// Script-injected DOM click keyed by the element's original selector.
    /// Falls back to [`ClickStrategy::Wire`] when the handle has no CSS
    /// selector recorded.
    Script,
}

/// Normalize an element reference from any of the three accepted wire
/// shapes into the canonical id:
///
/// - a bare string id
/// - the legacy wrapped form `{"ELEMENT": id}`
/// - the W3C magic-key form `{"element-6066-11e4-a52e-4f735466cecf": id}`
///
/// Anything else fails construction.
pub(crate) fn canonical_element_id(value: &Value) -> Result<String> {
    if let Some(id) = value.as_str() {
        return Ok(id.to_string());
    }
    if let Some(obj) = value.as_object() {
        if let Some(id) = obj.get("ELEMENT").and_then(Value::as_str) {
            return Ok(id.to_string());
        }
        if let Some(id) = obj.get(W3C_ELEMENT_KEY).and_then(Value::as_str) {
            return Ok(id.to_string());
        }
    }
    Err(RudderError::InvalidElementReference(value.to_string()))
}

/// Geometry as the legacy generation reports it, split over two commands.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug)]
pub struct Element<'d> {
    driver: &'d Driver,
    id: String,
    selector: Option<String>,
    by: Option<By>,
}

impl<'d> Element<'d> {
    pub(crate) fn new(
        driver: &'d Driver,
        id: String,
        selector: Option<String>,
        by: Option<By>,
    ) -> Self {
        Self {
            driver,
            id,
            selector,
            by,
        }
    }

    /// Canonical remote id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The selector this handle was found by, if one was recorded.
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    async fn dispatch(&self, command: Command, body: Option<Value>) -> Result<Value> {
        self.driver
            .client()
            .dispatch_with(command, body, &[("element", &self.id)])
            .await
    }

    // --- Interaction ---

    /// Click via the direct wire command.
    pub async fn click(&self) -> Result<()> {
        self.click_with(ClickStrategy::Wire).await
    }

    /// Click with an explicit execution strategy.
    pub async fn click_with(&self, strategy: ClickStrategy) -> Result<()> {
        match strategy {
            ClickStrategy::Wire => self.wire_click().await,
            ClickStrategy::Keyboard => {
                // Enter keypress on the element itself works under both
                // generations, unlike the active-element keys endpoint.
                self.send_keys("\u{e007}").await
            }
            ClickStrategy::Script => {
                if let (Some(selector), Some(By::Css)) = (&self.selector, self.by) {
                    self.driver
                        .execute(
                            "document.querySelector(arguments[0]).click();",
                            vec![Value::String(selector.clone())],
                        )
                        .await?;
                    return Ok(());
                }
                // Fail closed: without a usable selector there is nothing
                // to key the script on, so use the wire command instead.
                self.wire_click().await
            }
        }
    }

    async fn wire_click(&self) -> Result<()> {
        self.dispatch(Command::ElementClick, Some(json!({}))).await?;
        Ok(())
    }

    pub async fn send_keys(&self, text: &str) -> Result<()> {
        let payload = keys_payload(self.driver.session().protocol(), text);
        self.dispatch(Command::ElementSendKeys, Some(payload)).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.dispatch(Command::ElementClear, Some(json!({}))).await?;
        Ok(())
    }

    /// Legacy-only state toggle for checkboxes and options.
    pub async fn toggle(&self) -> Result<()> {
        self.dispatch(Command::ElementToggle, Some(json!({}))).await?;
        Ok(())
    }

    // --- Reads ---

    pub async fn text(&self) -> Result<String> {
        let value = self.dispatch(Command::ElementText, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    pub async fn tag_name(&self) -> Result<String> {
        let value = self.dispatch(Command::ElementTagName, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    /// DOM attribute; `None` when the attribute is absent.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .driver
            .client()
            .dispatch_with(
                Command::ElementAttribute,
                None,
                &[("element", &self.id), ("name", name)],
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    /// DOM property; W3C generation only.
    pub async fn property(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .driver
            .client()
            .dispatch_with(
                Command::ElementProperty,
                None,
                &[("element", &self.id), ("name", name)],
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    /// Combined geometry; W3C generation only.
    pub async fn rect(&self) -> Result<Rect> {
        let value = self.dispatch(Command::ElementRect, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    /// Top-left corner; legacy generation only.
    pub async fn location(&self) -> Result<Point> {
        let value = self.dispatch(Command::ElementLocation, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    /// Rendered size; legacy generation only.
    pub async fn size(&self) -> Result<Size> {
        let value = self.dispatch(Command::ElementSize, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    /// Visibility; legacy generation only (W3C dropped the command in
    /// favor of script-based checks).
    pub async fn displayed(&self) -> Result<bool> {
        let value = self.dispatch(Command::ElementDisplayed, None).await?;
        serde_json::from_value(value).map_err(RudderError::from)
    }

    /// Element-scoped screenshot; W3C generation only.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.dispatch(Command::ElementScreenshot, None).await?;
        decode_base64_value(&value)
    }

    /// Find a descendant element.
    pub async fn find_element(&self, by: By, selector: &str) -> Result<Element<'d>> {
        let payload =
            crate::protocol::locator_payload(self.driver.session().protocol(), by, selector);
        let value = self
            .dispatch(Command::FindElementFromElement, Some(payload))
            .await?;
        let id = canonical_element_id(&value)?;
        Ok(Element::new(
            self.driver,
            id,
            Some(selector.to_string()),
            Some(by),
        ))
    }
}
