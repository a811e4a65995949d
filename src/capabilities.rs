//! Capability bundles passed to session establishment.
//!
//! The bundle is opaque to the establisher: whatever is in here goes on the
//! wire unmodified apart from envelope wrapping. Browser-specific preference
//! helpers live outside this crate and feed their result in through
//! [`Capabilities::insert`].

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct Capabilities(Map<String, Value>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn browser_name(mut self, name: impl Into<String>) -> Self {
        self.0.insert("browserName".to_string(), Value::String(name.into()));
        self
    }

    pub fn accept_insecure_certs(mut self, accept: bool) -> Self {
        self.0.insert("acceptInsecureCerts".to_string(), Value::Bool(accept));
        self
    }

    /// Insert an arbitrary capability, e.g. a vendor-prefixed options blob.
    pub fn insert(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}
