//! Session establishment and capability negotiation.

use reqwest::Method;
use serde_json::{json, Value};

use crate::capabilities::Capabilities;
use crate::error::{Result, RudderError};
use crate::protocol::Protocol;
use crate::transport::WireTransport;

/// A stateful handle to one remote browser instance.
///
/// Immutable once created: the protocol generation is fixed by the single
/// decode attempt made during establishment and is never re-derived, no
/// matter what envelope shapes the endpoint answers with later.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    protocol: Protocol,
    capabilities: Value,
}

impl Session {
    /// Negotiate a new session against the endpoint behind `transport`.
    ///
    /// One `POST /session` request is issued carrying the capabilities under
    /// both generation envelopes, so either kind of endpoint can read them.
    /// The response is decoded W3C-first with a legacy fallback; whichever
    /// shape yields a session id fixes the protocol for the session's
    /// lifetime. Neither shape matching is a [`RudderError::Negotiation`].
    pub async fn establish(transport: &WireTransport, caps: &Capabilities) -> Result<Session> {
        let caps = caps.to_value();
        let body = json!({
            "capabilities": { "alwaysMatch": caps },
            "desiredCapabilities": caps,
        });

        let response = transport.send(Method::POST, "/session", Some(&body)).await?;

        // W3C shape: {"value": {"sessionId": ..., "capabilities": ...}}
        if let Some(value) = response.body.get("value") {
            if let Some(id) = value.get("sessionId").and_then(Value::as_str) {
                tracing::info!(session_id = id, "session established (W3C)");
                return Ok(Session {
                    session_id: id.to_string(),
                    protocol: Protocol::W3c,
                    capabilities: value
                        .get("capabilities")
                        .cloned()
                        .unwrap_or(Value::Null),
                });
            }
        }

        // Legacy shape: {"sessionId": ..., "status": 0, "value": {caps}}
        if let Some(id) = response.body.get("sessionId").and_then(Value::as_str) {
            tracing::info!(session_id = id, "session established (legacy)");
            return Ok(Session {
                session_id: id.to_string(),
                protocol: Protocol::Legacy,
                capabilities: response.body.get("value").cloned().unwrap_or(Value::Null),
            });
        }

        // Surface whatever the endpoint said about the refusal, if anything.
        let detail = response
            .body
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or("no session id in response under either envelope");
        Err(RudderError::Negotiation(format!(
            "HTTP {}: {}",
            response.status, detail
        )))
    }

    /// Opaque session id issued by the endpoint.
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// The wire-protocol generation negotiated at establishment.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Capabilities as the endpoint reported them back.
    pub fn capabilities(&self) -> &Value {
        &self.capabilities
    }

    #[cfg(test)]
    pub(crate) fn stub(session_id: &str, protocol: Protocol) -> Session {
        Session {
            session_id: session_id.to_string(),
            protocol,
            capabilities: Value::Null,
        }
    }
}
