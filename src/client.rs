//! The command dispatcher.
//!
//! Accepts a logical command plus parameters, consults the command table for
//! the session's fixed protocol generation, invokes the wire transport, and
//! maps failures into the error taxonomy. Holds no state across calls.

use serde_json::Value;

use crate::error::{Result, RudderError};
use crate::protocol::{self, Command};
use crate::session::Session;
use crate::transport::WireTransport;

#[derive(Debug)]
pub(crate) struct CommandClient {
    transport: WireTransport,
    session: Session,
}

impl CommandClient {
    pub(crate) fn new(transport: WireTransport, session: Session) -> Self {
        Self { transport, session }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Dispatch a session-scoped command.
    pub(crate) async fn dispatch(&self, command: Command, body: Option<Value>) -> Result<Value> {
        self.dispatch_with(command, body, &[]).await
    }

    /// Dispatch with extra path placeholders (`element`, `name`) substituted.
    ///
    /// An unsupported command fails before any network traffic happens, so
    /// callers can tell "this generation has no such command" apart from a
    /// transport or remote failure.
    pub(crate) async fn dispatch_with(
        &self,
        command: Command,
        body: Option<Value>,
        path_args: &[(&str, &str)],
    ) -> Result<Value> {
        let protocol = self.session.protocol();
        let binding = command
            .binding(protocol)
            .ok_or(RudderError::UnsupportedCommand { command, protocol })?;

        let mut path = binding.path.replace("{session}", self.session.id());
        for (key, value) in path_args {
            path = path.replace(&format!("{{{key}}}"), value);
        }

        let response = self.transport.send(binding.method, &path, body.as_ref()).await?;
        protocol::decode_response(protocol, response.status, response.body).map_err(|e| {
            tracing::debug!(?command, error = %e, "remote command failed");
            e
        })
    }
}
