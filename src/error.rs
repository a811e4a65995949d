//! Error types for rudder

use thiserror::Error;

use crate::protocol::Protocol;

#[derive(Error, Debug)]
pub enum RudderError {
    /// Network-level failure: connection refused, timeout, or a response
    /// body that is not valid JSON. Retryable by caller policy; never
    /// retried internally.
    #[error("transport failure for {method} {path}: {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },

    /// The endpoint never returned a usable session id under either
    /// protocol envelope.
    #[error("session negotiation failed: {0}")]
    Negotiation(String),

    /// The logical command has no binding in the negotiated protocol
    /// generation. Expected in steady state (e.g. window-rect against a
    /// legacy endpoint); distinguishable from real failures so callers
    /// can skip or assert differently.
    #[error("command {command:?} is not supported by the {protocol} protocol")]
    UnsupportedCommand {
        command: crate::protocol::Command,
        protocol: Protocol,
    },

    /// The remote endpoint executed the command and reported a semantic
    /// failure. Carries the machine-readable slug and message verbatim.
    #[error("remote error [{error}]: {message}")]
    Remote { error: String, message: String },

    /// No driver executable could be resolved (explicit path, PATH
    /// search, default name) and no remote endpoint was configured.
    #[error("driver binary not found: {0}")]
    BinaryNotFound(String),

    /// Every candidate port in the probe range was already bound.
    #[error("no free port in range {start}..{end}")]
    PortExhaustion { start: u16, end: u16 },

    /// The spawned driver process never accepted a TCP connection within
    /// the configured startup timeout.
    #[error("driver on port {port} not ready after {timeout_ms}ms")]
    StartupTimeout { port: u16, timeout_ms: u64 },

    /// An element reference on the wire matched none of the three known
    /// identity shapes.
    #[error("unrecognized element reference shape: {0}")]
    InvalidElementReference(String),

    /// JSON (de)serialization failure at a crate boundary.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RudderError>;

impl RudderError {
    /// Whether this error means "the command does not exist in this
    /// protocol generation" — either locally (no binding) or because the
    /// endpoint itself answered with an unknown-command slug.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Self::UnsupportedCommand { .. } => true,
            Self::Remote { error, .. } => {
                error == "unknown command" || error == "unknown method"
            }
            _ => false,
        }
    }
}
