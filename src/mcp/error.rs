//! Error types for the MCP session layer.

use thiserror::Error;

use super::connection::ConnectionState;

/// Errors raised while establishing a connection. Fatal to that connect
/// attempt only; the manager cleans up before surfacing one of these.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The transport stream could not be opened.
    #[error("failed to open transport: {0}")]
    TransportOpen(String),

    /// The capability handshake failed or timed out.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server speaks a protocol version we do not support.
    #[error("incompatible protocol version: server speaks {server}, client speaks {client}")]
    IncompatibleVersion {
        /// Version advertised by the server.
        server: String,
        /// Version this client implements.
        client: String,
    },

    /// The post-handshake liveness probe failed.
    #[error("connection liveness check failed: {0}")]
    LivenessCheck(String),

    /// `connect` was called while the connection is not in a connectable
    /// state. Recovery from `Failed` requires an explicit `disconnect`.
    #[error("cannot connect while {0:?}; disconnect first")]
    InvalidState(ConnectionState),
}

/// Errors from the protocol session and transport.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to send or receive on the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server sent something that violates the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server speaks an unsupported protocol version.
    #[error("incompatible protocol version: server speaks {server}, client speaks {client}")]
    IncompatibleVersion {
        /// Version advertised by the server.
        server: String,
        /// Version this client implements.
        client: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a JSON-RPC error response.
    #[error("server error {code}: {message}")]
    ServerError {
        /// Error code from the server.
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// No response arrived within the configured timeout. The remote side
    /// may still have executed the request; the outcome is unknown.
    #[error("timed out waiting for response")]
    Timeout,

    /// The transport stream is closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Session used before `initialize` completed.
    #[error("session not initialized - call initialize() first")]
    NotInitialized,
}

impl McpError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// True when the underlying connection is unusable and the manager
    /// should move to the failed state.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Transport(_))
    }
}

/// Errors from a single tool invocation. All recoverable: the bridge turns
/// each of these into an error-flagged tool result so a failed call never
/// ends the conversation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name is not in the last-known tool list.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The server rejected the arguments against the tool's schema.
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments {
        /// Tool that rejected the arguments.
        tool: String,
        /// Server-reported validation message.
        message: String,
    },

    /// The tool executed and returned an error payload.
    #[error("tool {tool} failed: {message}")]
    RemoteFailure {
        /// Tool that failed.
        tool: String,
        /// Error payload text.
        message: String,
    },

    /// No result within the timeout. Outcome on the server is unknown.
    #[error("tool {0} timed out; the outcome of the call is unknown")]
    Timeout(String),

    /// The session or transport failed underneath the call.
    #[error(transparent)]
    Session(#[from] McpError),
}
