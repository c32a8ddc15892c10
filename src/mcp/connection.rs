//! Connection lifecycle management.
//!
//! [`ConnectionManager`] owns the transport stream and protocol session as
//! one resource: acquire the stream, build the session on top of it, and
//! release in strict reverse order. Whatever step of `connect` fails, the
//! stream opened in that attempt is closed exactly once.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::McpClient;
use super::error::{ConnectionError, McpError};
use super::protocol::ToolDefinition;
use super::transport::{McpTransport, SseTransport, SseTransportConfig};

/// Connection lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport open.
    Disconnected,
    /// `connect` in progress.
    Connecting,
    /// Handshake complete; tool calls allowed.
    Ready,
    /// `disconnect` in progress.
    Closing,
    /// The transport failed while Ready. Only an explicit `disconnect`
    /// followed by a fresh `connect` recovers; there is no auto-reconnect.
    Failed,
}

/// Owns the lifetime of one transport + one protocol session.
///
/// At most one connection is open per manager instance.
pub struct ConnectionManager<T: McpTransport> {
    state: ConnectionState,
    transport: Option<Arc<T>>,
    client: Option<Arc<McpClient<T>>>,
}

impl<T: McpTransport> Default for ConnectionManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: McpTransport> ConnectionManager<T> {
    /// Create a disconnected manager.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            transport: None,
            client: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// True when tool calls are allowed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ConnectionState::Ready)
    }

    /// The protocol session, while Ready.
    #[must_use]
    pub fn client(&self) -> Option<Arc<McpClient<T>>> {
        if self.is_ready() {
            self.client.clone()
        } else {
            None
        }
    }

    /// Open a transport with `open`, build a session over it, run the
    /// handshake, and probe liveness with one `tools/list`. The listed
    /// tools are returned so callers can seed discovery without a second
    /// round-trip.
    ///
    /// If any step after stream-open fails, the stream is closed before the
    /// error is returned; the manager is back in `Disconnected` and may be
    /// retried.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::InvalidState`] unless currently `Disconnected`;
    /// otherwise the failing step's error.
    pub async fn connect_with<F, Fut>(&mut self, open: F) -> Result<Vec<ToolDefinition>, ConnectionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>, McpError>>,
    {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectionError::InvalidState(self.state));
        }
        self.state = ConnectionState::Connecting;

        let transport = match open().await {
            Ok(transport) => transport,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(ConnectionError::TransportOpen(e.to_string()));
            }
        };

        match Self::establish(&transport).await {
            Ok((client, tools)) => {
                self.transport = Some(transport);
                self.client = Some(Arc::new(client));
                self.state = ConnectionState::Ready;
                info!(tools = tools.len(), "connection ready");
                Ok(tools)
            }
            Err(e) => {
                // The stream was opened in this attempt; close it before
                // surfacing the failure so nothing leaks half-open.
                if let Err(close_err) = transport.close().await {
                    warn!(error = %close_err, "cleanup close failed");
                }
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Handshake + liveness probe over an already-open transport.
    async fn establish(
        transport: &Arc<T>,
    ) -> Result<(McpClient<T>, Vec<ToolDefinition>), ConnectionError> {
        let client = McpClient::new(Arc::clone(transport));

        client.initialize().await.map_err(|e| match e {
            McpError::IncompatibleVersion { server, client } => {
                ConnectionError::IncompatibleVersion { server, client }
            }
            other => ConnectionError::Handshake(other.to_string()),
        })?;

        let tools = client
            .list_tools()
            .await
            .map_err(|e| ConnectionError::LivenessCheck(e.to_string()))?;

        Ok((client, tools))
    }

    /// Tear the connection down: session first, then transport.
    ///
    /// Idempotent; disconnecting an already-closed connection is a no-op,
    /// and the transport sees exactly one `close` across repeated calls.
    pub async fn disconnect(&mut self) {
        if self.transport.is_none() && self.client.is_none() {
            self.state = ConnectionState::Disconnected;
            return;
        }
        self.state = ConnectionState::Closing;

        // Reverse order of acquisition: session, then stream.
        self.client = None;
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!(error = %e, "transport close failed");
            }
        }

        self.state = ConnectionState::Disconnected;
        debug!("disconnected");
    }

    /// Record that the transport failed while Ready. Tool calls are
    /// refused until the caller disconnects and reconnects.
    pub fn mark_failed(&mut self) {
        if self.state == ConnectionState::Ready {
            warn!("connection marked failed");
            self.state = ConnectionState::Failed;
        }
    }
}

impl ConnectionManager<SseTransport> {
    /// Connect to an SSE endpoint.
    ///
    /// # Errors
    ///
    /// See [`ConnectionManager::connect_with`].
    pub async fn connect(
        &mut self,
        url: &str,
        config: SseTransportConfig,
    ) -> Result<Vec<ToolDefinition>, ConnectionError> {
        let url = url.to_string();
        self.connect_with(move || async move { SseTransport::connect(&url, config).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::MCP_PROTOCOL_VERSION;
    use crate::mcp::test_support::{script, MockTransport, ScriptedReply};
    use serde_json::json;

    fn init_ok() -> ScriptedReply {
        ScriptedReply::result(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": "kite-mcp"}
        }))
    }

    fn tools_ok() -> ScriptedReply {
        ScriptedReply::result(json!({
            "tools": [
                {"name": "get_login_url", "inputSchema": {}},
                {"name": "get_access_token", "inputSchema": {}},
                {"name": "get_user_profile", "inputSchema": {}}
            ]
        }))
    }

    async fn connect(
        manager: &mut ConnectionManager<MockTransport>,
        transport: &Arc<MockTransport>,
    ) -> Result<Vec<crate::mcp::protocol::ToolDefinition>, ConnectionError> {
        let transport = Arc::clone(transport);
        manager.connect_with(move || async move { Ok(transport) }).await
    }

    #[tokio::test]
    async fn test_connect_success_reaches_ready() {
        let transport = script(vec![init_ok(), tools_ok()]);
        let mut manager = ConnectionManager::new();

        let tools = connect(&mut manager, &transport).await.expect("connect");
        assert_eq!(manager.state(), ConnectionState::Ready);
        assert!(manager.client().is_some());
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["get_login_url", "get_access_token", "get_user_profile"]
        );
        assert_eq!(transport.close_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_open_failure_leaves_disconnected() {
        let mut manager: ConnectionManager<MockTransport> = ConnectionManager::new();
        let err = manager
            .connect_with(|| async { Err(McpError::transport("connection refused")) })
            .await
            .expect_err("open fails");
        assert!(matches!(err, ConnectionError::TransportOpen(_)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_handshake_failure_closes_stream_exactly_once() {
        let transport = script(vec![ScriptedReply::transport_error("reset during init")]);
        let mut manager = ConnectionManager::new();

        let err = connect(&mut manager, &transport).await.expect_err("handshake fails");
        assert!(matches!(err, ConnectionError::Handshake(_)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(transport.close_count(), 1);
        assert!(manager.client().is_none());
    }

    #[tokio::test]
    async fn test_version_mismatch_maps_to_incompatible_version() {
        let transport = script(vec![ScriptedReply::result(json!({
            "protocolVersion": "1999-01-01",
            "capabilities": {},
            "serverInfo": {"name": "old-server"}
        }))]);
        let mut manager = ConnectionManager::new();

        let err = connect(&mut manager, &transport).await.expect_err("old server");
        assert!(matches!(err, ConnectionError::IncompatibleVersion { .. }));
        assert_eq!(transport.close_count(), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_liveness_failure_closes_stream_exactly_once() {
        let transport = script(vec![
            init_ok(),
            ScriptedReply::transport_error("reset during tools/list"),
        ]);
        let mut manager = ConnectionManager::new();

        let err = connect(&mut manager, &transport).await.expect_err("probe fails");
        assert!(matches!(err, ConnectionError::LivenessCheck(_)));
        assert_eq!(transport.close_count(), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reconnect_after_failed_attempt() {
        let failing = script(vec![ScriptedReply::transport_error("boom")]);
        let mut manager = ConnectionManager::new();
        connect(&mut manager, &failing).await.expect_err("first attempt");

        let healthy = script(vec![init_ok(), tools_ok()]);
        connect(&mut manager, &healthy).await.expect("second attempt");
        assert_eq!(manager.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let transport = script(vec![init_ok(), tools_ok()]);
        let mut manager = ConnectionManager::new();
        connect(&mut manager, &transport).await.expect("connect");

        manager.disconnect().await;
        manager.disconnect().await;

        assert_eq!(transport.close_count(), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_noop() {
        let mut manager: ConnectionManager<MockTransport> = ConnectionManager::new();
        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_second_connect_while_ready_is_refused() {
        let transport = script(vec![init_ok(), tools_ok()]);
        let mut manager = ConnectionManager::new();
        connect(&mut manager, &transport).await.expect("connect");

        let err = connect(&mut manager, &transport).await.expect_err("double connect");
        assert!(matches!(
            err,
            ConnectionError::InvalidState(ConnectionState::Ready)
        ));
        // The live connection is untouched.
        assert_eq!(manager.state(), ConnectionState::Ready);
        assert_eq!(transport.close_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_state_requires_disconnect_before_reconnect() {
        let transport = script(vec![init_ok(), tools_ok()]);
        let mut manager = ConnectionManager::new();
        connect(&mut manager, &transport).await.expect("connect");

        manager.mark_failed();
        assert_eq!(manager.state(), ConnectionState::Failed);
        assert!(manager.client().is_none());

        let err = connect(&mut manager, &transport).await.expect_err("connect while failed");
        assert!(matches!(
            err,
            ConnectionError::InvalidState(ConnectionState::Failed)
        ));

        manager.disconnect().await;
        assert_eq!(transport.close_count(), 1);

        let healthy = script(vec![init_ok(), tools_ok()]);
        connect(&mut manager, &healthy).await.expect("recovered");
        assert_eq!(manager.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_mark_failed_only_applies_while_ready() {
        let mut manager: ConnectionManager<MockTransport> = ConnectionManager::new();
        manager.mark_failed();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
