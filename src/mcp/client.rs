//! MCP protocol session.
//!
//! [`McpClient`] wraps a transport with the MCP request/response flow:
//! the `initialize` handshake, tool discovery, and correlated tool calls.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::{McpError, ToolError};
use super::protocol::{
    error_codes, CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, InitializeParams,
    InitializeResult, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ToolDefinition,
    ToolsListResult,
};
use super::transport::McpTransport;

/// MCP protocol version this client implements.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Protocol session over one transport.
///
/// Must be initialized before any other operation. Concurrent `call_tool`
/// invocations are supported; each is matched to its result by the
/// transport's correlation id, never by ordering.
pub struct McpClient<T: McpTransport> {
    transport: Arc<T>,
    server_info: RwLock<Option<InitializeResult>>,
    /// Tool names from the most recent listing, used to reject calls to
    /// tools the server never advertised.
    known_tools: RwLock<Vec<String>>,
}

impl<T: McpTransport> McpClient<T> {
    /// Create an uninitialized session over `transport`.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            server_info: RwLock::new(None),
            known_tools: RwLock::new(Vec::new()),
        }
    }

    /// Perform the capability handshake.
    ///
    /// Sends `initialize`, verifies the protocol version, then sends the
    /// `notifications/initialized` notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not acknowledge, speaks an
    /// incompatible protocol version, or the transport fails.
    pub async fn initialize(&self) -> Result<InitializeResult, McpError> {
        let params = InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let request = JsonRpcRequest::new("initialize", Some(serde_json::to_value(&params)?));
        let response = self.transport.send(request).await?;
        let result: InitializeResult = Self::expect_result(response, "initialize")?;

        if result.protocol_version != MCP_PROTOCOL_VERSION {
            return Err(McpError::IncompatibleVersion {
                server: result.protocol_version,
                client: MCP_PROTOCOL_VERSION.to_string(),
            });
        }

        self.transport
            .notify(JsonRpcNotification::new("notifications/initialized", None))
            .await?;

        debug!(
            server = %result.server_info.name,
            version = result.server_info.version.as_deref().unwrap_or("unknown"),
            "MCP session initialized"
        );

        *self.server_info.write().await = Some(result.clone());
        Ok(result)
    }

    /// Server identification, once initialized.
    pub async fn server_info(&self) -> Option<InitializeResult> {
        self.server_info.read().await.clone()
    }

    async fn ensure_initialized(&self) -> Result<(), McpError> {
        if self.server_info.read().await.is_none() {
            return Err(McpError::NotInitialized);
        }
        Ok(())
    }

    /// List the tools the server currently advertises, in advertised order.
    ///
    /// The result is never cached across calls; it reflects server-side
    /// truth at call time. Paginated listings are followed to the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is uninitialized or the request
    /// fails.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        self.ensure_initialized().await?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let request = JsonRpcRequest::new("tools/list", params);
            let response = self.transport.send(request).await?;
            let page: ToolsListResult = Self::expect_result(response, "tools/list")?;

            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        *self.known_tools.write().await = tools.iter().map(|t| t.name.clone()).collect();
        Ok(tools)
    }

    /// Call a tool and wait for its correlated result.
    ///
    /// # Errors
    ///
    /// - [`ToolError::UnknownTool`] when `name` is not in the last-known
    ///   tool list.
    /// - [`ToolError::InvalidArguments`] when the server rejects the
    ///   arguments against the tool's schema.
    /// - [`ToolError::RemoteFailure`] when the tool executed but returned
    ///   an error payload.
    /// - [`ToolError::Timeout`] when no response arrives in time; the
    ///   remote outcome is unknown.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        self.ensure_initialized().await?;

        {
            let known = self.known_tools.read().await;
            if !known.is_empty() && !known.iter().any(|t| t == name) {
                return Err(ToolError::UnknownTool(name.to_string()));
            }
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        let params = serde_json::to_value(&params).map_err(McpError::from)?;
        let request = JsonRpcRequest::new("tools/call", Some(params));

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(McpError::Timeout) => return Err(ToolError::Timeout(name.to_string())),
            Err(e) => return Err(ToolError::Session(e)),
        };

        if let Some(error) = response.error {
            if error.code == error_codes::INVALID_PARAMS {
                return Err(ToolError::InvalidArguments {
                    tool: name.to_string(),
                    message: error.message,
                });
            }
            return Err(ToolError::Session(McpError::ServerError {
                code: error.code,
                message: error.message,
                data: error.data,
            }));
        }

        let result: CallToolResult =
            Self::expect_result(response, "tools/call").map_err(ToolError::Session)?;

        if result.is_error {
            return Err(ToolError::RemoteFailure {
                tool: name.to_string(),
                message: result.text(),
            });
        }
        Ok(result)
    }

    /// Close the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to close.
    pub async fn close(&self) -> Result<(), McpError> {
        self.transport.close().await
    }

    /// Unpack a response's result payload, surfacing JSON-RPC errors.
    fn expect_result<R: serde::de::DeserializeOwned>(
        response: JsonRpcResponse,
        method: &str,
    ) -> Result<R, McpError> {
        if let Some(error) = response.error {
            return Err(McpError::ServerError {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }
        let result = response
            .result
            .ok_or_else(|| McpError::protocol(format!("{method} response missing result")))?;
        serde_json::from_value(result)
            .map_err(|e| McpError::protocol(format!("failed to parse {method} response: {e}")))
    }
}
