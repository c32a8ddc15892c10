//! MCP (Model Context Protocol) client support.
//!
//! Everything between the agent runtime and the remote tool server lives
//! here:
//!
//! - [`SseTransport`] - SSE transport with id-correlated request/response
//! - [`McpClient`] - protocol session (initialize, tools/list, tools/call)
//! - [`ConnectionManager`] - owns the stream + session lifecycle
//! - [`ToolBridge`] - exposes discovered tools to the runtime and enforces
//!   the per-turn tool-call ceiling
//!
//! # Connection flow
//!
//! ```ignore
//! let mut manager = ConnectionManager::new();
//! let tools = manager.connect("http://localhost:8001/sse", config).await?;
//! let bridge = ToolBridge::new(manager.client().unwrap(), tools, 10);
//! // ... converse ...
//! manager.disconnect().await;
//! ```
//!
//! Teardown is symmetric with acquisition: the session closes before the
//! stream, and a partially established connection is cleaned up before the
//! failure surfaces.

pub mod client;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod tool_bridge;
pub mod transport;

#[cfg(test)]
pub mod test_support;

pub use client::{McpClient, MCP_PROTOCOL_VERSION};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{ConnectionError, McpError, ToolError};
pub use protocol::{CallToolResult, ToolContent, ToolDefinition};
pub use tool_bridge::{TooManyToolCalls, ToolBridge, ToolOutcome};
pub use transport::{McpTransport, SseTransport, SseTransportConfig};
