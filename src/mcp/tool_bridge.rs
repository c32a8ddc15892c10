//! Bridge between discovered MCP tools and the agent runtime.
//!
//! The bridge exposes the server's tool list to the runtime as-is (same
//! names, same schemas) and forwards invocations to the protocol session.
//! A failed call never crashes the conversation: every [`ToolError`]
//! becomes an error-flagged tool result the runtime can react to.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::client::McpClient;
use super::error::ToolError;
use super::protocol::ToolDefinition;
use super::transport::McpTransport;
use crate::llm::Tool;

/// Raised when a turn has used up its tool-call budget. Ends the turn's
/// tool-calling phase; the runtime must answer with what it has.
#[derive(Debug, Error)]
#[error("tool call limit ({0}) reached for this turn")]
pub struct TooManyToolCalls(pub usize);

/// Result of one bridged invocation, shaped for the runtime's
/// tool-result channel.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Result or diagnostic text.
    pub content: String,
    /// True when the call failed in any way.
    pub is_error: bool,
    /// True when the failure means the connection itself is gone.
    pub connection_lost: bool,
}

impl ToolOutcome {
    fn success(content: String) -> Self {
        Self {
            content,
            is_error: false,
            connection_lost: false,
        }
    }

    fn failure(error: &ToolError) -> Self {
        let connection_lost = matches!(error, ToolError::Session(e) if e.is_fatal());
        Self {
            content: error.to_string(),
            is_error: true,
            connection_lost,
        }
    }
}

/// Adapts the protocol session's tool list to the runtime's calling
/// convention, and enforces the per-turn tool-call ceiling.
pub struct ToolBridge<T: McpTransport> {
    client: Arc<McpClient<T>>,
    tools: Vec<ToolDefinition>,
    max_calls_per_turn: usize,
    calls_this_turn: AtomicUsize,
}

impl<T: McpTransport> ToolBridge<T> {
    /// Build a bridge over an already-discovered tool list.
    #[must_use]
    pub fn new(
        client: Arc<McpClient<T>>,
        tools: Vec<ToolDefinition>,
        max_calls_per_turn: usize,
    ) -> Self {
        Self {
            client,
            tools,
            max_calls_per_turn,
            calls_this_turn: AtomicUsize::new(0),
        }
    }

    /// Build a bridge by listing the server's tools now.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn discover(
        client: Arc<McpClient<T>>,
        max_calls_per_turn: usize,
    ) -> Result<Self, crate::mcp::McpError> {
        let tools = client.list_tools().await?;
        debug!(count = tools.len(), "bridged tool list");
        Ok(Self::new(client, tools, max_calls_per_turn))
    }

    /// The bridged descriptors, in server-advertised order.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// The tool list in the runtime's shape. A 1:1 mirror: nothing is
    /// dropped or renamed.
    #[must_use]
    pub fn runtime_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| Tool {
                name: t.name.clone(),
                description: t.description.clone().unwrap_or_default(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    /// Reset the tool-call budget at the start of a user turn.
    pub fn begin_turn(&self) {
        self.calls_this_turn.store(0, Ordering::SeqCst);
    }

    /// Calls used so far in the current turn.
    #[must_use]
    pub fn calls_this_turn(&self) -> usize {
        self.calls_this_turn.load(Ordering::SeqCst)
    }

    /// Forward one tool call to the session.
    ///
    /// Any [`ToolError`] comes back as an error-flagged [`ToolOutcome`]
    /// rather than an `Err`, so a single failed tool cannot end the turn.
    ///
    /// # Errors
    ///
    /// Only [`TooManyToolCalls`], once the turn's budget is spent.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutcome, TooManyToolCalls> {
        let used = self.calls_this_turn.fetch_add(1, Ordering::SeqCst);
        if used >= self.max_calls_per_turn {
            warn!(
                limit = self.max_calls_per_turn,
                tool = name,
                "tool call refused: per-turn limit reached"
            );
            return Err(TooManyToolCalls(self.max_calls_per_turn));
        }

        debug!(tool = name, call = used + 1, "invoking tool");
        match self.client.call_tool(name, arguments).await {
            Ok(result) => Ok(ToolOutcome::success(result.text())),
            Err(error) => {
                warn!(tool = name, error = %error, "tool call failed");
                Ok(ToolOutcome::failure(&error))
            }
        }
    }
}
