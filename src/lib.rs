//! Kite Assistant - a trading account assistant speaking MCP.
//!
//! The crate connects to a Zerodha Kite MCP server over SSE, discovers
//! the tools it advertises, and drives a tool-using LLM conversation on
//! top of them:
//! - SSE transport and JSON-RPC session ([`mcp`])
//! - Connection lifecycle and the per-turn tool-call ceiling ([`mcp`])
//! - Provider-agnostic LLM interface ([`llm`], [`providers`])
//! - The conversation runtime ([`agent`])
//!
//! # Example
//!
//! ```ignore
//! use kite_assistant::{
//!     AgentConfig, AgentSession, ConnectionManager, SseTransportConfig, ToolBridge,
//!     providers::OpenAIProvider,
//! };
//! use std::sync::Arc;
//!
//! let mut manager = ConnectionManager::new();
//! let tools = manager
//!     .connect("http://localhost:8001/sse", SseTransportConfig::default())
//!     .await?;
//! let bridge = ToolBridge::new(manager.client().unwrap(), tools, 10);
//!
//! let provider = Arc::new(OpenAIProvider::from_env()?);
//! let mut session = AgentSession::new(provider, Arc::new(bridge), AgentConfig::default());
//!
//! let answer = session.ask("am I logged in?").await;
//! manager.disconnect().await;
//! ```

#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod llm;
pub mod mcp;
pub mod providers;

pub use agent::{AgentSession, ConversationHistory};
pub use config::{AgentConfig, Cli, RetryConfig};
pub use llm::LlmProvider;
pub use mcp::{
    ConnectionError, ConnectionManager, ConnectionState, McpClient, McpError, SseTransport,
    SseTransportConfig, TooManyToolCalls, ToolBridge, ToolDefinition, ToolError,
};
