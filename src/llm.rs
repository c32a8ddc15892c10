//! Agent runtime seam.
//!
//! The conversational runtime is an external collaborator: it accepts a set
//! of callable tools and the conversation so far, and produces a response
//! that may request tool calls. [`LlmProvider`] is the only contract this
//! crate holds it to.

pub mod types;

pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// Provider-agnostic interface to the conversational runtime.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one model round over the conversation.
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome>;

    /// Model identifier in use.
    fn model(&self) -> &str;

    /// Provider name, for diagnostics.
    fn provider(&self) -> &'static str;
}
