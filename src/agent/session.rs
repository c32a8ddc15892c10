//! The conversation runtime.
//!
//! One [`AgentSession`] drives one conversation against one MCP
//! connection: it feeds user turns to the model, executes the tool calls
//! the model asks for through the [`ToolBridge`], and loops until the
//! model produces a plain-text answer.
//!
//! The session never panics a turn away. Provider failures that survive
//! the retry policy come back to the caller as a readable error string,
//! and a lost MCP connection is recorded on the session so the caller
//! can tear the connection down.

use std::sync::Arc;

use anyhow::bail;
use async_stream::stream;
use futures::future::join_all;
use futures::Stream;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::AgentConfig;
use crate::llm::{ChatOutcome, ChatRequest, ChatResponse, LlmProvider, Message};
use crate::mcp::{McpTransport, ToolBridge};

use super::history::ConversationHistory;
use super::prompt::SYSTEM_PROMPT;

/// One conversation bound to a provider and a tool bridge.
pub struct AgentSession<P, T>
where
    P: LlmProvider,
    T: McpTransport,
{
    provider: Arc<P>,
    bridge: Arc<ToolBridge<T>>,
    history: ConversationHistory,
    config: AgentConfig,
    system_prompt: String,
    connection_lost: bool,
}

impl<P, T> AgentSession<P, T>
where
    P: LlmProvider,
    T: McpTransport,
{
    #[must_use]
    pub fn new(provider: Arc<P>, bridge: Arc<ToolBridge<T>>, config: AgentConfig) -> Self {
        Self {
            provider,
            bridge,
            history: ConversationHistory::new(config.history_turns),
            config,
            system_prompt: SYSTEM_PROMPT.to_string(),
            connection_lost: false,
        }
    }

    /// Replace the default system instruction.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// True once a tool call has failed because the MCP connection is
    /// gone. The session keeps answering from context, but the caller
    /// should mark the connection failed and stop issuing turns.
    #[must_use]
    pub fn connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// The messages currently in the conversation window.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        self.history.messages()
    }

    /// Run one user turn, yielding the assistant's text as it lands.
    ///
    /// The stream yields one fragment per model round: interleaved
    /// commentary while tools run, then the final answer. It is finite
    /// and lazy; nothing happens until it is polled. Errors are yielded
    /// as readable text, never panicked.
    pub fn ask_stream(&mut self, message: impl Into<String>) -> impl Stream<Item = String> + '_ {
        let message = message.into();
        stream! {
            self.history.push(Message::user(message));
            self.bridge.begin_turn();
            let mut tools_available = true;

            // The ceiling bounds useful rounds; the extra two cover the
            // refusal round and the forced final answer.
            let max_rounds = self.config.max_tool_calls_per_turn + 2;

            for round in 0..max_rounds {
                let request = ChatRequest {
                    system: self.system_prompt.clone(),
                    messages: self.history.messages().to_vec(),
                    tools: if tools_available {
                        Some(self.bridge.runtime_tools())
                    } else {
                        None
                    },
                    max_tokens: self.config.max_tokens,
                };

                let response = match self.chat_with_retry(request).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(error = %e, "turn abandoned");
                        yield format!("An error occurred: {e}");
                        return;
                    }
                };

                if let Some(text) = response.first_text() {
                    if !text.is_empty() {
                        yield text.to_string();
                    }
                }

                if !response.has_tool_use() || !tools_available {
                    let text = response.first_text().unwrap_or_default().to_string();
                    self.history.push(Message::assistant(text));
                    return;
                }

                debug!(round, "executing tool calls");
                self.history
                    .push(Message::assistant_blocks(response.content.clone()));
                if !self.run_tool_calls(&response).await {
                    tools_available = false;
                }
            }

            warn!("turn ended without a final answer");
            yield "An error occurred: the conversation did not converge to an answer".to_string();
        }
    }

    /// Run one user turn and return the full answer.
    ///
    /// Concatenates the fragments of [`Self::ask_stream`].
    pub async fn ask(&mut self, message: impl Into<String>) -> String {
        use futures::StreamExt;
        let fragments: Vec<String> = self.ask_stream(message).collect().await;
        fragments.join("\n\n")
    }

    /// Execute every tool call in the response concurrently and append
    /// the results to history in block order. Returns false once the
    /// per-turn budget is spent.
    async fn run_tool_calls(&mut self, response: &ChatResponse) -> bool {
        let calls: Vec<(String, String, Value)> = response
            .tool_uses()
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect();

        let bridge = Arc::clone(&self.bridge);
        let results = join_all(calls.into_iter().map(|(id, name, input)| {
            let bridge = Arc::clone(&bridge);
            async move { (id, bridge.invoke(&name, input).await) }
        }))
        .await;

        let mut budget_left = true;
        for (id, result) in results {
            match result {
                Ok(outcome) => {
                    if outcome.connection_lost {
                        self.connection_lost = true;
                    }
                    let content = if outcome.content.is_empty() {
                        "(no output)".to_string()
                    } else {
                        outcome.content
                    };
                    self.history
                        .push(Message::tool_result(id, content, outcome.is_error));
                }
                Err(limit) => {
                    budget_left = false;
                    self.history.push(Message::tool_result(
                        id,
                        format!("{limit}; answer with the information gathered so far"),
                        true,
                    ));
                }
            }
        }
        budget_left
    }

    /// Rate limits and server errors back off and retry; invalid
    /// requests fail immediately.
    async fn chat_with_retry(&self, request: ChatRequest) -> anyhow::Result<ChatResponse> {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0u32;

        loop {
            let outcome = self.provider.chat(request.clone()).await?;
            match outcome {
                ChatOutcome::Success(response) => return Ok(response),
                ChatOutcome::InvalidRequest(msg) => bail!("invalid request: {msg}"),
                ChatOutcome::RateLimited => {
                    attempt += 1;
                    if attempt > max_retries {
                        bail!("rate limited after {max_retries} retries");
                    }
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "rate limited, retrying");
                    sleep(delay).await;
                }
                ChatOutcome::ServerError(msg) => {
                    attempt += 1;
                    if attempt > max_retries {
                        bail!("server error after {max_retries} retries: {msg}");
                    }
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %msg,
                        "server error, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
