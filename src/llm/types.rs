//! Conversation and tool-call types exchanged with the runtime.

use serde::{Deserialize, Serialize};

/// One model round: the conversation so far plus the callable tools.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System instruction.
    pub system: String,
    /// Conversation messages, oldest first.
    pub messages: Vec<Message>,
    /// Tools the model may call this round. `None` withholds tools,
    /// forcing a textual answer.
    pub tools: Option<Vec<Tool>>,
    /// Maximum tokens for the response.
    pub max_tokens: u32,
}

/// A conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Message payload.
    pub content: Content,
}

impl Message {
    /// A plain user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    /// A plain assistant message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Text(text.into()),
        }
    }

    /// An assistant message carrying the round's content blocks verbatim.
    #[must_use]
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Blocks(blocks),
        }
    }

    /// A tool result answering a specific tool call.
    #[must_use]
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            role: Role::User,
            content: Content::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error: if is_error { Some(true) } else { None },
            }]),
        }
    }
}

/// Message author.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End user (also carries tool results back to the model).
    User,
    /// The model.
    Assistant,
}

/// Message payload: plain text or structured blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text.
    Text(String),
    /// Structured content blocks.
    Blocks(Vec<ContentBlock>),
}

/// One structured block inside a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text block.
    #[serde(rename = "text")]
    Text {
        /// The text.
        text: String,
    },

    /// The model requests a tool call.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// Call id, echoed back in the matching result.
        id: String,
        /// Tool name.
        name: String,
        /// Arguments object.
        input: serde_json::Value,
    },

    /// A tool result answering a call.
    #[serde(rename = "tool_result")]
    ToolResult {
        /// Id of the call this answers.
        tool_use_id: String,
        /// Result text.
        content: String,
        /// Present and true when the tool failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// A callable tool as presented to the runtime. A 1:1 mirror of the
/// server-advertised descriptor: same name, same schema.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tool {
    /// Tool name.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON Schema for the arguments.
    pub input_schema: serde_json::Value,
}

/// One model round's output.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Content blocks produced by the model.
    pub content: Vec<ContentBlock>,
    /// Model that produced the response.
    pub model: String,
    /// Why the round ended.
    pub stop_reason: Option<StopReason>,
    /// Token accounting.
    pub usage: Usage,
}

impl ChatResponse {
    /// First text block, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Iterate the requested tool calls as `(id, name, input)`.
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolUse { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            _ => None,
        })
    }

    /// True when the model requested at least one tool call.
    #[must_use]
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

/// Why a model round ended.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Finished a normal textual answer.
    EndTurn,
    /// Paused to call tools.
    ToolUse,
    /// Hit the token ceiling.
    MaxTokens,
}

/// Token accounting for one round.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    pub input_tokens: u32,
    /// Completion tokens.
    pub output_tokens: u32,
}

/// Outcome of one model round, separating retryable conditions from
/// hard failures.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    /// The round completed.
    Success(ChatResponse),
    /// Provider rate limit; retryable with backoff.
    RateLimited,
    /// The request itself was malformed; not retryable.
    InvalidRequest(String),
    /// Provider-side failure; retryable.
    ServerError(String),
}
