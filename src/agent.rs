//! The trading assistant's conversation layer.
//!
//! [`AgentSession`] runs user turns against an LLM provider and the MCP
//! tool bridge; [`ConversationHistory`] bounds what the model sees.

pub mod history;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub mod test_utils;

pub use history::ConversationHistory;
pub use prompt::SYSTEM_PROMPT;
pub use session::AgentSession;
