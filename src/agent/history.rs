//! Bounded conversation state.
//!
//! The window is measured in user turns, not messages: a turn is a plain
//! user message plus everything up to the next one (assistant tool-use
//! blocks and their tool results included). Pruning always drops whole
//! turns so the model never sees a tool result without the call that
//! produced it.

use crate::llm::{Content, Message, Role};

/// Message log with a sliding window over user turns.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationHistory {
    /// A history keeping the last `max_turns` user turns. 0 keeps all.
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    /// Append a message, pruning turns that fall out of the window.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.prune();
    }

    /// The messages currently in the window, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A plain user text message starts a turn. Tool results are also
    /// user-role but carry blocks, so they stay with their turn.
    fn is_turn_start(message: &Message) -> bool {
        message.role == Role::User && matches!(message.content, Content::Text(_))
    }

    fn prune(&mut self) {
        if self.max_turns == 0 {
            return;
        }
        let starts: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| Self::is_turn_start(m))
            .map(|(i, _)| i)
            .collect();
        if starts.len() > self.max_turns {
            let cut = starts[starts.len() - self.max_turns];
            self.messages.drain(..cut);
        }
    }
}
