//! CLI and agent configuration.

use clap::Parser;

/// Command-line interface. Flags take precedence over the environment
/// variables named on each option.
#[derive(Debug, Parser)]
#[command(name = "kite-assistant", version, about = "Trading account assistant over MCP")]
pub struct Cli {
    /// MCP server host.
    #[arg(long, env = "MCP_HOST", default_value = "localhost")]
    pub host: String,

    /// MCP server port.
    #[arg(long, env = "MCP_PORT", default_value_t = 8001)]
    pub port: u16,
}

impl Cli {
    /// SSE endpoint for the configured server.
    #[must_use]
    pub fn sse_url(&self) -> String {
        format!("http://{}:{}/sse", self.host, self.port)
    }
}

/// Agent session settings.
///
/// The defaults mirror the deployed assistant; none of them are
/// load-tested constants, so treat them as tunables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum tokens per model response.
    pub max_tokens: u32,
    /// Prior user turns kept in the conversation window. 0 keeps all.
    pub history_turns: usize,
    /// Tool calls permitted within a single user turn.
    pub max_tool_calls_per_turn: usize,
    /// Retry behavior for transient provider errors.
    pub retry: RetryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            history_turns: 10,
            max_tool_calls_per_turn: 10,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry behavior for transient provider errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retry attempts.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Delay cap in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// No retries, for tests.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Backoff delay before the given attempt (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms);
        std::time::Duration::from_millis(ms)
    }
}
