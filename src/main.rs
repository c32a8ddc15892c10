//! Interactive entry point for the trading assistant.
//!
//! Connects to the Kite MCP server, then loops on stdin until the user
//! types `quit` or sends Ctrl-C. The MCP connection is torn down on
//! every exit path.

use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use futures::{pin_mut, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kite_assistant::providers::OpenAIProvider;
use kite_assistant::{
    AgentConfig, AgentSession, Cli, ConnectionManager, LlmProvider, SseTransportConfig, ToolBridge,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let url = cli.sse_url();

    let provider = Arc::new(OpenAIProvider::from_env()?);

    let mut manager = ConnectionManager::new();
    let tools = manager
        .connect(&url, SseTransportConfig::default())
        .await
        .with_context(|| format!("could not connect to MCP server at {url}"))?;
    info!(count = tools.len(), %url, "connected");

    let config = AgentConfig::default();
    let client = manager.client().context("connection not ready")?;
    let bridge = Arc::new(ToolBridge::new(
        client,
        tools,
        config.max_tool_calls_per_turn,
    ));
    let mut session = AgentSession::new(provider, bridge, config);

    println!();
    println!(
        "{}",
        style(
            "Welcome to Zerodha! I'm here to assist you with managing your trading account, \
             orders, portfolio, and positions. How can I help you today?"
        )
        .cyan()
    );

    let result = tokio::select! {
        r = repl(&mut session) => r,
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(())
        }
    };

    if session.connection_lost() {
        manager.mark_failed();
    }
    manager.disconnect().await;

    result
}

async fn repl<P, T>(session: &mut AgentSession<P, T>) -> Result<()>
where
    P: LlmProvider,
    T: kite_assistant::mcp::McpTransport,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!();
        print!(
            "{} {} ",
            style("Enter your query:").blue().bold(),
            style("(or 'quit' to exit)").dim()
        );
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_quit(query) {
            break;
        }

        println!();
        println!("{} {query}", style("You:").magenta().bold());
        println!();
        print!("{} ", style("Assistant:").magenta().bold());
        std::io::stdout().flush()?;

        {
            let answer = session.ask_stream(query);
            pin_mut!(answer);
            while let Some(fragment) = answer.next().await {
                print!("{}", style(fragment).green());
                std::io::stdout().flush()?;
            }
        }
        println!();

        if session.connection_lost() {
            eprintln!(
                "{}",
                style("Connection to the trading server was lost.").red().bold()
            );
            break;
        }
    }

    Ok(())
}

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::is_quit;

    #[test]
    fn test_quit_is_case_insensitive() {
        assert!(is_quit("quit"));
        assert!(is_quit("QUIT"));
        assert!(is_quit("  Quit  "));
    }

    #[test]
    fn test_ordinary_queries_are_not_quit() {
        assert!(!is_quit("quit my position in INFY"));
        assert!(!is_quit("show my orders"));
        assert!(!is_quit(""));
    }
}
