use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

use chat_core::{ClientConfig, Controller, HttpTransport, Message};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ClientArgs {
    /// Base URL of the chat-bot backend
    #[arg(long, global = true, env = "CHAT_BOT_BASE_URL")]
    base_url: Option<String>,

    /// Seconds to wait for an answer before giving up
    #[arg(long, global = true, env = "CHAT_BOT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// JSON config file with `base_url` / `request_timeout_secs`
    #[arg(short, long, global = true, env = "CHAT_BOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Question text, sent as-is
        question: String,
    },
    /// Read questions from stdin, one per line
    Repl,
}

fn format_reply(message: &Message) -> String {
    format!("[{}] bot: {}", message.timestamp_label(), message.content)
}

/// Asks every line of `input` in turn. A failed question is logged and the
/// loop moves on to the next line.
async fn run_repl<R, W>(controller: &Controller, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match controller.ask(line).await {
            Ok(reply) => writeln!(out, "{}", format_reply(&reply))?,
            Err(e) => error!(error = %e, "question failed"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::resolve(
        cli.client.config.as_deref(),
        cli.client.base_url,
        cli.client.timeout_secs,
    )
    .context("Failed to load client configuration")?;

    let transport = HttpTransport::new(&config).context("Failed to build HTTP transport")?;
    let controller = Controller::new(Arc::new(transport), config.request_timeout());

    match cli.command {
        Commands::Ask { question } => {
            let reply = controller
                .ask(question)
                .await
                .context("Chat request failed")?;
            println!("{}", reply.content);
        }
        Commands::Repl => {
            let stdin = BufReader::new(tokio::io::stdin());
            run_repl(&controller, stdin, &mut std::io::stdout()).await?;
        }
    }

    Ok(())
}
