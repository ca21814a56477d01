use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event as CrosstermEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::{io, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_core::{ClientConfig, Controller, HttpTransport};

mod app;
mod event;
mod ui;

use app::{App, Command};
use event::{Event, EventHandler};

#[derive(Parser)]
#[command(author, version, about = "Terminal chat client for a chat-bot backend", long_about = None)]
struct Cli {
    /// Base URL of the chat-bot backend
    #[arg(long, env = "CHAT_BOT_BASE_URL")]
    base_url: Option<String>,

    /// Seconds to wait for an answer before giving up
    #[arg(long, env = "CHAT_BOT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// JSON config file with `base_url` / `request_timeout_secs`
    #[arg(short, long, env = "CHAT_BOT_CONFIG")]
    config: Option<PathBuf>,

    /// Where logs go while the terminal is in use
    #[arg(long, default_value = "chat-tui.log")]
    log_file: PathBuf,

    /// Redraw interval in milliseconds
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    // 0. Resolve config & build the controller
    let config = ClientConfig::resolve(cli.config.as_deref(), cli.base_url, cli.timeout_secs)
        .context("Failed to load client configuration")?;
    let transport = HttpTransport::new(&config).context("Failed to build HTTP transport")?;
    let endpoint = transport.endpoint().to_string();
    info!(%endpoint, timeout = ?config.request_timeout(), "starting chat client");

    let controller = Controller::new(Arc::new(transport), config.request_timeout());
    let mut app = App::new(controller, endpoint);

    // 1. Setup terminal (raw mode, alternate screen)
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 2. Event sources
    let mut events = EventHandler::new(Duration::from_millis(cli.tick_ms));

    // 3. Run loop
    let res = run_app(&mut terminal, &mut app, &mut events).await;

    // 4. Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> io::Result<()> {
    loop {
        // Draw
        app.sync();
        terminal.draw(|f| ui::draw(f, app))?;

        let Some(event) = events.next().await else {
            return Ok(());
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Settled(result) => app.on_settled(result),
            Event::Terminal(CrosstermEvent::Key(key)) => match app.on_key(key) {
                Command::Quit => return Ok(()),
                Command::Dispatch(submission) => {
                    let controller = app.controller();
                    let tx = events.sender();
                    tokio::spawn(async move {
                        let result = controller.dispatch(submission).await;
                        let _ = tx.send(Event::Settled(result)).await;
                    });
                }
                Command::None => {}
            },
            Event::Terminal(CrosstermEvent::Paste(text)) => app.on_paste(&text),
            Event::Terminal(CrosstermEvent::Mouse(mouse)) => app.on_mouse(mouse),
            Event::Terminal(_) => {}
        }
    }
}
