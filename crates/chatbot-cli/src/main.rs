use anyhow::Result;
use chatbot_core::{constants::paths, Settings};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod document;
mod panel;
mod theme;

#[derive(Parser)]
#[command(name = "chatbot")]
#[command(about = "Chatbot - conversation panel and code template helper")]
#[command(version)]
struct Cli {
    /// Ask a single question, print the answer and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Answer service endpoint
    #[arg(long)]
    url: Option<String>,

    /// Color theme (dark, tokyo-night, dracula)
    #[arg(long)]
    theme: Option<String>,

    /// File to open in the document pane
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Delay between characters when typing the template
    #[arg(long)]
    typing_interval_ms: Option<u64>,
}

fn init_logging(to_file: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if !to_file {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    // The TUI owns the terminal, so logs go to a file or nowhere.
    let dir = Settings::data_dir();
    let file = std::fs::create_dir_all(&dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(paths::LOG_FILE))
    });
    if let Ok(file) = file {
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.prompt.is_none());

    let mut settings = Settings::load();

    if let Some(url) = cli.url {
        settings.transport.url = url;
    }
    if let Some(ms) = cli.typing_interval_ms {
        settings.typing.interval_ms = ms;
    }
    let theme = cli.theme.unwrap_or_else(|| settings.view.theme.clone());

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, &prompt).await?;
    } else {
        app::run_tui(settings, &theme, cli.file).await?;
    }

    Ok(())
}
