mod bot;
mod config;
mod extract;
mod fetch;
mod query;
mod render;
mod resolve;
mod translate;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "strofa",
    version,
    about = "Genius lyrics lookup with line-by-line translation"
)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a free-text query through the full pipeline and print the
    /// outbound message blocks.
    Query {
        text: Vec<String>,
    },
    /// Resolve a query to a song page URL (headless).
    Resolve {
        query: String,
    },
    /// Fetch a song page URL and print its extracted title and lyrics
    /// (headless).
    Extract {
        url: String,
    },
    /// Print the welcome message (default).
    Welcome,
    /// Print the usage help message.
    HelpText,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Welcome) {
        Command::Query { text } => {
            // Dispatch-layer catch-all: a query must always be answered with
            // a chat message, never a raw error.
            let blocks = match bot::App::new(&cfg) {
                Ok(app) => app.handle_query(&text.join(" ")).await,
                Err(e) => {
                    tracing::error!(error = %e, "pipeline initialization failed");
                    vec![bot::GENERIC_ERROR_MSG.to_string()]
                }
            };
            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    println!("{}", "─".repeat(40));
                }
                println!("{block}");
            }
        }
        Command::Resolve { query: raw } => {
            let normalized = query::normalize(&raw);
            anyhow::ensure!(!normalized.is_empty(), "empty query");
            let app = bot::App::new(&cfg)?;
            let url = app
                .resolve(&normalized)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("{url}");
        }
        Command::Extract { url } => {
            let app = bot::App::new(&cfg)?;
            let record = app.extract_page(&url).await?;
            println!("{}\n", record.title);
            println!("{}", record.lyrics);
        }
        Command::Welcome => println!("{}", bot::welcome_text()),
        Command::HelpText => println!("{}", bot::help_text()),
    }

    Ok(())
}
