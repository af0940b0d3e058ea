use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_digest::config::Config;
use news_digest::loader::{FeedLoader, FeedLocation};
use news_digest::renderer::{start_background_refresh, FeedRenderer};
use news_digest::routes::{self, AppState};
use news_digest::translate::Translator;
use news_digest::updater::Updater;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "news.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the digest page (default)
    Serve,
    /// Rebuild the feed document from the configured sources
    Update {
        /// API key for headline translation
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_digest=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config: {}", cli.config))?;
    info!("Loaded configuration from {}", cli.config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Update { openai_api_key } => update(config, openai_api_key).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let loader = FeedLoader::new(
        FeedLocation::parse(&config.feed_location),
        Duration::from_secs(config.request_timeout),
    )?;
    let renderer = Arc::new(FeedRenderer::new(loader, &config.layout()));

    // Initial load, then periodic reloads
    let bg_renderer = renderer.clone();
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        start_background_refresh(bg_renderer, refresh_interval).await;
    });

    let state = Arc::new(AppState { renderer });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server starting on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn update(config: Config, api_key: Option<String>) -> anyhow::Result<()> {
    let mut translator = Translator::new(&config.update, api_key)?;
    if !translator.is_enabled() {
        info!("No translation API key set, headlines are kept as published");
    }

    let updater = Updater::new(config.update, Duration::from_secs(config.request_timeout))?;
    let document = updater.run(&mut translator).await?;
    info!("Digest updated with {} top stories", document.top_stories.len());

    Ok(())
}
