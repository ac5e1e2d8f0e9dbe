use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use hd_core::config::validate_setting;
use hd_core::storage::settings;
use hd_core::{DigestConfig, DigestStore, Error};
use hd_digest::{create_sender, DigestPipeline, ReactionProcessor, Shutdown};
use hd_sources::{HackerNewsFeed, HtmlExtractor};
use hd_web::AppState;
use tracing::{error, info, warn};

mod logging;
mod schedule;

use logging::init_logging;
use schedule::{next_daily_run, HumanDuration};

#[derive(Parser, Debug)]
#[command(author, version, about = "Personalized Hacker News digest", long_about = None)]
struct Cli {
    /// TOML file with digest settings; defaults apply when omitted
    #[arg(long, env = "HD_CONFIG")]
    config: Option<PathBuf>,
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "sqlite")]
    storage: String,
    #[arg(long)]
    db_path: Option<PathBuf>,
    /// Summarizer: openai or dummy. Picked from the API key when omitted.
    #[arg(long)]
    model: Option<String>,
    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    model_url: Option<String>,
    /// Model id requested from that API (default gpt-4o-mini)
    #[arg(long, env = "HD_MODEL_ID")]
    model_id: Option<String>,
    #[arg(long, env = "HD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,
    /// Delivery: telegram or console. Telegram when a bot token is set.
    #[arg(long)]
    sender: Option<String>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one digest cycle now and print its report
    Digest,
    /// Run digests on a schedule, optionally serving the HTTP API
    Run {
        /// Time between cycles (e.g. 24h, 12h, 1h30m). The schedule_time setting overrides it.
        #[arg(long, default_value = "24h")]
        interval: HumanDuration,
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Feed one reaction on a delivered message
    React {
        message_id: i64,
        /// Defaults to the configured positive reaction
        #[arg(long)]
        reaction: Option<String>,
    },
    /// List learned tag weights
    Prefs,
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    Get { key: String },
    Set { key: String, value: String },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DigestConfig> {
    match path {
        Some(path) => DigestConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(DigestConfig::default()),
    }
}

fn build_pipeline(cli: &Cli, store: Arc<dyn DigestStore>, config: DigestConfig) -> anyhow::Result<DigestPipeline> {
    let summarizer = hd_inference::create_model(
        hd_inference::Config::new(cli.api_key.clone(), cli.model.clone(), cli.model_url.clone())
            .with_model_id(cli.model_id.clone()),
    )?;
    info!("🧠 Summarizer ready ({})", summarizer.name());

    let sender_kind = cli
        .sender
        .clone()
        .unwrap_or_else(|| if cli.telegram_token.is_some() { "telegram" } else { "console" }.to_string());
    let sender = create_sender(&sender_kind, cli.telegram_token.clone(), store.clone())?;

    Ok(DigestPipeline::new(
        Arc::new(HackerNewsFeed::new()),
        Arc::new(HtmlExtractor::new(config.max_content_chars)),
        summarizer,
        sender,
        store,
        config,
    ))
}

/// How long to wait before the next cycle. A valid `schedule_time`
/// setting wins; otherwise the first cycle runs at once and later ones
/// wait `interval`.
async fn next_delay(store: &dyn DigestStore, interval: Duration, first: bool) -> Duration {
    let fallback = if first { Duration::ZERO } else { interval };
    match store.get_setting(settings::SCHEDULE_TIME).await {
        Ok(Some(time)) => {
            let now = Utc::now();
            match next_daily_run(now, &time) {
                Ok(at) => (at - now).to_std().unwrap_or(Duration::ZERO),
                Err(e) => {
                    warn!("Ignoring schedule_time: {}", e);
                    fallback
                }
            }
        }
        Ok(None) => fallback,
        Err(e) => {
            warn!("Could not read schedule_time: {}", e);
            fallback
        }
    }
}

async fn run_scheduler(pipeline: Arc<DigestPipeline>, interval: Duration, shutdown: Shutdown) {
    let store = pipeline.store();
    let mut first = true;

    loop {
        let delay = next_delay(store.as_ref(), interval, first).await;
        first = false;
        if !delay.is_zero() {
            info!("⏰ Next digest in {}s", delay.as_secs());
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.triggered() => break,
        }

        match pipeline.run(&shutdown).await {
            Ok(report) if report.cancelled => break,
            Ok(report) => info!("Cycle delivered {} items", report.delivered.len()),
            Err(Error::CycleInProgress) => warn!("Skipping scheduled cycle, another one is running"),
            Err(e) => error!("Digest cycle failed: {}", e),
        }
    }
    info!("Scheduler stopped");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;
    let store = hd_storage::create_storage(&cli.storage, cli.db_path.as_deref()).await?;
    info!("💾 Storage initialized (using {})", cli.storage);

    match &cli.command {
        Commands::Digest => {
            let pipeline = build_pipeline(&cli, store, config)?;
            let report = pipeline.run(&Shutdown::new()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Run { interval, listen } => {
            let pipeline = Arc::new(build_pipeline(&cli, store, config)?);
            let shutdown = Shutdown::new();

            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, shutting down");
                    signal.trigger();
                }
            });

            let server = listen.map(|addr| {
                let state = AppState::new(pipeline.clone(), shutdown.clone());
                tokio::spawn(hd_web::serve(state, addr))
            });

            run_scheduler(pipeline, interval.0, shutdown.clone()).await;

            if let Some(server) = server {
                shutdown.trigger();
                server.await??;
            }
        }
        Commands::React { message_id, reaction } => {
            let processor = ReactionProcessor::new(store, &config);
            let reaction = reaction.clone().unwrap_or_else(|| processor.positive_reaction().to_string());
            let outcome = processor.handle(*message_id, &reaction).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Prefs => {
            let preferences = hd_digest::PreferenceModel::new(store);
            let weights = preferences.ranked().await?;
            if weights.is_empty() {
                println!("No preferences learned yet");
            }
            for weight in weights {
                println!("{:<32} {:>8.3} {:>6}", weight.tag, weight.weight, weight.occurrences);
            }
        }
        Commands::Settings { command } => match command {
            SettingsCommands::Get { key } => match store.get_setting(key).await? {
                Some(value) => println!("{}", value),
                None => anyhow::bail!("Setting '{}' is not set", key),
            },
            SettingsCommands::Set { key, value } => {
                validate_setting(key, value)?;
                store.set_setting(key, value).await?;
                info!("Setting {} updated", key);
            }
        },
    }

    Ok(())
}
