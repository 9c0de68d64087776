//! CLI entry point for the station announcer.
//!
//! Runs the HTTP server, or performs a single arrivals lookup or
//! announcement from the command line.

use actix_web::{App, HttpServer, web};
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use station_announcer::{
    announce,
    arrivals::Direction,
    config::Config,
    delivery::{CastGatewaySink, DeliverySink, UnconfiguredSink, spawn_delivery},
    fetch::{BasicClient, auth::ApiKey},
    output::{append_records, log_arrivals},
    pipeline::{FeedFetcher, HttpFeedFetcher, collect_arrivals},
    server::{AppState, routes},
    smarthome::{DisabledPlatform, HttpSwitchPlatform, SwitchPlatform},
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "station_announcer")]
#[command(about = "Real-time subway arrivals for one station, spoken on demand", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Fetch the feeds once and log upcoming arrivals
    Arrivals {
        /// CSV file to append the arrivals to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Compose an announcement and play it on the configured device
    Announce {
        /// Only announce trains going this way (uptown or downtown)
        #[arg(short, long)]
        direction: Option<Direction>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/station_announcer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("station_announcer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::Arrivals { output } => {
            let fetcher = build_fetcher(&config)?;
            let arrivals =
                collect_arrivals(fetcher, &config.sources, &config.station.id, Utc::now()).await?;

            log_arrivals(&config.station.name, &arrivals);
            if let Some(path) = output {
                append_records(&path, &arrivals)?;
                info!(path, rows = arrivals.len(), "Arrivals written");
            }
        }
        Commands::Announce { direction } => {
            let fetcher = build_fetcher(&config)?;
            let arrivals =
                collect_arrivals(fetcher, &config.sources, &config.station.id, Utc::now()).await?;
            let tags: Vec<&str> = config.sources.iter().map(|s| s.tag.as_str()).collect();
            let message =
                announce::compose(&arrivals, &tags, direction, &config.station.spoken_name);

            // Nothing to answer here, so wait for playback to finish.
            spawn_delivery(build_sink(&config)?, message).await?;
        }
    }

    Ok(())
}

#[tracing::instrument(skip_all, fields(addr = %config.bind_addr, port = config.port))]
async fn serve(config: Config) -> Result<()> {
    let fetcher = build_fetcher(&config)?;
    let sink = build_sink(&config)?;
    let platform = build_platform(&config)?;

    info!(
        station = %config.station.id,
        sources = config.sources.len(),
        devices = config.devices.len(),
        "Starting server"
    );

    let bind = (config.bind_addr.clone(), config.port);
    let state = web::Data::new(AppState::new(config, fetcher, sink, platform));

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(bind)?
        .run()
        .await?;

    Ok(())
}

fn build_fetcher(config: &Config) -> Result<Arc<dyn FeedFetcher>> {
    let fetcher: Arc<dyn FeedFetcher> = match &config.feed_api_key {
        Some(key) => Arc::new(HttpFeedFetcher::new(ApiKey::new(
            BasicClient::new(),
            "x-api-key",
            key,
        )?)),
        None => Arc::new(HttpFeedFetcher::new(BasicClient::new())),
    };
    Ok(fetcher)
}

fn build_sink(config: &Config) -> Result<Arc<dyn DeliverySink>> {
    let sink: Arc<dyn DeliverySink> = match &config.device_addr {
        Some(addr) => Arc::new(CastGatewaySink::new(
            config.cast_gateway_url.clone(),
            addr.clone(),
            config.tts.clone(),
        )?),
        None => {
            error!("GOOGLE_HOME_IP not set, announcements will not play");
            Arc::new(UnconfiguredSink)
        }
    };
    Ok(sink)
}

fn build_platform(config: &Config) -> Result<Arc<dyn SwitchPlatform>> {
    let platform: Arc<dyn SwitchPlatform> =
        match (&config.smart_home_api_url, &config.smart_home_api_key) {
            (Some(url), Some(key)) => Arc::new(HttpSwitchPlatform::new(
                ApiKey::bearer(BasicClient::new(), key)?,
                url.clone(),
            )),
            _ => {
                if !config.devices.is_empty() {
                    warn!("Smart-home API not configured, switches will not be reset");
                }
                Arc::new(DisabledPlatform)
            }
        };
    Ok(platform)
}
