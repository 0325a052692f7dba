//! Sataako bot: rain alerts for a registered location.
//!
//! Single-binary Tokio application that:
//! 1. Loads configuration from config.toml, .env, and the environment
//! 2. Accepts conversation events from the console transport
//! 3. Polls the Sataako forecast service per registered location
//! 4. Sends one warning per upcoming rain shower and outage notices

mod config;
mod console;
mod conversation;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use common::config::BotConfig;
use rain_alerts::{AlertScheduler, AlertState, Interpreter, TokioTimer};
use sataako_client::{ForecastClient, RainMapClient};

use crate::console::ConsoleMessenger;
use crate::conversation::ConversationHandler;

/// Sataako rain alert bot
#[derive(Parser)]
#[command(name = "sataako-bot", about = "Rain alerts from the Sataako forecast service")]
struct Cli {
    /// Check the forecast once for LAT LON, print what would be sent, and exit.
    #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true)]
    once: Option<Vec<f64>>,
}

#[tokio::main]
async fn main() {
    // Initialize logging. Stdout belongs to the console transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sataako_bot=info,sataako_client=info,rain_alerts=info".into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Sataako bot starting up...");

    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Forecast service: {} (poll every {}s, timeout {}s, display tz {})",
        cfg.server_url,
        cfg.timing.query_interval_secs,
        cfg.timing.request_timeout_secs,
        cfg.display.timezone,
    );

    let timeout = Duration::from_secs(cfg.timing.request_timeout_secs);
    let (forecasts, interpreter) = match (
        ForecastClient::new(&cfg.server_url, timeout),
        Interpreter::from_config(&cfg.display),
    ) {
        (Ok(f), Ok(i)) => (f, i),
        (Err(e), _) | (_, Err(e)) => {
            error!("Initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    // ── Single-check mode ────────────────────────────────────────────
    if let Some(coords) = cli.once {
        let location = common::Location::new(coords[0], coords[1]);
        if !location.is_valid() {
            error!("Invalid location: {}, {}", coords[0], coords[1]);
            std::process::exit(1);
        }
        run_once(&forecasts, &interpreter, location).await;
        return;
    }

    let rain_map = match RainMapClient::new(
        &cfg.server_url,
        &cfg.rain_map.fallback_image_url,
        timeout,
    ) {
        Ok(r) => r,
        Err(e) => {
            error!("Initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    let handler = Arc::new(build_handler(&cfg, forecasts, interpreter, rain_map));

    info!("Sataako bot is running. Press Ctrl+C to stop.");
    let console_handle = tokio::spawn(console::run_console(handler.clone()));

    let shutdown_reason = tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl_c",
        r = console_handle => {
            match r {
                Ok(Ok(())) => "console_closed",
                Ok(Err(e)) => {
                    error!("Console transport failed: {}", e);
                    "console_error"
                }
                Err(e) => {
                    error!("Console task exited: {:?}", e);
                    "console_task_exit"
                }
            }
        }
    };

    handler.scheduler().stop_all();
    info!("Sataako bot shut down ({}).", shutdown_reason);
}

fn build_handler(
    cfg: &BotConfig,
    forecasts: ForecastClient,
    interpreter: Interpreter,
    rain_map: RainMapClient,
) -> ConversationHandler {
    let messenger = Arc::new(ConsoleMessenger);
    let scheduler = AlertScheduler::new(
        Arc::new(TokioTimer::new()),
        Arc::new(forecasts),
        messenger.clone(),
        interpreter,
    );
    ConversationHandler::new(
        scheduler,
        Arc::new(rain_map),
        messenger,
        Duration::from_secs(cfg.timing.query_interval_secs),
    )
}

async fn run_once(forecasts: &ForecastClient, interpreter: &Interpreter, location: common::Location) {
    let outcome = forecasts
        .fetch(&location)
        .await
        .map(|doc| interpreter.interpret(&doc));

    match &outcome {
        Ok(judgement) => info!(
            "Judgement: raining={:?} change_eta={:?} accumulation={:.1}mm",
            judgement.is_raining, judgement.change_eta, judgement.accumulation_mm
        ),
        Err(e) => error!("Forecast fetch failed: {}", e),
    }

    let (_, notifications) = AlertState::new().step(&outcome, location);
    for notification in notifications {
        println!("{notification}");
    }
}
