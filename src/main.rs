mod analyzer;
mod config;
mod event_log;
mod model;
mod monitor;
mod notifier;
mod quote;
mod ui;
mod utils;

use analyzer::HeuristicEstimator;
use config::{AppConfig, load_config};
use event_log::{EventLog, Severity};
use monitor::{Monitor, MonitorState};
use notifier::DesktopNotifier;
use quote::AlphaVantageSource;
use std::sync::Arc;
use tracing::{error, info, warn};
use ui::ConsoleUi;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file; the monitor never refuses to start
    let config = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load error: {}. Using defaults.", e);
            AppConfig::default()
        }
    };
    info!(
        "Watching {} (poll every {}s, first check after {}s)",
        config.pair_symbol(),
        config.poll_interval_seconds,
        config.first_check_delay_seconds
    );

    let log = Arc::new(EventLog::new());
    log.log("System initialized", Severity::Info);

    let source = Arc::new(AlphaVantageSource::new(&config));
    let estimator = Arc::new(HeuristicEstimator::new());
    let notifier = Arc::new(DesktopNotifier::new(log.clone()));
    let ui = Arc::new(ConsoleUi);

    let monitor = Arc::new(Monitor::new(
        config,
        source,
        estimator,
        notifier,
        log.clone(),
        ui,
    ));

    monitor.start().await;

    if monitor.state().await == MonitorState::ActiveMonitoring {
        info!("⏳ Monitoring armed. Press Ctrl+C to stop.");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Signal handler error: {:?}", e);
        }
        monitor.stop().await;
    }

    if let Some(result) = monitor.last_result().await {
        info!(
            "Last prediction: {} ({}%) from {} data",
            result.direction, result.confidence, result.quote.source
        );
    }
    info!("Session log: {} events captured", log.entries().len());
}
