use digit_stats::{FeedConfig, Supervisor, WsConnector};
use rustls::crypto::ring::default_provider;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default period of the status and opportunity report.
const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let _ = default_provider().install_default();

    // Initialize logging
    init_logging();

    let config = FeedConfig::from_env();
    info!(
        url = %config.url,
        channels = ?config.channels,
        history = config.history_capacity,
        windows = ?config.windows.iter(),
        connect_timeout = ?config.connect_timeout,
        "starting digit-stats server"
    );

    let connector = WsConnector::new(config.url.clone());
    let supervisor = match Supervisor::new(config, connector) {
        Ok(supervisor) => supervisor,
        Err(error) => {
            error!(%error, "refusing to start");
            std::process::exit(1);
        }
    };

    let outcome = supervisor.start();
    info!(success = outcome.success, message = %outcome.message, "start");

    // Configurable via DIGIT_STATS_REPORT_SECS env var (default: 60)
    let report_interval = std::env::var("DIGIT_STATS_REPORT_SECS")
        .ok()
        .and_then(|secs| secs.parse().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_REPORT_INTERVAL);

    let mut report = tokio::time::interval(report_interval);
    // First tick completes immediately, nothing to report yet
    report.tick().await;

    loop {
        tokio::select! {
            _ = report.tick() => log_report(&supervisor),
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    warn!(%error, "failed to listen for shutdown signal");
                }
                break;
            }
        }
    }

    info!("shutting down");
    let outcome = supervisor.stop();
    info!(success = outcome.success, message = %outcome.message, "stop");
}

fn log_report(supervisor: &Supervisor) {
    let status = supervisor.status();
    info!(
        running = status.running,
        total_ticks = status.total_ticks,
        recent_activity = status.recent_activity_count,
        filter = %status.data_filter,
        "status"
    );
    for (channel, connection) in &status.connections {
        info!(
            %channel,
            state = %connection.state,
            ticks = connection.total_ticks,
            reconnect_attempts = connection.reconnect_attempts,
            "channel"
        );
    }

    let scan = supervisor.opportunities();
    if let Some(best) = &scan.best {
        info!(
            channel = %best.channel,
            window = best.window_len,
            win_rate = best.win_rate,
            entries = best.entries,
            signal = %best.signal,
            "best window"
        );
    }
    if let Some(worst) = &scan.worst {
        info!(
            channel = %worst.channel,
            window = worst.window_len,
            win_rate = worst.win_rate,
            entries = worst.entries,
            signal = %worst.signal,
            "worst window"
        );
    }

    match serde_json::to_string(&supervisor.filtered_results()) {
        Ok(results) => debug!(%results, "results"),
        Err(error) => warn!(%error, "failed to serialise results"),
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Set LOG_FORMAT=json for machine readable output
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
