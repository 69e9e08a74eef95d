//! Fatigue Monitor
//!
//! Drives the fatigue engine from a landmark stream, dispatches alerts,
//! and persists session history.

pub mod session;
pub mod settings;
pub mod source;

pub use session::{default_notifiers, run_session, usable_contact, SessionOutcome};
pub use settings::{load_settings, MonitorSettings};
pub use source::{FrameInput, JsonLinesSource, LandmarkSource, SourceError, VecSource};

use chrono::{DateTime, Utc};
use dms::Timestamp;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Serve Prometheus metrics if an address is configured
pub fn init_metrics(settings: &MonitorSettings) {
    let Some(addr) = settings.metrics_addr else {
        return;
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => info!("Metrics exporter listening on {}", addr),
        Err(e) => warn!("Failed to start metrics exporter: {}", e),
    }
}

/// Wall-clock time in milliseconds since the Unix epoch, for alerts raised
/// outside a session
pub fn wall_clock(now: DateTime<Utc>) -> Timestamp {
    Timestamp::from_millis(u64::try_from(now.timestamp_millis()).unwrap_or(0))
}
