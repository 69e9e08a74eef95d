//! Fatigue Monitor - Main Entry Point
//!
//! Usage:
//!   fatigue-monitor [LANDMARKS.jsonl]   run a session over a landmark stream
//!   fatigue-monitor report              write the long-term analysis report
//!   fatigue-monitor test-contact        send a test emergency alert
//!
//! `FATIGUE_SETTINGS` points at a settings file; otherwise
//! `fatigue-monitor.{toml,json,yaml}` is used when present.

use std::path::PathBuf;

use alerting::{AlertDispatcher, AlertRequest};
use anyhow::Context;
use chrono::Utc;
use monitor::{
    default_notifiers, init_logging, init_metrics, load_settings, run_session, usable_contact,
    wall_clock, JsonLinesSource, MonitorSettings,
};
use storage::SessionLog;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Fatigue Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings_file = std::env::var_os("FATIGUE_SETTINGS").map(PathBuf::from);
    let settings = load_settings(settings_file.as_deref()).context("failed to load settings")?;
    init_metrics(&settings);

    match std::env::args().nth(1).as_deref() {
        Some("report") => write_report(&settings),
        Some("test-contact") => test_contact(&settings).await,
        Some(path) => monitor_stream(&settings, PathBuf::from(path)).await,
        None => monitor_stream(&settings, settings.landmark_source.clone()).await,
    }
}

async fn monitor_stream(settings: &MonitorSettings, path: PathBuf) -> anyhow::Result<()> {
    info!("Reading landmarks from {}", path.display());
    let source = JsonLinesSource::open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let outcome = run_session(settings, source, default_notifiers()).await?;
    info!(
        "Session finished: {} drowsy episodes, {} yawns, {} emergency alerts; report at {}",
        outcome.summary.drowsy_episodes,
        outcome.summary.yawn_episodes,
        outcome.summary.emergency_alerts,
        outcome.report_path.display()
    );

    match outcome.stream_error {
        Some(e) => Err(e.context(format!("session over {} ended early", path.display()))),
        None => Ok(()),
    }
}

fn write_report(settings: &MonitorSettings) -> anyhow::Result<()> {
    let log = SessionLog::open(&settings.session_log);
    if storage::write_analysis_report(&log, &settings.analysis_report, Utc::now())? {
        info!("Analysis report written to {}", settings.analysis_report.display());
    } else {
        info!("No session data available for analysis.");
    }
    Ok(())
}

async fn test_contact(settings: &MonitorSettings) -> anyhow::Result<()> {
    let contact = usable_contact(settings).context("no usable emergency contact configured")?;
    let request = AlertRequest::test_emergency(&contact, wall_clock(Utc::now()))?;

    let dispatcher = AlertDispatcher::spawn(default_notifiers());
    dispatcher.dispatch(request)?;
    let stats = dispatcher.shutdown().await;

    anyhow::ensure!(stats.failed == 0, "test alert failed on {} transport(s)", stats.failed);
    info!("Test alert sent via {} transport(s)", stats.delivered);
    Ok(())
}
