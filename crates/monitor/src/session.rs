//! Monitoring session loop
//!
//! A blocking reader feeds landmark frames through a bounded channel into
//! a single consumer that owns the [`FatigueMonitor`]. Engine events are
//! handed to the alert dispatcher without waiting on delivery.

use std::path::PathBuf;
use std::sync::Arc;

use alerting::{AlarmNotifier, AlertDispatcher, AlertRequest, DispatchStats, EmailNotifier, EmergencyContact, Notifier, SmsNotifier};
use anyhow::Context;
use chrono::Utc;
use dms::{DmsError, EyeState, FatigueMonitor, SessionSummary, Timestamp, YawnState};
use storage::{SessionLog, SessionRecord};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::settings::MonitorSettings;
use crate::source::{FrameInput, LandmarkSource, SourceError};

/// Everything produced by one monitoring run
#[derive(Debug)]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    pub record: SessionRecord,
    pub report_path: PathBuf,
    pub dispatch: DispatchStats,
    pub rejected_frames: u64,
    /// Why the stream stopped early; frames before it are still recorded
    pub stream_error: Option<anyhow::Error>,
}

/// Local alarms plus email and SMS to the emergency contact
pub fn default_notifiers() -> Vec<Arc<dyn Notifier>> {
    vec![
        Arc::new(AlarmNotifier),
        Arc::new(EmailNotifier),
        Arc::new(SmsNotifier),
    ]
}

/// Contact from settings, if complete
pub fn usable_contact(settings: &MonitorSettings) -> Option<EmergencyContact> {
    let contact = settings.contact.clone()?;
    match contact.validate() {
        Ok(()) => Some(contact),
        Err(e) => {
            warn!("Ignoring emergency contact: {}", e);
            None
        }
    }
}

/// Run one session over every frame of `source`
///
/// A failing source ends the session early. The frames seen so far are
/// still summarised and persisted, and queued alerts are delivered; the
/// failure is reported in [`SessionOutcome::stream_error`].
pub async fn run_session<S: LandmarkSource>(
    settings: &MonitorSettings,
    source: S,
    notifiers: Vec<Arc<dyn Notifier>>,
) -> anyhow::Result<SessionOutcome> {
    let wall_start = Utc::now();
    let contact = usable_contact(settings);
    let mut monitor = FatigueMonitor::new(settings.detection.clone(), Timestamp::from_millis(0))
        .context("invalid detection settings")?;
    let dispatcher = AlertDispatcher::spawn(notifiers);
    let queue = |request: AlertRequest| {
        if let Err(e) = dispatcher.dispatch(request) {
            error!("Failed to queue alert: {}", e);
        }
    };

    let (tx, mut rx) = mpsc::channel::<FrameInput>(settings.frame_queue.max(1));
    let reader = tokio::task::spawn_blocking(move || read_frames(source, tx));

    info!("Monitoring started");
    let mut last = Timestamp::from_millis(0);
    let mut rejected_frames = 0u64;
    let mut alarms = (EyeState::Open, YawnState::Normal);
    let mut stream_error = None;

    while let Some(frame) = rx.recv().await {
        let now = Timestamp::from_millis(frame.t_ms);
        last = last.max(now);
        metrics::counter!("fatigue_frames_total").increment(1);

        let result = match frame.points() {
            Some(points) => monitor.observe_face_68(&points, now).map(Some),
            None => monitor.observe(None, now),
        };

        let classification = match result {
            Ok(Some(classification)) => classification,
            Ok(None) => {
                metrics::counter!("fatigue_frames_without_face_total").increment(1);
                continue;
            }
            Err(DmsError::InvalidLandmarkSet { .. }) => {
                rejected_frames += 1;
                metrics::counter!("fatigue_frames_rejected_total").increment(1);
                continue;
            }
            Err(e) => {
                error!("Stopping session: {}", e);
                stream_error = Some(anyhow::Error::new(e).context("frame classification failed"));
                break;
            }
        };

        debug!(
            eye = %classification.eye_state,
            yawn = %classification.yawn_state,
            ear = classification.ear,
            mouth = classification.mouth_opening,
            "Frame at {} ms",
            frame.t_ms
        );

        for event in &classification.events {
            metrics::counter!("fatigue_events_total").increment(1);
            queue(AlertRequest::from_event(event, contact.as_ref()));
        }

        let current = (classification.eye_state, classification.yawn_state);
        AlertRequest::alarm_releases(alarms, current, now)
            .into_iter()
            .for_each(&queue);
        alarms = current;
    }

    // unblocks the reader if the loop stopped first
    drop(rx);
    match reader.await {
        Ok(Ok(frames_read)) => debug!("Reader finished after {} frames", frames_read),
        Ok(Err(e)) => {
            error!("Landmark stream stopped: {}", e);
            stream_error.get_or_insert(anyhow::Error::new(e).context("landmark stream failed"));
        }
        Err(e) => {
            error!("Frame reader task failed: {}", e);
            stream_error.get_or_insert(anyhow::Error::new(e).context("frame reader task failed"));
        }
    }

    AlertRequest::alarm_releases(alarms, Default::default(), last)
        .into_iter()
        .for_each(&queue);
    let dispatch = dispatcher.shutdown().await;

    let summary = monitor.finish(last);
    let record = SessionRecord::from_summary(&summary, wall_start);

    let mut log = SessionLog::open(&settings.session_log);
    log.add_session(record.clone())
        .with_context(|| format!("failed to save session log {}", settings.session_log.display()))?;
    let report_path = storage::write_session_report(&settings.reports_dir, &record)
        .context("failed to write session report")?;

    Ok(SessionOutcome {
        summary,
        record,
        report_path,
        dispatch,
        rejected_frames,
        stream_error,
    })
}

fn read_frames<S: LandmarkSource>(mut source: S, tx: mpsc::Sender<FrameInput>) -> Result<u64, SourceError> {
    let mut count = 0u64;
    while let Some(frame) = source.next_frame()? {
        if tx.blocking_send(frame).is_err() {
            break;
        }
        count += 1;
    }
    Ok(count)
}
