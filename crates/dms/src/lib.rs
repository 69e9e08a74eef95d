//! Driver Monitoring System (DMS)
//!
//! Fatigue classification from facial landmarks:
//! - Eye aspect ratio and mouth opening from landmark geometry
//! - Debounced eye-closure and yawn detection
//! - Drowsy and yawn episode counting
//! - One-shot emergency escalation for prolonged drowsiness
//!
//! The engine is synchronous and never reads the clock: every call takes
//! an explicit `now`. Side effects are returned as [`FatigueEvent`]s for
//! the caller to dispatch.

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod geometry;
pub mod landmarks;
pub mod state;
pub mod tracker;

pub use analysis::{EyeState, FatigueEvent, FrameClassification, YawnState};
pub use classifier::{SignalClassifier, SignalOutput};
pub use config::FatigueConfig;
pub use landmarks::{LandmarkSet, Point};
pub use state::{EngineState, SessionSummary, Timestamp};
pub use tracker::EscalationState;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Invalid landmark set ({region}): {reason}")]
    InvalidLandmarkSet { region: &'static str, reason: String },

    #[error("{field} value {value} is out of range [{min}, {max}]")]
    ConfigurationOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Begin a monitoring session
pub fn start_session(now: Timestamp) -> EngineState {
    debug!(at_ms = now.as_millis(), "Starting monitoring session");
    EngineState::new(now)
}

/// Classify one frame's landmarks and advance the session state.
///
/// An out-of-range `config` is rejected before any state is touched.
pub fn classify(
    landmarks: &LandmarkSet,
    config: &FatigueConfig,
    state: &mut EngineState,
    now: Timestamp,
) -> Result<FrameClassification, DmsError> {
    config.validate()?;

    let ear = geometry::frame_ear(landmarks);
    let mouth_opening = geometry::mouth_opening_distance(landmarks.mouth());

    let eye = state.eye.update(
        classifier::eye_closed(ear, config.ear_threshold),
        config.ear_min_frames,
    );
    let yawn = state.yawn.update(
        classifier::mouth_yawning(mouth_opening, config.yawn_threshold),
        config.yawn_min_frames,
    );
    let tracked = state
        .escalation
        .update(eye, yawn, config.emergency_timeout_seconds, now);
    state.frames_processed += 1;

    trace!(ear, mouth_opening, eye_run = eye.run_length, yawn_run = yawn.run_length, "Frame classified");

    Ok(FrameClassification {
        eye_state: if eye.active { EyeState::Closed } else { EyeState::Open },
        yawn_state: if yawn.active { YawnState::Yawning } else { YawnState::Normal },
        ear,
        mouth_opening,
        eye_closed_frames: eye.run_length,
        yawn_frames: yawn.run_length,
        drowsy_onset: eye.became_active,
        yawn_onset: yawn.became_active,
        emergency_requested: tracked.events.iter().any(FatigueEvent::is_emergency),
        drowsy_ms: tracked.drowsy_for.map(|d| d.as_millis() as u64),
        events: tracked.events,
    })
}

/// Note a frame where no face was detected.
///
/// Run lengths and timers are left as they are: a missing face is no
/// observation, not an open-eye observation.
pub fn record_missing_face(state: &mut EngineState) {
    state.frames_without_face += 1;
}

/// Close a session and produce its summary
pub fn end_session(state: EngineState, config: &FatigueConfig, now: Timestamp) -> SessionSummary {
    let ended_at = now.max(state.started_at);
    let escalation = &state.escalation;

    let summary = SessionSummary {
        started_at: state.started_at,
        ended_at,
        duration_ms: ended_at.as_millis() - state.started_at.as_millis(),
        drowsy_episodes: escalation.drowsy_episodes(),
        yawn_episodes: escalation.yawn_episodes(),
        emergency_alerts: escalation.emergency_alerts(),
        frames_processed: state.frames_processed,
        frames_without_face: state.frames_without_face,
        config: config.clone(),
    };

    info!(
        drowsy = summary.drowsy_episodes,
        yawns = summary.yawn_episodes,
        emergencies = summary.emergency_alerts,
        duration_ms = summary.duration_ms,
        "Monitoring session ended"
    );

    summary
}

/// Fatigue monitor owning the configuration and state of one session
#[derive(Debug, Clone)]
pub struct FatigueMonitor {
    config: FatigueConfig,
    state: EngineState,
}

impl FatigueMonitor {
    /// Create a monitor and start its session at `now`
    pub fn new(config: FatigueConfig, now: Timestamp) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            config,
            state: start_session(now),
        })
    }

    /// Process one frame; `None` means no face was detected
    pub fn observe(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        now: Timestamp,
    ) -> Result<Option<FrameClassification>, DmsError> {
        match landmarks {
            Some(landmarks) => classify(landmarks, &self.config, &mut self.state, now).map(Some),
            None => {
                record_missing_face(&mut self.state);
                Ok(None)
            }
        }
    }

    /// Process raw 68-point landmarks; malformed input leaves state untouched
    pub fn observe_face_68(
        &mut self,
        points: &[Point],
        now: Timestamp,
    ) -> Result<FrameClassification, DmsError> {
        let landmarks = LandmarkSet::from_face_68(points).map_err(|e| {
            warn!("Discarding frame: {}", e);
            e
        })?;
        classify(&landmarks, &self.config, &mut self.state, now)
    }

    /// Replace the configuration from the next frame on
    pub fn update_config(&mut self, config: FatigueConfig) -> Result<(), DmsError> {
        if let Err(e) = config.validate() {
            warn!("Rejected configuration update: {}", e);
            return Err(e);
        }
        info!("Fatigue configuration updated: {:?}", config);
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &FatigueConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// End the current session and start a fresh one at `now`
    pub fn restart(&mut self, now: Timestamp) -> SessionSummary {
        let previous = std::mem::replace(&mut self.state, start_session(now));
        end_session(previous, &self.config, now)
    }

    /// End the session
    pub fn finish(self, now: Timestamp) -> SessionSummary {
        end_session(self.state, &self.config, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{MOUTH_LOWER_INNER, MOUTH_POINTS, MOUTH_UPPER_INNER};

    fn eye_with_ear(ear: f64) -> Vec<Point> {
        // width 20, each vertical distance = ear * 20
        let h = ear * 20.0;
        vec![
            Point::new(0.0, 0.0),
            Point::new(7.0, -h / 2.0),
            Point::new(13.0, -h / 2.0),
            Point::new(20.0, 0.0),
            Point::new(13.0, h / 2.0),
            Point::new(7.0, h / 2.0),
        ]
    }

    fn face(ear: f64, mouth_px: f64) -> LandmarkSet {
        let mut mouth = vec![Point::new(0.0, 100.0); MOUTH_POINTS];
        mouth[MOUTH_UPPER_INNER] = Point::new(10.0, 100.0);
        mouth[MOUTH_LOWER_INNER] = Point::new(10.0, 100.0 + mouth_px);
        LandmarkSet::new(&eye_with_ear(ear), &eye_with_ear(ear), &mouth).unwrap()
    }

    fn config() -> FatigueConfig {
        FatigueConfig {
            ear_threshold: 0.25,
            ear_min_frames: 3,
            yawn_threshold: 30.0,
            yawn_min_frames: 2,
            emergency_timeout_seconds: 15.0,
        }
    }

    #[test]
    fn test_drowsy_then_open() {
        let config = config();
        let mut state = start_session(Timestamp::from_secs(0));

        for i in 1..=3u64 {
            let out = classify(&face(0.10, 5.0), &config, &mut state, Timestamp::from_millis(i * 33)).unwrap();
            assert!((out.ear - 0.10).abs() < 1e-9);
            if i < 3 {
                assert_eq!(out.eye_state, EyeState::Open);
            } else {
                assert_eq!(out.eye_state, EyeState::Closed);
                assert!(out.drowsy_onset);
            }
        }
        assert_eq!(state.escalation().drowsy_episodes(), 1);

        let out = classify(&face(0.30, 5.0), &config, &mut state, Timestamp::from_millis(132)).unwrap();
        assert_eq!(out.eye_state, EyeState::Open);
        assert_eq!(out.eye_closed_frames, 0);
        assert_eq!(state.escalation().drowsy_episodes(), 1);
    }

    #[test]
    fn test_invalid_config_leaves_state_untouched() {
        let bad = FatigueConfig {
            yawn_min_frames: 0,
            ..config()
        };
        let mut state = start_session(Timestamp::from_secs(0));
        let before = state.clone();

        let err = classify(&face(0.1, 40.0), &bad, &mut state, Timestamp::from_secs(1)).unwrap_err();
        assert!(matches!(err, DmsError::ConfigurationOutOfRange { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_missing_face_pauses_run() {
        let mut monitor = FatigueMonitor::new(config(), Timestamp::from_secs(0)).unwrap();
        let closed = face(0.10, 5.0);

        monitor.observe(Some(&closed), Timestamp::from_millis(33)).unwrap();
        monitor.observe(Some(&closed), Timestamp::from_millis(66)).unwrap();
        assert!(monitor.observe(None, Timestamp::from_millis(99)).unwrap().is_none());
        assert_eq!(monitor.state().eye().run_length(), 2);

        let out = monitor
            .observe(Some(&closed), Timestamp::from_millis(132))
            .unwrap()
            .unwrap();
        assert!(out.drowsy_onset);

        let summary = monitor.finish(Timestamp::from_secs(1));
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.frames_without_face, 1);
        assert_eq!(summary.drowsy_episodes, 1);
    }

    #[test]
    fn test_update_config_rejects_and_keeps_previous() {
        let mut monitor = FatigueMonitor::new(config(), Timestamp::from_secs(0)).unwrap();
        let bad = FatigueConfig {
            ear_threshold: 1.5,
            ..config()
        };
        assert!(monitor.update_config(bad).is_err());
        assert_eq!(monitor.config(), &config());

        let stricter = FatigueConfig {
            ear_min_frames: 1,
            ..config()
        };
        monitor.update_config(stricter).unwrap();
        let out = monitor
            .observe(Some(&face(0.1, 5.0)), Timestamp::from_millis(33))
            .unwrap()
            .unwrap();
        assert!(out.drowsy_onset);
    }

    #[test]
    fn test_observe_face_68_rejects_short_input() {
        let mut monitor = FatigueMonitor::new(config(), Timestamp::from_secs(0)).unwrap();
        let err = monitor
            .observe_face_68(&[Point::default(); 10], Timestamp::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, DmsError::InvalidLandmarkSet { region: "face", .. }));
        assert_eq!(monitor.state().frames_processed(), 0);
    }

    #[test]
    fn test_restart_returns_previous_summary() {
        let mut monitor = FatigueMonitor::new(config(), Timestamp::from_secs(0)).unwrap();
        for i in 1..=2u64 {
            monitor
                .observe(Some(&face(0.3, 50.0)), Timestamp::from_secs(i))
                .unwrap();
        }
        let summary = monitor.restart(Timestamp::from_secs(10));
        assert_eq!(summary.yawn_episodes, 1);
        assert_eq!(summary.duration_ms, 10_000);
        assert_eq!(monitor.state().started_at(), Timestamp::from_secs(10));
        assert_eq!(monitor.state().escalation().yawn_episodes(), 0);
    }
}
