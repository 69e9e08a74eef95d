//! Session state tracking

use std::ops::Add;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::SignalClassifier;
use crate::config::FatigueConfig;
use crate::tracker::EscalationState;

/// Monotonic instant in milliseconds from a caller-chosen origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if the clock went backwards
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(ms))
    }
}

/// Per-session engine state, owned by a single frame consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub(crate) started_at: Timestamp,
    pub(crate) eye: SignalClassifier,
    pub(crate) yawn: SignalClassifier,
    pub(crate) escalation: EscalationState,
    pub(crate) frames_processed: u64,
    pub(crate) frames_without_face: u64,
}

impl EngineState {
    /// Zeroed state for a session starting at `now`
    pub fn new(now: Timestamp) -> Self {
        Self {
            started_at: now,
            eye: SignalClassifier::new(),
            yawn: SignalClassifier::new(),
            escalation: EscalationState::default(),
            frames_processed: 0,
            frames_without_face: 0,
        }
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn eye(&self) -> &SignalClassifier {
        &self.eye
    }

    pub fn yawn(&self) -> &SignalClassifier {
        &self.yawn
    }

    pub fn escalation(&self) -> &EscalationState {
        &self.escalation
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_without_face(&self) -> u64 {
        self.frames_without_face
    }
}

/// Counters for one finished monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub duration_ms: u64,
    pub drowsy_episodes: u32,
    pub yawn_episodes: u32,
    pub emergency_alerts: u32,
    pub frames_processed: u64,
    pub frames_without_face: u64,
    /// Configuration in effect when the session ended
    pub config: FatigueConfig,
}

impl SessionSummary {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Share of observed frames that contained a face
    pub fn face_coverage(&self) -> f64 {
        let total = self.frames_processed + self.frames_without_face;
        if total == 0 {
            return 0.0;
        }
        self.frames_processed as f64 / total as f64
    }
}
