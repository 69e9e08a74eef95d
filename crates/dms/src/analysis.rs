//! Per-frame classification results and fatigue events

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::Timestamp;

/// Debounced eye state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyeState {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for EyeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeState::Open => f.write_str("OPEN"),
            EyeState::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Debounced mouth state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YawnState {
    #[default]
    Normal,
    Yawning,
}

impl fmt::Display for YawnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YawnState::Normal => f.write_str("NORMAL"),
            YawnState::Yawning => f.write_str("YAWNING"),
        }
    }
}

/// Side effects requested by the engine. The caller dispatches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatigueEvent {
    /// A drowsy episode was just confirmed
    DrowsinessOnset { at: Timestamp, episode: u32 },

    /// A yawn episode was just confirmed
    YawnOnset { at: Timestamp, episode: u32 },

    /// Drowsiness outlasted the emergency timeout; fired once per episode
    EmergencyRequested {
        at: Timestamp,
        episode_started_at: Timestamp,
        drowsy_ms: u64,
    },
}

impl FatigueEvent {
    pub fn at(&self) -> Timestamp {
        match self {
            FatigueEvent::DrowsinessOnset { at, .. }
            | FatigueEvent::YawnOnset { at, .. }
            | FatigueEvent::EmergencyRequested { at, .. } => *at,
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, FatigueEvent::EmergencyRequested { .. })
    }
}

/// Complete classification of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameClassification {
    pub eye_state: EyeState,
    pub yawn_state: YawnState,

    /// Mean eye aspect ratio of both eyes
    pub ear: f64,

    /// Inner-lip opening (pixels)
    pub mouth_opening: f64,

    /// Consecutive frames with eyes below the EAR threshold
    pub eye_closed_frames: u32,

    /// Consecutive frames with the mouth above the yawn threshold
    pub yawn_frames: u32,

    /// First frame of a newly confirmed drowsy episode
    pub drowsy_onset: bool,

    /// First frame of a newly confirmed yawn episode
    pub yawn_onset: bool,

    /// Emergency escalation fired on this frame
    pub emergency_requested: bool,

    /// Length of the current drowsy episode so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drowsy_ms: Option<u64>,

    /// Events emitted on this frame
    pub events: Vec<FatigueEvent>,
}

impl FrameClassification {
    /// Check if any events fired on this frame
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get the most urgent event
    pub fn most_urgent_event(&self) -> Option<FatigueEvent> {
        // Priority: Emergency > Drowsiness > Yawn
        self.events
            .iter()
            .find(|e| e.is_emergency())
            .or_else(|| {
                self.events
                    .iter()
                    .find(|e| matches!(e, FatigueEvent::DrowsinessOnset { .. }))
            })
            .or_else(|| self.events.first())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(EyeState::Closed.to_string(), "CLOSED");
        assert_eq!(YawnState::Normal.to_string(), "NORMAL");
    }

    #[test]
    fn test_most_urgent_event() {
        let t = Timestamp::from_secs(20);
        let classification = FrameClassification {
            events: vec![
                FatigueEvent::YawnOnset { at: t, episode: 1 },
                FatigueEvent::EmergencyRequested {
                    at: t,
                    episode_started_at: Timestamp::from_secs(4),
                    drowsy_ms: 16_000,
                },
            ],
            ..Default::default()
        };

        assert!(classification.has_events());
        assert!(classification.most_urgent_event().unwrap().is_emergency());
        assert!(FrameClassification::default().most_urgent_event().is_none());
    }
}
