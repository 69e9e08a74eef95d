//! Episode counting and emergency escalation

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::FatigueEvent;
use crate::classifier::SignalOutput;
use crate::state::Timestamp;

/// Result of one tracker step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerOutput {
    pub events: Vec<FatigueEvent>,
    /// Elapsed time of the drowsy episode in progress
    pub drowsy_for: Option<Duration>,
}

/// Episode counters and the escalation timer for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationState {
    episode_started_at: Option<Timestamp>,
    emergency_triggered: bool,
    drowsy_episodes: u32,
    yawn_episodes: u32,
    emergency_alerts: u32,
    last_alert_at: Option<Timestamp>,
}

impl EscalationState {
    /// Advance on one frame's debounced eye and yawn outputs
    pub fn update(
        &mut self,
        eye: SignalOutput,
        yawn: SignalOutput,
        emergency_timeout_seconds: f64,
        now: Timestamp,
    ) -> TrackerOutput {
        let mut out = TrackerOutput::default();

        if eye.became_active {
            self.drowsy_episodes += 1;
            self.episode_started_at = Some(now);
            self.emergency_triggered = false;
            self.last_alert_at = Some(now);
            info!(episode = self.drowsy_episodes, at_ms = now.as_millis(), "Drowsiness detected");
            out.events.push(FatigueEvent::DrowsinessOnset {
                at: now,
                episode: self.drowsy_episodes,
            });
        }

        if eye.active {
            if let Some(started) = self.episode_started_at {
                let elapsed = now.saturating_duration_since(started);
                out.drowsy_for = Some(elapsed);

                if !self.emergency_triggered && elapsed.as_secs_f64() > emergency_timeout_seconds {
                    self.emergency_triggered = true;
                    self.emergency_alerts += 1;
                    self.last_alert_at = Some(now);
                    warn!(
                        episode = self.drowsy_episodes,
                        drowsy_ms = elapsed.as_millis() as u64,
                        "Drowsiness exceeded emergency timeout, requesting escalation"
                    );
                    out.events.push(FatigueEvent::EmergencyRequested {
                        at: now,
                        episode_started_at: started,
                        drowsy_ms: elapsed.as_millis() as u64,
                    });
                }
            }
        } else {
            self.episode_started_at = None;
            self.emergency_triggered = false;
        }

        if yawn.became_active {
            self.yawn_episodes += 1;
            self.last_alert_at = Some(now);
            info!(episode = self.yawn_episodes, at_ms = now.as_millis(), "Yawn detected");
            out.events.push(FatigueEvent::YawnOnset {
                at: now,
                episode: self.yawn_episodes,
            });
        }

        out
    }

    pub fn episode_started_at(&self) -> Option<Timestamp> {
        self.episode_started_at
    }

    pub fn emergency_triggered(&self) -> bool {
        self.emergency_triggered
    }

    pub fn drowsy_episodes(&self) -> u32 {
        self.drowsy_episodes
    }

    pub fn yawn_episodes(&self) -> u32 {
        self.yawn_episodes
    }

    pub fn emergency_alerts(&self) -> u32 {
        self.emergency_alerts
    }

    pub fn last_alert_at(&self) -> Option<Timestamp> {
        self.last_alert_at
    }
}
