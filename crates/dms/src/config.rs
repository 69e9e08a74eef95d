//! Fatigue detection configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Valid range for the eye-aspect-ratio cutoff (exclusive bounds)
pub const EAR_THRESHOLD_RANGE: (f64, f64) = (0.0, 1.0);

/// Valid range for the mouth-opening cutoff in pixels (exclusive bounds)
pub const YAWN_THRESHOLD_RANGE: (f64, f64) = (0.0, 1000.0);

/// Valid range for consecutive-frame minimums (inclusive)
pub const MIN_FRAMES_RANGE: (u32, u32) = (1, 1000);

/// Valid range for the emergency timeout in seconds (inclusive)
pub const EMERGENCY_TIMEOUT_RANGE: (f64, f64) = (0.0, 3600.0);

/// Fatigue detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    /// Eyes count as closed when the EAR drops below this value
    pub ear_threshold: f64,

    /// Consecutive closed-eye frames needed to confirm drowsiness
    pub ear_min_frames: u32,

    /// Mouth counts as open when the inner-lip distance exceeds this (pixels)
    pub yawn_threshold: f64,

    /// Consecutive open-mouth frames needed to confirm a yawn
    pub yawn_min_frames: u32,

    /// Continuous drowsiness before the emergency contact is notified (seconds)
    pub emergency_timeout_seconds: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            ear_min_frames: 20,
            yawn_threshold: 30.0,
            yawn_min_frames: 15,
            emergency_timeout_seconds: 15.0,
        }
    }
}

impl FatigueConfig {
    /// Create strict config (reacts sooner)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.28,
            ear_min_frames: 10,
            yawn_threshold: 25.0,
            yawn_min_frames: 8,
            emergency_timeout_seconds: 10.0,
        }
    }

    /// Create lenient config (fewer false alarms)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.20,
            ear_min_frames: 35,
            yawn_threshold: 35.0,
            yawn_min_frames: 25,
            emergency_timeout_seconds: 25.0,
        }
    }

    /// Check every field against its documented range
    pub fn validate(&self) -> Result<(), DmsError> {
        check_open("ear_threshold", self.ear_threshold, EAR_THRESHOLD_RANGE)?;
        check_frames("ear_min_frames", self.ear_min_frames)?;
        check_open("yawn_threshold", self.yawn_threshold, YAWN_THRESHOLD_RANGE)?;
        check_frames("yawn_min_frames", self.yawn_min_frames)?;

        let (min, max) = EMERGENCY_TIMEOUT_RANGE;
        let timeout = self.emergency_timeout_seconds;
        if !timeout.is_finite() || timeout < min || timeout > max {
            return Err(DmsError::ConfigurationOutOfRange {
                field: "emergency_timeout_seconds",
                value: timeout,
                min,
                max,
            });
        }

        Ok(())
    }
}

fn check_open(field: &'static str, value: f64, range: (f64, f64)) -> Result<(), DmsError> {
    if value.is_finite() && value > range.0 && value < range.1 {
        Ok(())
    } else {
        Err(DmsError::ConfigurationOutOfRange {
            field,
            value,
            min: range.0,
            max: range.1,
        })
    }
}

fn check_frames(field: &'static str, value: u32) -> Result<(), DmsError> {
    let (min, max) = MIN_FRAMES_RANGE;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DmsError::ConfigurationOutOfRange {
            field,
            value: f64::from(value),
            min: f64::from(min),
            max: f64::from(max),
        })
    }
}
