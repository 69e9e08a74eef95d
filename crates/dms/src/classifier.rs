//! Debounced signal classification
//!
//! Each signal runs a two-state machine (Inactive, Active). Entering Active
//! takes `min_frames` consecutive qualifying frames; a single disqualifying
//! frame drops straight back to Inactive with the run length cleared.

use serde::{Deserialize, Serialize};

/// Per-frame result of a [`SignalClassifier`] update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalOutput {
    /// Debounced state after this frame
    pub active: bool,
    /// Consecutive qualifying frames so far
    pub run_length: u32,
    /// Active now and inactive on the previous frame
    pub became_active: bool,
}

/// Run-length debouncer for one signal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalClassifier {
    run_length: u32,
    active: bool,
}

impl SignalClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation
    pub fn update(&mut self, qualifying: bool, min_frames: u32) -> SignalOutput {
        let was_active = self.active;

        if qualifying {
            self.run_length = self.run_length.saturating_add(1);
            if self.run_length >= min_frames {
                self.active = true;
            }
        } else {
            self.run_length = 0;
            self.active = false;
        }

        SignalOutput {
            active: self.active,
            run_length: self.run_length,
            became_active: self.active && !was_active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn run_length(&self) -> u32 {
        self.run_length
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Eyes qualify as closed below the EAR threshold
pub fn eye_closed(ear: f64, threshold: f64) -> bool {
    ear < threshold
}

/// Mouth qualifies as yawning above the opening threshold
pub fn mouth_yawning(mod_px: f64, threshold: f64) -> bool {
    mod_px > threshold
}
