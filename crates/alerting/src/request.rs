//! Alert requests handed to notification transports

use dms::{EyeState, FatigueEvent, Timestamp, YawnState};
use serde::{Deserialize, Serialize};

use crate::AlertError;

/// Person notified when drowsiness escalates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl EmergencyContact {
    /// A contact needs a name and at least one way to reach them
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.name.trim().is_empty() || (self.phone().is_none() && self.email().is_none()) {
            return Err(AlertError::IncompleteContact);
        }
        Ok(())
    }

    /// Phone number, if non-blank
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }

    /// Email address, if non-blank
    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// What the alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Local alarm for a confirmed drowsy episode
    DrowsinessAlarm,
    /// Local alarm for a confirmed yawn
    YawnAlarm,
    /// Remote notification of the emergency contact
    Emergency,
    /// Eyes reopened; stop the drowsiness alarm
    DrowsinessCleared,
    /// Yawn ended; stop the yawn alarm
    YawnCleared,
}

/// One request for a notification side effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub kind: AlertKind,
    pub contact: Option<EmergencyContact>,
    /// Manually triggered test; not counted as a real emergency
    pub test: bool,
    /// Session-relative for engine events. Test alerts raised outside a
    /// session carry milliseconds since the Unix epoch.
    pub requested_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drowsy_ms: Option<u64>,
}

impl AlertRequest {
    /// Map an engine event to the request the transports act on
    pub fn from_event(event: &FatigueEvent, contact: Option<&EmergencyContact>) -> Self {
        let (kind, drowsy_ms) = match event {
            FatigueEvent::DrowsinessOnset { .. } => (AlertKind::DrowsinessAlarm, None),
            FatigueEvent::YawnOnset { .. } => (AlertKind::YawnAlarm, None),
            FatigueEvent::EmergencyRequested { drowsy_ms, .. } => (AlertKind::Emergency, Some(*drowsy_ms)),
        };

        Self {
            kind,
            contact: contact.cloned(),
            test: false,
            requested_at: event.at(),
            drowsy_ms,
        }
    }

    /// Test emergency sent on demand to check the contact details
    pub fn test_emergency(contact: &EmergencyContact, now: Timestamp) -> Result<Self, AlertError> {
        contact.validate()?;
        Ok(Self {
            kind: AlertKind::Emergency,
            contact: Some(contact.clone()),
            test: true,
            requested_at: now,
            drowsy_ms: None,
        })
    }

    /// Stop requests for alarms whose condition ended between two frames
    pub fn alarm_releases(
        before: (EyeState, YawnState),
        after: (EyeState, YawnState),
        at: Timestamp,
    ) -> Vec<Self> {
        let mut releases = Vec::new();
        if before.0 == EyeState::Closed && after.0 == EyeState::Open {
            releases.push(AlertKind::DrowsinessCleared);
        }
        if before.1 == YawnState::Yawning && after.1 == YawnState::Normal {
            releases.push(AlertKind::YawnCleared);
        }

        releases
            .into_iter()
            .map(|kind| Self {
                kind,
                contact: None,
                test: false,
                requested_at: at,
                drowsy_ms: None,
            })
            .collect()
    }

    pub fn subject(&self) -> &'static str {
        match self.kind {
            AlertKind::DrowsinessAlarm => "DROWSINESS ALERT!",
            AlertKind::YawnAlarm => "YAWN DETECTED!",
            AlertKind::Emergency => "DROWSINESS ALERT - Urgent!",
            AlertKind::DrowsinessCleared | AlertKind::YawnCleared => "ALARM STOPPED",
        }
    }

    /// Human-readable message body
    pub fn message(&self) -> String {
        let mut message = match self.kind {
            AlertKind::DrowsinessAlarm => "Drowsiness detected. Please stay alert.".to_string(),
            AlertKind::YawnAlarm => "Yawning detected. Consider taking a break.".to_string(),
            AlertKind::DrowsinessCleared => "Eyes open again.".to_string(),
            AlertKind::YawnCleared => "Yawn ended.".to_string(),
            AlertKind::Emergency => {
                let name = self
                    .contact
                    .as_ref()
                    .map(|c| c.name.trim())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Emergency contact");
                format!(
                    "EMERGENCY ALERT: {}, the driver/user has been detected as drowsy for an extended period.",
                    name
                )
            }
        };

        if self.test {
            message.push_str(" This is a TEST alert.");
        }
        message
    }
}
