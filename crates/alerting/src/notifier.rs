//! Notification transports
//!
//! Delivery is simulated by logging. A real transport implements
//! [`Notifier`] and is registered with the dispatcher.

use tracing::{info, warn};

use crate::request::{AlertKind, AlertRequest};
use crate::AlertError;

/// Sink for alert requests. Called from a blocking worker thread.
pub trait Notifier: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Whether this transport handles the request at all
    fn accepts(&self, request: &AlertRequest) -> bool;

    fn deliver(&self, request: &AlertRequest) -> Result<(), AlertError>;
}

fn email_of(request: &AlertRequest) -> Option<&str> {
    request.contact.as_ref().and_then(|c| c.email())
}

fn phone_of(request: &AlertRequest) -> Option<&str> {
    request.contact.as_ref().and_then(|c| c.phone())
}

/// Email to the emergency contact
#[derive(Debug, Default)]
pub struct EmailNotifier;

impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn accepts(&self, request: &AlertRequest) -> bool {
        request.kind == AlertKind::Emergency && email_of(request).is_some()
    }

    fn deliver(&self, request: &AlertRequest) -> Result<(), AlertError> {
        let recipient = email_of(request).ok_or(AlertError::MissingAddress("email"))?;

        info!(
            recipient,
            subject = request.subject(),
            test = request.test,
            "Sending email: {}",
            request.message()
        );
        Ok(())
    }
}

/// SMS to the emergency contact
#[derive(Debug, Default)]
pub struct SmsNotifier;

impl Notifier for SmsNotifier {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn accepts(&self, request: &AlertRequest) -> bool {
        request.kind == AlertKind::Emergency && phone_of(request).is_some()
    }

    fn deliver(&self, request: &AlertRequest) -> Result<(), AlertError> {
        let recipient = phone_of(request).ok_or(AlertError::MissingAddress("phone"))?;

        info!(recipient, test = request.test, "Sending SMS: {}", request.message());
        Ok(())
    }
}

/// Local audible alarm
#[derive(Debug, Default)]
pub struct AlarmNotifier;

impl Notifier for AlarmNotifier {
    fn name(&self) -> &'static str {
        "alarm"
    }

    fn accepts(&self, request: &AlertRequest) -> bool {
        matches!(
            request.kind,
            AlertKind::DrowsinessAlarm
                | AlertKind::YawnAlarm
                | AlertKind::DrowsinessCleared
                | AlertKind::YawnCleared
        )
    }

    fn deliver(&self, request: &AlertRequest) -> Result<(), AlertError> {
        match request.kind {
            AlertKind::DrowsinessCleared | AlertKind::YawnCleared => {
                info!(kind = ?request.kind, "{}", request.message());
            }
            _ => warn!(kind = ?request.kind, "{}", request.subject()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::EmergencyContact;
    use dms::Timestamp;

    fn emergency(contact: EmergencyContact) -> AlertRequest {
        AlertRequest {
            kind: AlertKind::Emergency,
            contact: Some(contact),
            test: false,
            requested_at: Timestamp::from_secs(16),
            drowsy_ms: Some(16_000),
        }
    }

    #[test]
    fn test_routing() {
        let request = emergency(EmergencyContact {
            name: "Dana".to_string(),
            phone: None,
            email: Some("dana@example.com".to_string()),
        });
        assert!(EmailNotifier.accepts(&request));
        assert!(!SmsNotifier.accepts(&request));
        assert!(!AlarmNotifier.accepts(&request));

        let alarm = AlertRequest {
            kind: AlertKind::YawnAlarm,
            ..request
        };
        assert!(AlarmNotifier.accepts(&alarm));
        assert!(!EmailNotifier.accepts(&alarm));

        let release = AlertRequest {
            kind: AlertKind::DrowsinessCleared,
            ..alarm
        };
        assert!(AlarmNotifier.accepts(&release));
        assert!(!SmsNotifier.accepts(&release));
        assert!(AlarmNotifier.deliver(&release).is_ok());
    }

    #[test]
    fn test_missing_address() {
        let request = emergency(EmergencyContact {
            name: "Dana".to_string(),
            phone: Some("+15550100".to_string()),
            email: None,
        });

        assert!(SmsNotifier.deliver(&request).is_ok());
        assert!(matches!(
            EmailNotifier.deliver(&request),
            Err(AlertError::MissingAddress("email"))
        ));
    }
}
