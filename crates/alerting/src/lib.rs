//! Alerting System
//!
//! Turns fatigue events into alert requests and delivers them to local
//! alarms and the emergency contact without blocking frame processing.

mod dispatcher;
mod notifier;
mod request;

pub use dispatcher::{AlertDispatcher, DispatchStats};
pub use notifier::{AlarmNotifier, EmailNotifier, Notifier, SmsNotifier};
pub use request::{AlertKind, AlertRequest, EmergencyContact};

use thiserror::Error;

/// Alerting errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Emergency contact needs a name and a phone number or email")]
    IncompleteContact,

    #[error("Contact has no {0} address")]
    MissingAddress(&'static str),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Alert dispatcher is closed")]
    DispatcherClosed,
}
