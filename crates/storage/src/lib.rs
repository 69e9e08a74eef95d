//! Storage Layer
//!
//! Persists finished monitoring sessions to a JSON session log and
//! renders session and long-term fatigue reports.

mod report;
mod session_log;

pub use report::{
    format_duration, render_analysis_report, render_session_report, write_analysis_report,
    write_session_report,
};
pub use session_log::{SessionLog, SessionRecord, WeeklySummary};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
