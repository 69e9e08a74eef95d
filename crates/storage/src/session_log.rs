//! Session Log Implementation

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Days, NaiveDate, Utc};
use dms::{FatigueConfig, SessionSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::StorageError;

/// One persisted monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub drowsy_episodes: u32,
    pub yawn_episodes: u32,
    pub emergency_alerts: u32,
    #[serde(default)]
    pub frames_processed: u64,
    #[serde(default)]
    pub frames_without_face: u64,
    pub config: FatigueConfig,
}

impl SessionRecord {
    /// Anchor an engine summary to the wall-clock time the session began
    pub fn from_summary(summary: &SessionSummary, started_at: DateTime<Utc>) -> Self {
        let elapsed = chrono::Duration::milliseconds(i64::try_from(summary.duration_ms).unwrap_or(i64::MAX));
        let ended_at = started_at.checked_add_signed(elapsed).unwrap_or(started_at);

        Self {
            id: Uuid::new_v4(),
            started_at,
            ended_at,
            duration_secs: summary.duration_ms / 1000,
            drowsy_episodes: summary.drowsy_episodes,
            yawn_episodes: summary.yawn_episodes,
            emergency_alerts: summary.emergency_alerts,
            frames_processed: summary.frames_processed,
            frames_without_face: summary.frames_without_face,
            config: summary.config.clone(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}

/// Totals over the sessions of the last seven days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub session_count: usize,
    pub total_drowsy_episodes: u64,
    pub total_yawn_episodes: u64,
    pub total_emergency_alerts: u64,
    pub avg_drowsy_per_session: f64,
    pub avg_yawns_per_session: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogFile {
    sessions: Vec<SessionRecord>,
}

/// Historical session log backed by a JSON file
pub struct SessionLog {
    path: PathBuf,
    data: LogFile,
}

impl SessionLog {
    /// Load the log; a missing or unreadable file starts an empty log
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Session log {} is corrupt, starting empty: {}", path.display(), e);
                LogFile::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session log at {}, starting empty", path.display());
                LogFile::default()
            }
            Err(e) => {
                warn!("Failed to read session log {}: {}", path.display(), e);
                LogFile::default()
            }
        };

        info!("Opened session log {} ({} sessions)", path.display(), data.sessions.len());
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.data.sessions
    }

    /// Append a session and persist the log
    pub fn add_session(&mut self, record: SessionRecord) -> Result<(), StorageError> {
        debug!("Adding session {} to log", record.id);
        self.data.sessions.push(record);
        self.save()
    }

    /// Write the log to disk
    pub fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    /// Summary of sessions dated within seven days up to `today`
    pub fn weekly_summary(&self, today: NaiveDate) -> Option<WeeklySummary> {
        let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN);
        let weekly: Vec<&SessionRecord> = self
            .data
            .sessions
            .iter()
            .filter(|s| (week_ago..=today).contains(&s.date()))
            .collect();

        if weekly.is_empty() {
            return None;
        }

        let count = weekly.len();
        let total_drowsy: u64 = weekly.iter().map(|s| u64::from(s.drowsy_episodes)).sum();
        let total_yawns: u64 = weekly.iter().map(|s| u64::from(s.yawn_episodes)).sum();
        let total_alerts: u64 = weekly.iter().map(|s| u64::from(s.emergency_alerts)).sum();

        Some(WeeklySummary {
            session_count: count,
            total_drowsy_episodes: total_drowsy,
            total_yawn_episodes: total_yawns,
            total_emergency_alerts: total_alerts,
            avg_drowsy_per_session: total_drowsy as f64 / count as f64,
            avg_yawns_per_session: total_yawns as f64 / count as f64,
        })
    }

    /// Average drowsy episodes per session over the whole log
    pub fn avg_drowsy_per_session(&self) -> Option<f64> {
        let sessions = &self.data.sessions;
        if sessions.is_empty() {
            return None;
        }
        let total: u64 = sessions.iter().map(|s| u64::from(s.drowsy_episodes)).sum();
        Some(total as f64 / sessions.len() as f64)
    }
}
