//! Plain-text session and fatigue analysis reports

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::session_log::{SessionLog, SessionRecord};
use crate::StorageError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Average drowsy episodes per session above which sleep advice is given
pub const SLEEP_ADVICE_THRESHOLD: f64 = 5.0;

/// Average drowsy episodes per session above which medical advice is given
pub const MEDICAL_ADVICE_THRESHOLD: f64 = 10.0;

/// `HH:MM:SS`
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Report for one finished session
pub fn render_session_report(record: &SessionRecord) -> String {
    let config = &record.config;
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "===== DROWSINESS DETECTION SYSTEM - SESSION REPORT =====\n");
    let _ = writeln!(out, "Session Start: {}", record.started_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "Session End: {}", record.ended_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "Session Duration: {}\n", format_duration(record.duration_secs));
    let _ = writeln!(out, "Drowsy Episodes Detected: {}", record.drowsy_episodes);
    let _ = writeln!(out, "Yawn Episodes Detected: {}", record.yawn_episodes);
    let _ = writeln!(out, "Emergency Alerts Sent: {}\n", record.emergency_alerts);
    let _ = writeln!(out, "Settings Used:");
    let _ = writeln!(out, "- Eye Aspect Ratio Threshold: {}", config.ear_threshold);
    let _ = writeln!(out, "- Consecutive Frames for Drowsiness: {}", config.ear_min_frames);
    let _ = writeln!(out, "- Yawn Threshold: {}", config.yawn_threshold);
    let _ = writeln!(out, "- Consecutive Frames for Yawn: {}", config.yawn_min_frames);
    let _ = writeln!(
        out,
        "- Emergency Contact Timeout: {} seconds\n",
        config.emergency_timeout_seconds
    );
    let _ = writeln!(out, "===== END OF REPORT =====");
    out
}

/// Write the session report into `dir` as `drowsiness_report_<timestamp>.txt`
pub fn write_session_report(dir: &Path, record: &SessionRecord) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "drowsiness_report_{}.txt",
        record.ended_at.format("%Y%m%d_%H%M%S")
    ));
    fs::write(&path, render_session_report(record))?;
    info!("Session report written to {}", path.display());
    Ok(path)
}

/// Long-term analysis over the whole log; `None` when it is empty
pub fn render_analysis_report(log: &SessionLog, now: DateTime<Utc>) -> Option<String> {
    let avg_drowsy = log.avg_drowsy_per_session()?;
    let mut out = String::new();

    let _ = writeln!(out, "===== FATIGUE ANALYSIS REPORT =====\n");
    let _ = writeln!(out, "Report Generated: {}\n", now.format(TIMESTAMP_FORMAT));

    let _ = writeln!(out, "WEEKLY SUMMARY:");
    match log.weekly_summary(now.date_naive()) {
        Some(weekly) => {
            let _ = writeln!(out, "Sessions in the past week: {}", weekly.session_count);
            let _ = writeln!(out, "Total drowsy episodes: {}", weekly.total_drowsy_episodes);
            let _ = writeln!(out, "Total yawn episodes: {}", weekly.total_yawn_episodes);
            let _ = writeln!(out, "Total emergency alerts: {}", weekly.total_emergency_alerts);
            let _ = writeln!(
                out,
                "Average drowsy episodes per session: {:.2}",
                weekly.avg_drowsy_per_session
            );
            let _ = writeln!(
                out,
                "Average yawn episodes per session: {:.2}\n",
                weekly.avg_yawns_per_session
            );
        }
        None => {
            let _ = writeln!(out, "No sessions recorded in the past week.\n");
        }
    }

    let _ = writeln!(out, "ALL SESSIONS:");
    for (idx, session) in log.sessions().iter().enumerate() {
        let _ = writeln!(
            out,
            "Session {} - {}",
            idx + 1,
            session.started_at.format(TIMESTAMP_FORMAT)
        );
        let _ = writeln!(out, "  Duration: {}", format_duration(session.duration_secs));
        let _ = writeln!(out, "  Drowsy Episodes: {}", session.drowsy_episodes);
        let _ = writeln!(out, "  Yawn Episodes: {}", session.yawn_episodes);
        let _ = writeln!(out, "  Emergency Alerts: {}\n", session.emergency_alerts);
    }

    let _ = writeln!(out, "RECOMMENDATIONS:");
    if avg_drowsy > SLEEP_ADVICE_THRESHOLD {
        let _ = writeln!(
            out,
            "- You appear to experience significant drowsiness. Consider improving your sleep schedule."
        );
    }
    if avg_drowsy > MEDICAL_ADVICE_THRESHOLD {
        let _ = writeln!(
            out,
            "- High frequency of drowsiness detected. Please consult with a healthcare professional."
        );
    }

    let _ = writeln!(out, "\n===== END OF REPORT =====");
    Some(out)
}

/// Write the analysis report; returns `false` when there was nothing to report
pub fn write_analysis_report(log: &SessionLog, path: &Path, now: DateTime<Utc>) -> Result<bool, StorageError> {
    let Some(report) = render_analysis_report(log, now) else {
        return Ok(false);
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report)?;
    info!("Fatigue analysis report written to {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_log::tests::{record, temp_path};
    use chrono::TimeZone;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3_725), "01:02:05");
        assert_eq!(format_duration(100 * 3600), "100:00:00");
    }

    #[test]
    fn test_session_report_contents() {
        let report = render_session_report(&record(10, 2, 1));
        assert!(report.contains("Session Start: 2026-10-10 08:30:00"));
        assert!(report.contains("Session Duration: 01:02:05"));
        assert!(report.contains("Drowsy Episodes Detected: 2"));
        assert!(report.contains("- Eye Aspect Ratio Threshold: 0.25"));
        assert!(report.contains("- Emergency Contact Timeout: 15 seconds"));
    }

    #[test]
    fn test_write_session_report_name() {
        let dir = temp_path("reports");
        let path = write_session_report(&dir, &record(10, 2, 1)).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "drowsiness_report_20261010_093205.txt"
        );
        assert!(fs::read_to_string(path).unwrap().starts_with("====="));
    }

    #[test]
    fn test_analysis_report_recommendations() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let mut log = SessionLog::open(temp_path("analysis.json"));
        assert!(render_analysis_report(&log, now).is_none());

        log.add_session(record(16, 4, 0)).unwrap();
        let mild = render_analysis_report(&log, now).unwrap();
        assert!(mild.contains("Sessions in the past week: 1"));
        assert!(!mild.contains("sleep schedule"));

        log.add_session(record(17, 20, 2)).unwrap();
        let heavy = render_analysis_report(&log, now).unwrap();
        assert!(heavy.contains("Average drowsy episodes per session: 12.00"));
        assert!(heavy.contains("sleep schedule"));
        assert!(heavy.contains("healthcare professional"));
        assert!(heavy.contains("Session 2 - 2026-10-17 08:30:00"));
    }

    #[test]
    fn test_write_analysis_report_skips_empty_log() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let log = SessionLog::open(temp_path("empty.json"));
        let out = temp_path("analysis.txt");
        assert!(!write_analysis_report(&log, &out, now).unwrap());
        assert!(!out.exists());
    }
}
