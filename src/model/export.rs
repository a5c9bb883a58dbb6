//! Data models for historical export jobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a historical export job as reported by the job backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    NotFinished,
    Success,
    Fail,
}

/// Inclusive date range of an export, stored as `[from, to]` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl From<[String; 2]> for DateRange {
    fn from([from, to]: [String; 2]) -> Self {
        Self { from, to }
    }
}

impl From<DateRange> for [String; 2] {
    fn from(range: DateRange) -> Self {
        [range.from, range.to]
    }
}

impl DateRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Text for the "Dates exported" column
    ///
    /// A single-day export shows just that day.
    pub fn display(&self) -> String {
        if self.from == self.to {
            self.from.clone()
        } else {
            format!("{} - {}", self.from, self.to)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    #[serde(rename = "dateRange")]
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub email: String,
}

impl Creator {
    pub fn display_name(&self) -> &str {
        if !self.first_name.is_empty() {
            &self.first_name
        } else if !self.email.is_empty() {
            &self.email
        } else {
            "Unknown"
        }
    }
}

/// A log line produced by an export job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_log_level")]
    pub level: String,
    pub message: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// One historical export job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub job_id: String,
    pub status: ExportStatus,
    pub payload: ExportPayload,
    /// Fraction in [0, 1], only meaningful while not finished
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub created_by: Option<Creator>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub logs: Vec<ExportLogEntry>,
}

/// Visual flavour of a status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Success,
    Danger,
}

/// What the status column shows for a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCell {
    Tag { label: &'static str, kind: TagKind },
    Progress(u8),
}

/// Whole-number percentage for a progress fraction
pub fn progress_percent(progress: Option<f64>) -> u8 {
    let fraction = progress.unwrap_or(0.0);
    if !fraction.is_finite() {
        return 0;
    }
    (fraction * 100.0).floor().clamp(0.0, 100.0) as u8
}

impl ExportRecord {
    pub fn date_range_text(&self) -> String {
        self.payload.date_range.display()
    }

    pub fn status_cell(&self) -> StatusCell {
        match self.status {
            ExportStatus::Success => StatusCell::Tag {
                label: "SUCCESS",
                kind: TagKind::Success,
            },
            ExportStatus::Fail => StatusCell::Tag {
                label: "FAILED",
                kind: TagKind::Danger,
            },
            ExportStatus::NotFinished => StatusCell::Progress(progress_percent(self.progress)),
        }
    }

    pub fn creator_text(&self) -> String {
        self.created_by
            .as_ref()
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn created_at_text(&self, now: DateTime<Utc>) -> String {
        humanize_since(self.created_at, now)
    }
}

/// Relative time like "3 hours ago"
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 45 {
        return "just now".to_string();
    }
    let (value, unit) = if secs < 3600 {
        ((secs + 30) / 60, "minute")
    } else if secs < 86_400 {
        ((secs + 1800) / 3600, "hour")
    } else if secs < 30 * 86_400 {
        ((secs + 43_200) / 86_400, "day")
    } else if secs < 365 * 86_400 {
        (secs / (30 * 86_400), "month")
    } else {
        (secs / (365 * 86_400), "year")
    };
    let value = value.max(1);
    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}

/// A form field of the export trigger modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerField {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub default: String,
}

/// Configuration that allows starting a new historical export
///
/// The modal is built entirely from this: its title, its fields and the
/// command that is run on confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTriggerConfig {
    pub job_name: String,
    /// Shell command, `{key}` placeholders are replaced by field values
    pub command: String,
    #[serde(default = "default_trigger_fields")]
    pub fields: Vec<TriggerField>,
}

fn default_trigger_fields() -> Vec<TriggerField> {
    vec![
        TriggerField {
            key: "date_from".to_string(),
            label: "Date from".to_string(),
            default: String::new(),
        },
        TriggerField {
            key: "date_to".to_string(),
            label: "Date to".to_string(),
            default: String::new(),
        },
    ]
}

impl JobTriggerConfig {
    /// Substitute field values into the command template
    pub fn render_command(&self, values: &[(String, String)]) -> String {
        values
            .iter()
            .fold(self.command.clone(), |cmd, (key, value)| {
                cmd.replace(&format!("{{{}}}", key), value)
            })
    }
}

/// Export list state shared by the exports screen
#[derive(Debug, Default)]
pub struct ExportsState {
    pub records: Vec<ExportRecord>,
    pub loading: bool,
    pub trigger: Option<JobTriggerConfig>,
    /// Identity of the plugin config whose exports are listed
    pub plugin_config_id: Option<u64>,
}

impl ExportsState {
    pub fn can_start_export(&self) -> bool {
        self.trigger.is_some()
    }

    pub fn find(&self, job_id: &str) -> Option<&ExportRecord> {
        self.records.iter().find(|r| r.job_id == job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(status: ExportStatus, progress: Option<f64>, from: &str, to: &str) -> ExportRecord {
        ExportRecord {
            job_id: "job-1".to_string(),
            status,
            payload: ExportPayload {
                date_range: DateRange::new(from, to),
            },
            progress,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            logs: Vec::new(),
        }
    }

    #[test]
    fn test_single_day_range_shows_one_date() {
        let r = record(ExportStatus::Success, None, "2024-01-01", "2024-01-01");
        assert_eq!(r.date_range_text(), "2024-01-01");
    }

    #[test]
    fn test_multi_day_range_joins_with_dash() {
        let r = record(ExportStatus::Success, None, "2024-01-01", "2024-01-31");
        assert_eq!(r.date_range_text(), "2024-01-01 - 2024-01-31");
    }

    #[test]
    fn test_progress_is_floored() {
        assert_eq!(progress_percent(Some(0.499)), 49);
        assert_eq!(progress_percent(Some(0.0)), 0);
        assert_eq!(progress_percent(Some(1.0)), 100);
        assert_eq!(progress_percent(Some(0.999_9)), 99);
        assert_eq!(progress_percent(None), 0);
    }

    #[test]
    fn test_progress_out_of_range_is_clamped() {
        assert_eq!(progress_percent(Some(1.7)), 100);
        assert_eq!(progress_percent(Some(-0.2)), 0);
        assert_eq!(progress_percent(Some(f64::NAN)), 0);
    }

    #[test]
    fn test_status_cells() {
        let ok = record(ExportStatus::Success, None, "a", "a");
        assert_eq!(
            ok.status_cell(),
            StatusCell::Tag {
                label: "SUCCESS",
                kind: TagKind::Success
            }
        );

        let failed = record(ExportStatus::Fail, Some(0.3), "a", "a");
        assert_eq!(
            failed.status_cell(),
            StatusCell::Tag {
                label: "FAILED",
                kind: TagKind::Danger
            }
        );

        let running = record(ExportStatus::NotFinished, Some(0.257), "a", "a");
        assert_eq!(running.status_cell(), StatusCell::Progress(25));
    }

    #[test]
    fn test_parse_record_json() {
        let json = r#"{
            "job_id": "abc",
            "status": "not_finished",
            "payload": { "dateRange": ["2024-02-01", "2024-02-03"] },
            "progress": 0.5,
            "created_by": { "first_name": "Robin", "email": "robin@example.com" },
            "created_at": "2024-02-04T10:00:00Z"
        }"#;
        let r: ExportRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.status, ExportStatus::NotFinished);
        assert_eq!(r.payload.date_range, DateRange::new("2024-02-01", "2024-02-03"));
        assert_eq!(r.creator_text(), "Robin");
        assert!(r.logs.is_empty());
    }

    #[test]
    fn test_creator_falls_back_to_email() {
        let creator = Creator {
            first_name: String::new(),
            email: "ops@example.com".to_string(),
        };
        assert_eq!(creator.display_name(), "ops@example.com");
    }

    #[test]
    fn test_humanize_since() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(humanize_since(now, now), "just now");
        assert_eq!(
            humanize_since(now - chrono::Duration::minutes(1), now),
            "1 minute ago"
        );
        assert_eq!(
            humanize_since(now - chrono::Duration::hours(5), now),
            "5 hours ago"
        );
        assert_eq!(
            humanize_since(now - chrono::Duration::days(3), now),
            "3 days ago"
        );
    }

    #[test]
    fn test_render_trigger_command() {
        let trigger = JobTriggerConfig {
            job_name: "Export historical events".to_string(),
            command: "exporter --from {date_from} --to {date_to}".to_string(),
            fields: default_trigger_fields(),
        };
        let cmd = trigger.render_command(&[
            ("date_from".to_string(), "2024-01-01".to_string()),
            ("date_to".to_string(), "2024-01-07".to_string()),
        ]);
        assert_eq!(cmd, "exporter --from 2024-01-01 --to 2024-01-07");
    }

    #[test]
    fn test_start_export_requires_trigger() {
        let mut state = ExportsState::default();
        assert!(!state.can_start_export());
        state.trigger = Some(JobTriggerConfig {
            job_name: "Export".to_string(),
            command: "true".to_string(),
            fields: Vec::new(),
        });
        assert!(state.can_start_export());
    }
}
