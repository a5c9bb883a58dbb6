//! Detail view for a single export job, mounted when its row is expanded

use crate::model::export::{progress_percent, ExportStatus, ExportsState};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const BAR_WIDTH: usize = 20;

/// Text progress bar, e.g. `[█████░░░░░] 50%`
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent as usize * width) / 100;
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        percent
    )
}

/// Per-job detail view, scoped to one job id
#[derive(Debug, Clone)]
pub struct ExportDetailView {
    pub plugin_config_id: u64,
    pub job_id: String,
}

impl ExportDetailView {
    pub fn new(plugin_config_id: u64, job_id: impl Into<String>) -> Self {
        Self {
            plugin_config_id,
            job_id: job_id.into(),
        }
    }

    /// Lines shown beneath the expanded row, looked up by job id
    pub fn render_lines(&self, state: &ExportsState) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::DarkGray);
        let indent = "      ";

        let Some(record) = state.find(&self.job_id) else {
            return vec![Line::from(Span::styled(
                format!("{}Export job {} is no longer listed", indent, self.job_id),
                Style::default().fg(Color::Red),
            ))];
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{}Job ", indent), label),
            Span::styled(
                self.job_id.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  (plugin config {})", self.plugin_config_id), label),
        ])];

        lines.push(Line::from(vec![
            Span::styled(format!("{}Range ", indent), label),
            Span::raw(record.date_range_text()),
        ]));

        let (status_text, color) = match record.status {
            ExportStatus::Success => (progress_bar(100, BAR_WIDTH), Color::Green),
            ExportStatus::Fail => ("failed".to_string(), Color::Red),
            ExportStatus::NotFinished => (
                progress_bar(progress_percent(record.progress), BAR_WIDTH),
                Color::Yellow,
            ),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}Status ", indent), label),
            Span::styled(status_text, Style::default().fg(color)),
        ]));

        if record.logs.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("{}No log entries", indent),
                label,
            )));
        }
        for entry in &record.logs {
            let level_color = match entry.level.to_ascii_uppercase().as_str() {
                "ERROR" => Color::Red,
                "WARN" | "WARNING" => Color::Yellow,
                _ => Color::Gray,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}{} ", indent, entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
                    label,
                ),
                Span::styled(
                    format!("{:5} ", entry.level),
                    Style::default().fg(level_color),
                ),
                Span::raw(entry.message.clone()),
            ]));
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::export::{DateRange, ExportLogEntry, ExportPayload, ExportRecord};
    use chrono::{TimeZone, Utc};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(50, 10), "[█████░░░░░] 50%");
        assert_eq!(progress_bar(0, 4), "[░░░░] 0%");
        assert_eq!(progress_bar(100, 4), "[████] 100%");
    }

    #[test]
    fn test_detail_lines_include_logs() {
        let record = ExportRecord {
            job_id: "job-9".to_string(),
            status: ExportStatus::NotFinished,
            payload: ExportPayload {
                date_range: DateRange::new("2024-01-01", "2024-01-02"),
            },
            progress: Some(0.25),
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            logs: vec![ExportLogEntry {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 3, 0, 1, 0).unwrap(),
                level: "ERROR".to_string(),
                message: "chunk 2 timed out".to_string(),
            }],
        };
        let state = ExportsState {
            records: vec![record],
            ..Default::default()
        };
        let view = ExportDetailView::new(7, "job-9");
        let lines: Vec<String> = view.render_lines(&state).iter().map(text).collect();
        assert!(lines[0].contains("job-9"));
        assert!(lines[0].contains("plugin config 7"));
        assert!(lines[1].ends_with("2024-01-01 - 2024-01-02"));
        assert!(lines[2].contains("25%"));
        assert!(lines[3].ends_with("chunk 2 timed out"));
    }

    #[test]
    fn test_missing_record() {
        let view = ExportDetailView::new(7, "gone");
        let lines = view.render_lines(&ExportsState::default());
        assert_eq!(lines.len(), 1);
        assert!(text(&lines[0]).contains("gone"));
    }
}
