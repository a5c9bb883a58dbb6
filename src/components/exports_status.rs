//! Historical exports table
//!
//! One row per export job with date range, status, creator and creation
//! time. Expanding a row mounts an `ExportDetailView` for that job id the
//! first time; expansion is local to the table.

use crate::action::Action;
use crate::component::Component;
use crate::components::data_grid::visible_lines;
use crate::components::export_detail::ExportDetailView;
use crate::model::export::{ExportRecord, ExportsState, StatusCell, TagKind};
use crate::model::ui::spinner;
use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use std::collections::{HashMap, HashSet};
use unicode_width::UnicodeWidthStr;

const DATE_RANGE_WIDTH: usize = 25;
const STATUS_WIDTH: usize = 16;
const CREATOR_WIDTH: usize = 20;

fn fit(text: &str, width: usize) -> String {
    let text = crate::components::data_grid::truncate_to_width(text, width);
    let padding = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(padding))
}

/// Status cell as a styled span
pub fn status_span(cell: &StatusCell) -> Span<'static> {
    match cell {
        StatusCell::Tag { label, kind } => {
            let bg = match kind {
                TagKind::Success => Color::Green,
                TagKind::Danger => Color::Red,
            };
            Span::styled(
                fit(&format!(" {} ", label), STATUS_WIDTH),
                Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
            )
        }
        StatusCell::Progress(percent) => {
            let filled = (*percent as usize * 8) / 100;
            let bar = format!(
                "{}{} {:>3}%",
                "▰".repeat(filled),
                "▱".repeat(8 - filled),
                percent
            );
            Span::styled(fit(&bar, STATUS_WIDTH), Style::default().fg(Color::Yellow))
        }
    }
}

/// Text of a record's row, without styling
pub fn row_cells(record: &ExportRecord, now: DateTime<Utc>) -> [String; 3] {
    [
        record.date_range_text(),
        record.creator_text(),
        record.created_at_text(now),
    ]
}

/// Exports table with selection and expandable rows
#[derive(Default)]
pub struct ExportsStatusView {
    pub selected: usize,
    scroll: usize,
    expanded: HashSet<String>,
    details: HashMap<String, ExportDetailView>,
}

impl ExportsStatusView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Keep the selection inside the list after a reload
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn is_expanded(&self, job_id: &str) -> bool {
        self.expanded.contains(job_id)
    }

    /// Detail views mounted so far
    #[cfg(test)]
    pub fn mounted_details(&self) -> usize {
        self.details.len()
    }

    /// Expand or collapse the selected row, mounting its detail view once
    ///
    /// Without a plugin config there is nothing to scope a detail view to,
    /// so the row expands empty.
    pub fn toggle_expand(&mut self, state: &ExportsState) {
        let Some(record) = state.records.get(self.selected) else {
            return;
        };
        let job_id = record.job_id.clone();
        if !self.expanded.remove(&job_id) {
            if let Some(plugin_config_id) = state.plugin_config_id {
                self.details
                    .entry(job_id.clone())
                    .or_insert_with(|| ExportDetailView::new(plugin_config_id, job_id.clone()));
            }
            self.expanded.insert(job_id);
        }
    }

    /// Header, rows and expanded details, plus the line index of the selected row
    pub fn build_lines(
        &self,
        state: &ExportsState,
        now: DateTime<Utc>,
        tick: usize,
    ) -> (Vec<Line<'static>>, usize) {
        let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("  {} ", fit("Date range", DATE_RANGE_WIDTH)), header_style),
            Span::styled(format!("{} ", fit("Status", STATUS_WIDTH)), header_style),
            Span::styled(format!("{} ", fit("Created by", CREATOR_WIDTH)), header_style),
            Span::styled("Created at", header_style),
        ])];

        if state.loading {
            lines.push(Line::from(Span::styled(
                format!("{} Loading exports...", spinner(tick)),
                Style::default().fg(Color::Yellow),
            )));
        }

        if state.records.is_empty() && !state.loading {
            lines.push(Line::from(Span::styled(
                "  No exports yet",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let mut selected_line = 0;
        for (i, record) in state.records.iter().enumerate() {
            let is_selected = i == self.selected;
            let expanded = self.is_expanded(&record.job_id);
            let [range, creator, created_at] = row_cells(record, now);

            if is_selected {
                selected_line = lines.len();
            }
            let row_style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let marker = if expanded { "▾ " } else { "▸ " };

            lines.push(
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{} ", fit(&range, DATE_RANGE_WIDTH))),
                    status_span(&record.status_cell()),
                    Span::raw(" "),
                    Span::raw(format!("{} ", fit(&creator, CREATOR_WIDTH))),
                    Span::styled(created_at, Style::default().fg(Color::Gray)),
                ])
                .style(row_style),
            );

            if expanded {
                if let Some(detail) = self.details.get(&record.job_id) {
                    lines.extend(detail.render_lines(state));
                }
            }
        }

        (lines, selected_line)
    }

    /// Actions line above the table
    pub fn actions_line(state: &ExportsState) -> Line<'static> {
        let enabled = state.can_start_export();
        let (key_style, text_style) = if enabled {
            (
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::White),
            )
        } else {
            (
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::DarkGray),
            )
        };
        let mut spans = vec![
            Span::styled(" [n] ", key_style),
            Span::styled("Start new export", text_style),
        ];
        if let Some(trigger) = &state.trigger {
            spans.push(Span::styled(
                format!("  ({})", trigger.job_name),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.push(Span::styled(
            "   [R] ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("Refresh"));
        Line::from(spans)
    }

    pub fn draw_with_state(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &ExportsState,
        tick: usize,
    ) -> Result<()> {
        self.clamp(state.records.len());
        let (lines, selected_line) = self.build_lines(state, Utc::now(), tick);

        let visible_height = area.height.saturating_sub(2) as usize;
        if selected_line < self.scroll {
            self.scroll = selected_line.saturating_sub(1);
        } else if visible_height > 0 && selected_line >= self.scroll + visible_height {
            self.scroll = selected_line + 1 - visible_height;
        }

        let total = lines.len();
        let title = format!(" Historical exports ({}) ", state.records.len());
        let paragraph = Paragraph::new(visible_lines(&lines, self.scroll, visible_height))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(title)
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            );
        frame.render_widget(paragraph, area);

        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

impl Component for ExportsStatusView {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextItem),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevItem),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::FirstItem),
            KeyCode::Char('G') | KeyCode::End => Some(Action::LastItem),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::ToggleExpandRow),
            KeyCode::Char('n') => Some(Action::OpenExportTrigger),
            KeyCode::Char('R') => Some(Action::RefreshExports),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the exports state, see draw_with_state
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::export::{DateRange, ExportPayload, ExportStatus, JobTriggerConfig};
    use chrono::TimeZone;
    use crossterm::event::KeyModifiers;

    fn record(job_id: &str, status: ExportStatus, progress: Option<f64>) -> ExportRecord {
        ExportRecord {
            job_id: job_id.to_string(),
            status,
            payload: ExportPayload {
                date_range: DateRange::new("2024-05-01", "2024-05-01"),
            },
            progress,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
            logs: Vec::new(),
        }
    }

    fn state() -> ExportsState {
        ExportsState {
            records: vec![
                record("a", ExportStatus::Success, None),
                record("b", ExportStatus::NotFinished, Some(0.5)),
            ],
            plugin_config_id: Some(3),
            ..Default::default()
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_rows_render_cells() {
        let view = ExportsStatusView::new();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 3, 0, 0).unwrap();
        let (lines, selected) = view.build_lines(&state(), now, 0);
        assert_eq!(lines.len(), 3);
        assert_eq!(selected, 1);
        let first = text(&lines[1]);
        assert!(first.contains("2024-05-01 "));
        assert!(!first.contains(" - "));
        assert!(first.contains("SUCCESS"));
        assert!(first.contains("Unknown"));
        assert!(first.ends_with("3 hours ago"));
        assert!(text(&lines[2]).contains("50%"));
    }

    #[test]
    fn test_expansion_mounts_detail_once() {
        let state = state();
        let mut view = ExportsStatusView::new();
        view.toggle_expand(&state);
        assert!(view.is_expanded("a"));
        assert_eq!(view.mounted_details(), 1);

        view.toggle_expand(&state);
        assert!(!view.is_expanded("a"));
        view.toggle_expand(&state);
        assert_eq!(view.mounted_details(), 1);

        let (lines, _) = view.build_lines(&state, Utc::now(), 0);
        assert!(lines.len() > 3);
    }

    #[test]
    fn test_expansion_without_plugin_config_shows_no_detail() {
        let state = ExportsState {
            plugin_config_id: None,
            ..state()
        };
        let mut view = ExportsStatusView::new();
        view.toggle_expand(&state);
        assert!(view.is_expanded("a"));
        assert_eq!(view.mounted_details(), 0);

        let (lines, _) = view.build_lines(&state, Utc::now(), 0);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_expansion_does_not_touch_records() {
        let state = state();
        let before = state.records.clone();
        let mut view = ExportsStatusView::new();
        view.next(state.records.len());
        view.toggle_expand(&state);
        assert!(view.is_expanded("b"));
        assert_eq!(state.records, before);
    }

    #[test]
    fn test_selection_bounds() {
        let mut view = ExportsStatusView::new();
        view.next(2);
        view.next(2);
        assert_eq!(view.selected, 1);
        view.previous();
        view.previous();
        assert_eq!(view.selected, 0);
        view.select_last(5);
        view.clamp(2);
        assert_eq!(view.selected, 1);
    }

    #[test]
    fn test_loading_indicator() {
        let mut state = state();
        state.loading = true;
        let view = ExportsStatusView::new();
        let (lines, _) = view.build_lines(&state, Utc::now(), 0);
        assert!(text(&lines[1]).contains("Loading exports"));
    }

    #[test]
    fn test_start_export_dimmed_without_trigger() {
        let mut state = state();
        let line = ExportsStatusView::actions_line(&state);
        assert_eq!(line.spans[1].style.fg, Some(Color::DarkGray));

        state.trigger = Some(JobTriggerConfig {
            job_name: "Backfill".to_string(),
            command: "true".to_string(),
            fields: Vec::new(),
        });
        let line = ExportsStatusView::actions_line(&state);
        assert_eq!(line.spans[1].style.fg, Some(Color::White));
        assert!(text(&line).contains("Backfill"));
    }

    #[test]
    fn test_key_bindings() {
        let mut view = ExportsStatusView::new();
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert_eq!(
            view.handle_key_event(key('n')).unwrap(),
            Some(Action::OpenExportTrigger)
        );
        assert_eq!(
            view.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
                .unwrap(),
            Some(Action::ToggleExpandRow)
        );
    }
}
