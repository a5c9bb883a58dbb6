//! Help overlay listing the keyboard shortcuts

use crate::action::Action;
use crate::component::Component;
use crate::model::ui::Screen;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

#[derive(Default)]
pub struct HelpDialog;

impl HelpDialog {
    /// Draw at `scroll_offset`; returns the offset clamped to the content
    pub fn draw_with_offset(
        &self,
        frame: &mut Frame,
        area: Rect,
        screen: Screen,
        scroll_offset: usize,
    ) -> usize {
        frame.render_widget(Clear, area);

        let margin = 4;
        let dialog_area = Rect::new(
            area.x + margin,
            area.y + margin,
            area.width.saturating_sub(margin * 2),
            area.height.saturating_sub(margin * 2),
        );

        let content = build_help_content(screen);
        let total = content.len();
        let visible_height = dialog_area.height.saturating_sub(2) as usize;
        let scroll_offset = scroll_offset.min(total.saturating_sub(visible_height));

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Keyboard Shortcuts ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .scroll((u16::try_from(scroll_offset).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, dialog_area);

        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(scroll_offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                dialog_area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        scroll_offset
    }
}

impl Component for HelpDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseModal),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        Ok(())
    }
}

type Section = (&'static str, &'static [(&'static str, &'static str)]);

const GLOBAL: Section = (
    "Global",
    &[
        ("1 / F1", "SQL editor"),
        ("2 / F2", "Historical exports"),
        ("?", "Show this help"),
        ("q", "Quit"),
        ("Ctrl+c", "Quit immediately"),
    ],
);

const QUERY: Section = (
    "SQL editor",
    &[
        ("e / i", "Edit the query (Esc to stop)"),
        ("r / Ctrl+r", "Run query"),
        ("Esc", "Cancel the running query"),
        ("Tab", "Next output tab"),
        ("Shift+Tab", "Previous output tab"),
        ("j / k", "Scroll the active tab"),
        ("h / l", "Scroll the grid sideways"),
        ("x", "Export results (CSV / XLSX)"),
        ("S", "Save as view / Update view"),
        ("I", "Save as insight"),
    ],
);

const VISUALIZATION: Section = (
    "Visualization",
    &[
        ("v", "Cycle visualization type"),
        ("s", "Toggle chart settings"),
        ("n", "Create insight"),
    ],
);

const EXPORTS: Section = (
    "Historical exports",
    &[
        ("j / k", "Move selection"),
        ("g / G", "First / last export"),
        ("Enter / Space", "Expand or collapse details"),
        ("n", "Start new export"),
        ("R", "Refresh"),
    ],
);

/// Sections for the current screen come first
fn build_help_content(screen: Screen) -> Vec<Line<'static>> {
    let sections: [Section; 4] = match screen {
        Screen::Query => [QUERY, VISUALIZATION, EXPORTS, GLOBAL],
        Screen::Exports => [EXPORTS, QUERY, VISUALIZATION, GLOBAL],
    };

    let mut lines = Vec::new();
    for (title, shortcuts) in sections {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {} ", title),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", "─".repeat(title.len() + 2)),
            Style::default().fg(Color::DarkGray),
        )));
        for (key, description) in shortcuts {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:14}", key),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(description.to_string(), Style::default().fg(Color::White)),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press q, Esc, or ? to close",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_current_screen_first() {
        let lines = build_help_content(Screen::Exports);
        assert_eq!(text(&lines[1]).trim(), "Historical exports");
        let lines = build_help_content(Screen::Query);
        assert_eq!(text(&lines[1]).trim(), "SQL editor");
    }
}
