//! Data grid for query results
//!
//! Renders grid columns and rows with headers, a separator and column
//! alignment. Widths are measured in terminal cells.

use crate::action::Action;
use crate::component::Component;
use crate::model::grid::{Grid, SemanticType};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a column may grow
const MAX_COLUMN_WIDTH: usize = 50;

/// Cell colours for light and dark terminals
#[derive(Debug, Clone, Copy)]
pub struct GridTheme {
    pub header: Color,
    pub cell: Color,
    pub muted: Color,
}

impl GridTheme {
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                header: Color::Cyan,
                cell: Color::White,
                muted: Color::DarkGray,
            }
        } else {
            Self {
                header: Color::Blue,
                cell: Color::Black,
                muted: Color::Gray,
            }
        }
    }
}

/// Cut `text` to `width` cells, marking the cut with "…"
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize, right_align: bool) -> String {
    let padding = " ".repeat(width.saturating_sub(text.width()));
    if right_align {
        format!("{}{}", padding, text)
    } else {
        format!("{}{}", text, padding)
    }
}

/// Column widths in cells, capped at `MAX_COLUMN_WIDTH`
pub fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }
    widths.into_iter().map(|w| w.clamp(1, MAX_COLUMN_WIDTH)).collect()
}

/// Build grid lines: header, separator, rows, and a row count
pub fn build_grid_lines(grid: &Grid, theme: GridTheme) -> Vec<Line<'static>> {
    if grid.is_empty() {
        return vec![Line::from(Span::styled(
            "Query returned no columns",
            Style::default().fg(theme.muted),
        ))];
    }

    let headers = grid.headers();
    let rows = grid.display_rows();
    let widths = column_widths(&headers, &rows);
    let numeric: Vec<bool> = grid
        .columns
        .iter()
        .map(|c| c.semantic_type.is_numeric())
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 4);

    let header_spans: Vec<Span> = headers
        .iter()
        .zip(&widths)
        .flat_map(|(h, &width)| {
            vec![
                Span::styled(
                    pad_to_width(&truncate_to_width(h, width), width, false),
                    Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" │ ", Style::default().fg(theme.muted)),
            ]
        })
        .collect();
    lines.push(Line::from(header_spans));

    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    lines.push(Line::from(Span::styled(
        separator,
        Style::default().fg(theme.muted),
    )));

    for (row, source) in rows.iter().zip(&grid.rows) {
        let spans: Vec<Span> = row
            .iter()
            .enumerate()
            .flat_map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(10);
                let key = &grid.columns[i].key;
                let is_null = source.get(key).map_or(true, |v| v.is_null());
                let style = if is_null {
                    Style::default().fg(theme.muted)
                } else if grid.columns[i].semantic_type == SemanticType::Boolean {
                    Style::default().fg(Color::Magenta)
                } else {
                    Style::default().fg(theme.cell)
                };
                vec![
                    Span::styled(
                        pad_to_width(&truncate_to_width(cell, width), width, numeric[i]),
                        style,
                    ),
                    Span::styled(" │ ", Style::default().fg(theme.muted)),
                ]
            })
            .collect();
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Total rows: {}", rows.len()),
        Style::default().fg(Color::Yellow),
    )));

    lines
}

/// The rows of `lines` visible at `offset`
///
/// Slicing instead of `Paragraph::scroll` keeps offsets past `u16::MAX`
/// pointing at the right rows.
pub fn visible_lines(lines: &[Line<'static>], offset: usize, height: usize) -> Vec<Line<'static>> {
    lines.iter().skip(offset).take(height).cloned().collect()
}

/// Scrollable grid of the current response
#[derive(Default)]
pub struct DataGrid {
    scroll: usize,
    horizontal: usize,
    lines: Vec<Line<'static>>,
}

impl DataGrid {
    /// Rebuild lines from the grid; scrolling is kept when possible
    pub fn set_grid(&mut self, grid: &Grid, dark_mode: bool) {
        self.lines = build_grid_lines(grid, GridTheme::for_mode(dark_mode));
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
        self.horizontal = 0;
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }
}

impl Component for DataGrid {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageDown)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageUp)
            }
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Char('g') => Some(Action::FirstItem),
            KeyCode::Char('G') => Some(Action::LastItem),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let max_scroll = self.max_scroll();
        match action {
            Action::ScrollDown => self.scroll = (self.scroll + 1).min(max_scroll),
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            Action::PageDown => self.scroll = (self.scroll + 10).min(max_scroll),
            Action::PageUp => self.scroll = self.scroll.saturating_sub(10),
            Action::FirstItem => self.scroll = 0,
            Action::LastItem => self.scroll = max_scroll,
            Action::NextItem => self.horizontal = self.horizontal.saturating_add(4),
            Action::PrevItem => self.horizontal = self.horizontal.saturating_sub(4),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let visible_height = area.height.saturating_sub(2) as usize;

        let horizontal = u16::try_from(self.horizontal).unwrap_or(u16::MAX);

        let paragraph = Paragraph::new(visible_lines(&self.lines, self.scroll, visible_height))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .scroll((0, horizontal));

        frame.render_widget(paragraph, area);

        let total = self.lines.len();
        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
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
