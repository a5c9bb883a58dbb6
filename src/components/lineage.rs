//! Lineage tab
//!
//! Upstream tables and views read by the current query, and saved views
//! that read from the view the editor is bound to.

use crate::action::Action;
use crate::component::Component;
use crate::model::lineage::{LineageKind, LineageNode, QueryLineage};
use crate::model::ui::spinner;
use anyhow::Result;
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

fn push_section(lines: &mut Vec<Line<'static>>, title: &str, nodes: &[LineageNode]) {
    lines.push(Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    for (i, node) in nodes.iter().enumerate() {
        let prefix = if i == nodes.len() - 1 { "└──" } else { "├──" };
        let (color, kind) = match node.kind {
            LineageKind::Table => (Color::Green, "table"),
            LineageKind::SavedView => (Color::Blue, "view"),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {} ", prefix, node.icon()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(node.name.clone(), Style::default().fg(color)),
            Span::styled(format!(" ({})", kind), Style::default().fg(Color::DarkGray)),
        ]));
    }
}

/// Lines for a lineage
pub fn render_lineage(lineage: &QueryLineage) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if lineage.is_empty() {
        lines.push(Line::from(Span::styled(
            "No dependencies found",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    if !lineage.upstream.is_empty() {
        push_section(&mut lines, "Upstream (reads from):", &lineage.upstream);
        if !lineage.downstream.is_empty() {
            lines.push(Line::from(""));
        }
    }
    if !lineage.downstream.is_empty() {
        push_section(&mut lines, "Downstream (used by):", &lineage.downstream);
    }

    lines
}

/// Lineage panel scoped to one editor session
#[derive(Default)]
pub struct LineagePanel {
    scroll: usize,
    content: Vec<Line<'static>>,
    editor_key: String,
}

impl LineagePanel {
    /// Recompute content; scrolling resets when the editor session changes
    pub fn set_lineage(&mut self, editor_key: &str, lineage: &QueryLineage) {
        if self.editor_key != editor_key {
            self.editor_key = editor_key.to_string();
            self.scroll = 0;
        }
        self.content = render_lineage(lineage);
    }

    pub fn draw_loading(&self, frame: &mut Frame, area: Rect, tick: usize) {
        let paragraph = Paragraph::new(Span::styled(
            format!("{} Loading lineage...", spinner(tick)),
            Style::default().fg(Color::Yellow),
        ))
        .block(panel_block());
        frame.render_widget(paragraph, area);
    }
}

fn panel_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(" Lineage ")
        .border_style(Style::default().fg(Color::DarkGray))
}

impl Component for LineagePanel {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let max_scroll = self.content.len().saturating_sub(1);
        match action {
            Action::ScrollDown => self.scroll = (self.scroll + 1).min(max_scroll),
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            Action::PageDown => self.scroll = (self.scroll + 10).min(max_scroll),
            Action::PageUp => self.scroll = self.scroll.saturating_sub(10),
            Action::FirstItem => self.scroll = 0,
            Action::LastItem => self.scroll = max_scroll,
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let visible_height = area.height.saturating_sub(2) as usize;

        let paragraph = Paragraph::new(self.content.clone())
            .block(panel_block())
            .scroll((u16::try_from(self.scroll).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);

        let total = self.content.len();
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
