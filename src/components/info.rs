//! Info tab
//!
//! Metadata about the current editor session: the bound saved view, query
//! stats, the columns of the last response and its query id.

use crate::action::Action;
use crate::component::Component;
use crate::model::editor::EditorState;
use crate::model::grid::Grid;
use crate::model::ui::spinner;
use anyhow::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("  {}: ", label)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

/// Info content for the editor session and the last response
pub fn render_info(
    editor: &EditorState,
    grid: Option<&Grid>,
    query_id: Option<&str>,
) -> Vec<Line<'static>> {
    let mut lines = vec![section("Editor")];
    lines.push(field("Session", editor.editor_key.clone()));
    match &editor.editing_view {
        Some(view) => {
            lines.push(field("View", view.name.clone()));
            lines.push(field("View id", view.id.clone()));
            lines.push(field(
                "Updated",
                view.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ));
        }
        None => lines.push(field("View", "not saved".to_string())),
    }

    let query = editor.query();
    lines.push(Line::from(""));
    lines.push(section("Query"));
    lines.push(field("Lines", editor.lines.len().to_string()));
    lines.push(field("Characters", query.chars().count().to_string()));
    let variables = editor.variables();
    if !variables.is_empty() {
        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        lines.push(field("Variables", names.join(", ")));
    }

    lines.push(Line::from(""));
    lines.push(section("Result"));
    match grid {
        Some(grid) => {
            lines.push(field("Rows", grid.rows.len().to_string()));
            for column in &grid.columns {
                lines.push(Line::from(vec![
                    Span::raw("  • "),
                    Span::styled(column.name.clone(), Style::default().fg(Color::Cyan)),
                    Span::styled(
                        format!("  {}", column.semantic_type.label()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "  No result yet",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    if let Some(id) = query_id {
        lines.push(field("Query id", id.to_string()));
    }

    lines
}

/// Info panel scoped to one editor session
#[derive(Default)]
pub struct InfoPanel {
    content: Vec<Line<'static>>,
    scroll: usize,
}

impl InfoPanel {
    pub fn set_info(&mut self, editor: &EditorState, grid: Option<&Grid>, query_id: Option<&str>) {
        self.content = render_info(editor, grid, query_id);
        self.scroll = self.scroll.min(self.content.len().saturating_sub(1));
    }

    pub fn draw_loading(&self, frame: &mut Frame, area: Rect, tick: usize) {
        let paragraph = Paragraph::new(Span::styled(
            format!("{} Loading info...", spinner(tick)),
            Style::default().fg(Color::Yellow),
        ))
        .block(panel_block());
        frame.render_widget(paragraph, area);
    }
}

fn panel_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .border_style(Style::default().fg(Color::DarkGray))
}

impl Component for InfoPanel {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let max_scroll = self.content.len().saturating_sub(1);
        match action {
            Action::ScrollDown => self.scroll = (self.scroll + 1).min(max_scroll),
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            Action::FirstItem => self.scroll = 0,
            Action::LastItem => self.scroll = max_scroll,
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let paragraph = Paragraph::new(self.content.clone())
            .block(panel_block())
            .scroll((u16::try_from(self.scroll).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response::{QueryResponse, TypeTag};

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_info_without_result() {
        let mut editor = EditorState::new("editor-1");
        editor.set_query("select 1\nfrom t");
        let lines = texts(&render_info(&editor, None, None));
        assert!(lines.contains(&"  Session: editor-1".to_string()));
        assert!(lines.contains(&"  View: not saved".to_string()));
        assert!(lines.contains(&"  Lines: 2".to_string()));
        assert!(lines.contains(&"  Characters: 15".to_string()));
        assert!(lines.contains(&"  No result yet".to_string()));
    }

    #[test]
    fn test_info_lists_columns() {
        let editor = EditorState::new("e");
        let grid = Grid::derive(&QueryResponse {
            columns: vec!["n".into()],
            types: vec![TypeTag::Label("Nullable(Int64)".into())],
            results: vec![vec![serde_json::json!(3)]],
            ..Default::default()
        });
        let lines = texts(&render_info(&editor, Some(&grid), Some("q-1")));
        assert!(lines.contains(&"  Rows: 1".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("  • n")));
        assert_eq!(lines.last(), Some(&"  Query id: q-1".to_string()));
    }
}
