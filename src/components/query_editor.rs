//! Query editor pane
//!
//! Shows the SQL buffer with highlighting. In editing mode keys go to the
//! buffer; every edit emits `SetSourceQuery` with the new text.

use crate::action::Action;
use crate::component::Component;
use crate::components::sql_highlight::highlight_sql;
use crate::model::editor::{BoundVariable, EditorState};
use crate::model::ui::InputMode;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// What the editor draws from
pub struct EditorRenderContext<'a> {
    pub editor: &'a EditorState,
    pub mode: InputMode,
    pub validation_error: Option<&'a str>,
    pub dark_mode: bool,
}

#[derive(Default)]
pub struct QueryEditor;

impl QueryEditor {
    pub fn draw_with_context(
        &self,
        frame: &mut Frame,
        area: Rect,
        ctx: &EditorRenderContext,
    ) -> Result<()> {
        let editing = ctx.mode == InputMode::Editing;
        let mut lines = highlight_sql(&ctx.editor.query(), ctx.dark_mode);
        if editing {
            if let Some(last) = lines.last_mut() {
                last.spans.push(Span::styled(
                    "█",
                    Style::default().fg(Color::Yellow),
                ));
            }
        }

        let title = match &ctx.editor.editing_view {
            Some(view) => format!(" SQL · view: {} ", view.name),
            None => " SQL ".to_string(),
        };
        let border_color = if editing { Color::Yellow } else { Color::DarkGray };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        if let Some(error) = ctx.validation_error {
            block = block.title_bottom(Line::from(Span::styled(
                format!(" {} ", error),
                Style::default().fg(Color::Red),
            )));
        }

        // Keep the last line visible while typing
        let visible = area.height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(visible.max(1));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);
        Ok(())
    }
}

/// Variables row: `name = value` for each referenced variable
pub fn variables_line(variables: &[BoundVariable]) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " Variables: ",
        Style::default().fg(Color::DarkGray),
    )];
    for (i, variable) in variables.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            variable.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" = "));
        match &variable.value {
            Some(value) => spans.push(Span::raw(value.clone())),
            None => spans.push(Span::styled("unset", Style::default().fg(Color::Red))),
        }
    }
    Line::from(spans)
}

impl Component for QueryEditor {
    /// Keys while editing the buffer
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Esc => Some(Action::ExitEditMode),
            KeyCode::Char('r') | KeyCode::Enter if ctrl => Some(Action::RunQuery),
            KeyCode::Char('l') if ctrl => Some(Action::EditorClear),
            KeyCode::Enter => Some(Action::EditorNewline),
            KeyCode::Backspace => Some(Action::EditorBackspace),
            KeyCode::Tab => Some(Action::EditorInput(' ')),
            KeyCode::Char(c) if !ctrl => Some(Action::EditorInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        Ok(())
    }
}
