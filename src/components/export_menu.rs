//! Export format picker for the current results

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::services::ExportFormat;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

#[derive(Default)]
pub struct ExportMenu;

impl ExportMenu {
    pub fn draw_with_selection(
        &self,
        frame: &mut Frame,
        area: Rect,
        selected: ExportFormat,
        file_stem: &str,
    ) -> Result<()> {
        let popup_area = centered_popup(area, 44, 8);
        frame.render_widget(Clear, popup_area);

        let mut content = vec![Line::from("")];
        for format in ExportFormat::all() {
            let is_selected = format == selected;
            let style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            content.push(Line::from(vec![
                Span::raw(if is_selected { " ▶ " } else { "   " }),
                Span::styled(
                    format!(" {}.{} ", file_stem, format.extension()),
                    style,
                ),
            ]));
        }
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled(
                " Enter ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Export  "),
            Span::styled(
                " Esc ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Cancel"),
        ]));

        let paragraph = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Export results ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

impl Component for ExportMenu {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Enter => Some(Action::ConfirmModal),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => Some(Action::ModalDown),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => Some(Action::ModalUp),
            KeyCode::Char('c') => Some(Action::ExportResults(ExportFormat::Csv)),
            KeyCode::Char('x') => Some(Action::ExportResults(ExportFormat::Xlsx)),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        Ok(())
    }
}
