//! New export dialog
//!
//! The form is built from the job-trigger configuration: one input per
//! configured field, prefilled with its default.

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::export::JobTriggerConfig;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Initial form values for a trigger configuration
pub fn initial_values(trigger: &JobTriggerConfig) -> Vec<String> {
    trigger.fields.iter().map(|f| f.default.clone()).collect()
}

/// Pair field keys with the entered values for command rendering
pub fn field_values(trigger: &JobTriggerConfig, values: &[String]) -> Vec<(String, String)> {
    trigger
        .fields
        .iter()
        .zip(values)
        .map(|(field, value)| (field.key.clone(), value.trim().to_string()))
        .collect()
}

/// Name of the first field left empty, if any
pub fn missing_field<'a>(trigger: &'a JobTriggerConfig, values: &[String]) -> Option<&'a str> {
    trigger
        .fields
        .iter()
        .zip(values)
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.label.as_str())
}

#[derive(Default)]
pub struct ExportTriggerDialog;

impl ExportTriggerDialog {
    pub fn draw_with_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        trigger: &JobTriggerConfig,
        field_index: usize,
        values: &[String],
    ) -> Result<()> {
        let height = (trigger.fields.len() as u16) * 2 + 6;
        let popup_area = centered_popup(area, 60, height);
        frame.render_widget(Clear, popup_area);

        let mut content = vec![Line::from("")];
        for (i, (field, value)) in trigger.fields.iter().zip(values).enumerate() {
            let focused = i == field_index;
            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            content.push(Line::from(Span::styled(
                format!(" {}", field.label),
                label_style,
            )));
            let cursor = if focused { "_" } else { "" };
            content.push(Line::from(Span::styled(
                format!(" > {}{}", value, cursor),
                Style::default().fg(Color::White),
            )));
        }
        content.push(Line::from(""));
        content.push(
            Line::from(vec![
                Span::styled(
                    " Enter ",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::raw("Start  "),
                Span::styled(
                    " Tab ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw("Next field  "),
                Span::styled(
                    " Esc ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw("Cancel"),
            ])
            .alignment(Alignment::Center),
        );

        let paragraph = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green))
                .title(format!(" {} ", trigger.job_name))
                .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

impl Component for ExportTriggerDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc => Some(Action::CloseModal),
            KeyCode::Enter => Some(Action::ConfirmModal),
            KeyCode::Tab | KeyCode::Down => Some(Action::ModalDown),
            KeyCode::BackTab | KeyCode::Up => Some(Action::ModalUp),
            KeyCode::Backspace => Some(Action::ModalBackspace),
            KeyCode::Char(c) => Some(Action::ModalInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::export::TriggerField;

    fn trigger() -> JobTriggerConfig {
        JobTriggerConfig {
            job_name: "Export events".to_string(),
            command: "export {date_from} {date_to}".to_string(),
            fields: vec![
                TriggerField {
                    key: "date_from".to_string(),
                    label: "Date from".to_string(),
                    default: "2024-01-01".to_string(),
                },
                TriggerField {
                    key: "date_to".to_string(),
                    label: "Date to".to_string(),
                    default: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_form_values() {
        let trigger = trigger();
        let mut values = initial_values(&trigger);
        assert_eq!(values, vec!["2024-01-01".to_string(), String::new()]);
        assert_eq!(missing_field(&trigger, &values), Some("Date to"));

        values[1] = " 2024-01-31 ".to_string();
        assert_eq!(missing_field(&trigger, &values), None);
        let rendered = trigger.render_command(&field_values(&trigger, &values));
        assert_eq!(rendered, "export 2024-01-01 2024-01-31");
    }
}
