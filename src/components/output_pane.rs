//! Query output pane
//!
//! Tab strip, top bar actions, the content chosen by `OutputContent` and a
//! footer with the run time and row count. The active tab is local state;
//! everything else comes in through `OutputRenderContext`.

use crate::action::Action;
use crate::component::Component;
use crate::components::data_grid::DataGrid;
use crate::components::info::InfoPanel;
use crate::components::lineage::LineagePanel;
use crate::components::visualization::{VisualizationPanel, VisualizationRenderContext};
use crate::model::grid::Grid;
use crate::model::output::{ButtonState, Capabilities, OutputContent, OutputTab, ResponseState, TopBar};
use crate::model::response::QueryState;
use crate::model::ui::spinner;
use crate::model::visualization::VisualizationState;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};
use std::time::Duration;

/// Everything the output pane reads
pub struct OutputRenderContext<'a> {
    pub caps: &'a Capabilities,
    pub query: &'a QueryState,
    pub top_bar: &'a TopBar,
    pub visualization: &'a VisualizationState,
    pub metadata_loading: bool,
    pub tick: usize,
    pub dark_mode: bool,
}

/// Tab labels; Info and Lineage carry a spinner while metadata loads
pub fn tab_titles(caps: &Capabilities, metadata_loading: bool, tick: usize) -> Vec<String> {
    OutputTab::available(caps)
        .into_iter()
        .map(|tab| {
            if metadata_loading && tab.shows_metadata_spinner() {
                format!("{} {}", tab.label(), spinner(tick))
            } else {
                tab.label().to_string()
            }
        })
        .collect()
}

fn button_spans(key: &str, button: &ButtonState, tick: usize) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if button.is_disabled() {
        spans.push(Span::styled(
            format!("[{}] {}", key, button.label),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        ));
        spans.push(Span::styled(
            format!(" ({})", button.reason_text()),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(
            format!("[{}] ", key),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            button.label.to_string(),
            Style::default().fg(Color::White),
        ));
    }
    if button.loading {
        spans.push(Span::styled(
            format!(" {}", spinner(tick)),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans
}

/// Export, view and run buttons
pub fn top_bar_line(top_bar: &TopBar, tick: usize) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    if let Some(export) = &top_bar.export {
        spans.extend(button_spans("x", export, tick));
        spans.push(Span::raw("   "));
    }
    spans.extend(button_spans("S", &top_bar.view, tick));
    spans.push(Span::raw("   "));
    spans.extend(button_spans("r", &top_bar.run, tick));
    Line::from(spans)
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{}m {:02}s", duration.as_secs() / 60, duration.as_secs() % 60)
    }
}

/// Elapsed time and row preview
pub fn footer_line(query: &QueryState) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(elapsed) = query.elapsed() {
        spans.push(Span::styled(
            format!(" ⏱ {}", format_duration(elapsed)),
            Style::default().fg(Color::Gray),
        ));
    }
    if let Some(response) = query.response() {
        let mut text = format!("  Showing {} rows", response.results.len());
        if response.has_more {
            text.push_str(" (more available)");
        }
        spans.push(Span::styled(text, Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

/// Output pane with its tab sub-views
#[derive(Default)]
pub struct QueryOutputView {
    pub active_tab: OutputTab,
    pub results: DataGrid,
    pub visualization: VisualizationPanel,
    pub info: InfoPanel,
    pub lineage: LineagePanel,
}

impl QueryOutputView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_tab(&mut self, tab: OutputTab) {
        self.active_tab = tab;
    }

    /// Rebuild both grid views from a new response's grid
    pub fn set_grid(&mut self, grid: &Grid, dark_mode: bool) {
        self.results.reset_scroll();
        self.results.set_grid(grid, dark_mode);
        self.visualization.table.reset_scroll();
        self.visualization.table.set_grid(grid, dark_mode);
    }

    /// Content for the current tab and response
    pub fn content(&self, ctx: &OutputRenderContext) -> OutputContent {
        OutputContent::resolve(self.active_tab, &ResponseState::of(ctx.query), ctx.caps)
    }

    pub fn draw_tabs(&self, frame: &mut Frame, area: Rect, ctx: &OutputRenderContext) {
        let tabs = OutputTab::available(ctx.caps);
        let selected = tabs.iter().position(|t| *t == self.active_tab).unwrap_or(0);
        let widget = Tabs::new(tab_titles(ctx.caps, ctx.metadata_loading, ctx.tick))
            .select(selected)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
            .divider("│");
        frame.render_widget(widget, area);
    }

    /// Tab strip and top bar share the bordered header area
    pub fn draw_header(&self, frame: &mut Frame, area: Rect, ctx: &OutputRenderContext) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let tabs_width = tab_titles(ctx.caps, ctx.metadata_loading, ctx.tick)
            .iter()
            .map(|t| t.chars().count() as u16 + 3)
            .sum::<u16>()
            .min(inner.width);
        self.draw_tabs(
            frame,
            Rect::new(inner.x, inner.y, tabs_width, inner.height),
            ctx,
        );

        let bar_area = Rect::new(
            inner.x + tabs_width,
            inner.y,
            inner.width.saturating_sub(tabs_width),
            inner.height,
        );
        frame.render_widget(
            Paragraph::new(top_bar_line(ctx.top_bar, ctx.tick)).alignment(Alignment::Right),
            bar_area,
        );
    }

    pub fn draw_content(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        ctx: &OutputRenderContext,
    ) -> Result<()> {
        match self.content(ctx) {
            OutputContent::ErrorPanel { message } => {
                let paragraph = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        message,
                        Style::default().fg(Color::Red),
                    )),
                ])
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red))
                        .title(" Error ")
                        .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                );
                frame.render_widget(paragraph, area);
            }
            OutputContent::Loading { query_id } => {
                let mut lines = vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        format!("{} Running query...", spinner(ctx.tick)),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )),
                ];
                if let Some(id) = query_id {
                    lines.push(Line::from(Span::styled(
                        format!("query {}", id),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.push(Line::from(Span::styled(
                    "Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                )));
                let paragraph = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(paragraph, area);
            }
            OutputContent::Placeholder(text) => {
                let top = area.height.saturating_sub(3) / 2;
                let mut lines: Vec<Line> = (0..top).map(|_| Line::from("")).collect();
                lines.push(Line::from(Span::styled(
                    text,
                    Style::default().fg(Color::DarkGray),
                )));
                let paragraph = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(Color::DarkGray)),
                    );
                frame.render_widget(paragraph, area);
            }
            OutputContent::Grid => self.results.draw(frame, area)?,
            OutputContent::Visualization { loading } => {
                if let Some(grid) = ctx.query.grid() {
                    let viz_ctx = VisualizationRenderContext {
                        grid,
                        state: ctx.visualization,
                        loading,
                        tick: ctx.tick,
                        dark_mode: ctx.dark_mode,
                    };
                    self.visualization.draw_with_context(frame, area, &viz_ctx)?;
                }
            }
            OutputContent::Info => {
                if ctx.metadata_loading {
                    self.info.draw_loading(frame, area, ctx.tick);
                } else {
                    self.info.draw(frame, area)?;
                }
            }
            OutputContent::Lineage => {
                if ctx.metadata_loading {
                    self.lineage.draw_loading(frame, area, ctx.tick);
                } else {
                    self.lineage.draw(frame, area)?;
                }
            }
        }
        Ok(())
    }

    pub fn draw_footer(&self, frame: &mut Frame, area: Rect, ctx: &OutputRenderContext) {
        frame.render_widget(Paragraph::new(footer_line(ctx.query)), area);
    }
}

impl Component for QueryOutputView {
    /// Keys of the query screen in normal mode
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Tab => Some(Action::NextTab),
            KeyCode::BackTab => Some(Action::PrevTab),
            KeyCode::Char('r') | KeyCode::Enter if ctrl => Some(Action::RunQuery),
            KeyCode::Char('d') if ctrl => Some(Action::PageDown),
            KeyCode::Char('u') if ctrl => Some(Action::PageUp),
            KeyCode::Char('r') => Some(Action::RunQuery),
            KeyCode::Esc => Some(Action::CancelQuery),
            KeyCode::Char('e') | KeyCode::Char('i') => Some(Action::EnterEditMode),
            KeyCode::Char('v') => Some(Action::CycleVisualization),
            KeyCode::Char('s') => Some(Action::ToggleChartSettings),
            KeyCode::Char('S') => Some(Action::SaveAsView),
            KeyCode::Char('I') => Some(Action::SaveAsInsight),
            KeyCode::Char('n') => Some(Action::CreateInsight),
            KeyCode::Char('x') => Some(Action::OpenExportMenu),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::NextItem),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::PrevItem),
            KeyCode::Char('g') => Some(Action::FirstItem),
            KeyCode::Char('G') => Some(Action::LastItem),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            _ => None,
        };
        Ok(action)
    }

    /// Scrolling goes to the sub-view of the active tab
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match self.active_tab {
            OutputTab::Results => self.results.update(action),
            OutputTab::Visualization => self.visualization.table.update(action),
            OutputTab::Info => self.info.update(action),
            OutputTab::Lineage => self.lineage.update(action),
        }
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the render context, see draw_header / draw_content / draw_footer
        Ok(())
    }
}
