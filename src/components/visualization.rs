//! Visualization tab
//!
//! Picks a sub-view from the visualization type: the data grid for tables,
//! a ratatui chart for line/bar/area/stacked bar, or a big number. The
//! settings sidebar and the result controls line are optional.

use crate::components::data_grid::DataGrid;
use crate::components::layout::split_visualization;
use crate::component::Component;
use crate::model::grid::Grid;
use crate::model::ui::spinner;
use crate::model::visualization::{
    bold_number, series_columns, ChartData, ChartKind, VisualizationState, VisualizationType,
    VisualizationView,
};
use anyhow::Result;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
];

fn series_color(i: usize) -> Color {
    SERIES_COLORS[i % SERIES_COLORS.len()]
}

/// What the visualization tab draws from
pub struct VisualizationRenderContext<'a> {
    pub grid: &'a Grid,
    pub state: &'a VisualizationState,
    pub loading: bool,
    pub tick: usize,
    pub dark_mode: bool,
}

/// Result controls under the visualization
pub fn result_controls_line(state: &VisualizationState) -> Line<'static> {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut spans = vec![
        Span::styled(" [v] ", key),
        Span::raw(format!("Type: {}", state.visualization_type.label())),
        Span::styled("  [s] ", key),
        Span::raw(if state.settings_open {
            "Hide settings"
        } else {
            "Chart settings"
        }),
    ];
    if state.can_create_insight() {
        spans.push(Span::styled("  [n] ", key));
        spans.push(Span::raw("Create insight"));
    }
    Line::from(spans)
}

/// Settings sidebar: type list, x axis and series columns
pub fn settings_lines(grid: &Grid, state: &VisualizationState) -> Vec<Line<'static>> {
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled("Type", heading))];
    for ty in VisualizationType::all() {
        let current = ty == state.visualization_type;
        lines.push(Line::from(Span::styled(
            format!("{} {}", if current { "●" } else { "○" }, ty.label()),
            if current {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            },
        )));
    }

    let data = ChartData::from_grid(grid);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("X axis", heading)));
    lines.push(Line::from(
        data.x_column.unwrap_or_else(|| "row number".to_string()),
    ));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Series", heading)));
    let series = series_columns(grid);
    if series.is_empty() {
        lines.push(Line::from(Span::styled(
            "No numeric columns",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, (name, ty)) in series.into_iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(series_color(i))),
            Span::raw(name),
            Span::styled(format!(" ({})", ty.label()), Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines
}

/// Owns the table sub-view so its scroll survives redraws
#[derive(Default)]
pub struct VisualizationPanel {
    pub table: DataGrid,
}

impl VisualizationPanel {
    pub fn draw_with_context(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        ctx: &VisualizationRenderContext,
    ) -> Result<()> {
        let area = if ctx.loading {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(0)])
                .split(area);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("{} Refreshing results...", spinner(ctx.tick)),
                    Style::default().fg(Color::Yellow),
                )),
                chunks[0],
            );
            chunks[1]
        } else {
            area
        };

        let (sidebar, main, controls) = split_visualization(
            area,
            ctx.state.settings_open,
            ctx.state.show_result_controls,
        );

        if let Some(sidebar) = sidebar {
            let paragraph = Paragraph::new(settings_lines(ctx.grid, ctx.state)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(" Settings "),
            );
            frame.render_widget(paragraph, sidebar);
        }

        match ctx.state.visualization_type.view() {
            VisualizationView::Table => self.table.draw(frame, main)?,
            VisualizationView::Chart(kind) => draw_chart(frame, main, ctx.grid, kind),
            VisualizationView::BoldNumber => {
                draw_bold_number(frame, main, ctx.grid, ctx.dark_mode)
            }
        }

        if let Some(controls) = controls {
            frame.render_widget(Paragraph::new(result_controls_line(ctx.state)), controls);
        }

        Ok(())
    }
}

fn chart_block(kind: ChartKind) -> Block<'static> {
    let title = match kind {
        ChartKind::Line => " Line chart ",
        ChartKind::Bar => " Bar chart ",
        ChartKind::Area => " Area chart ",
        ChartKind::StackedBar => " Stacked bar chart ",
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

fn draw_chart(frame: &mut Frame, area: Rect, grid: &Grid, kind: ChartKind) {
    let data = ChartData::from_grid(grid);
    if data.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "Nothing to chart: the result has no numeric columns",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center)
        .block(chart_block(kind));
        frame.render_widget(paragraph, area);
        return;
    }

    if kind == ChartKind::Bar {
        draw_bar_chart(frame, area, &data);
        return;
    }

    let stacked = kind == ChartKind::StackedBar;
    let graph_type = match kind {
        ChartKind::Line => GraphType::Line,
        _ => GraphType::Bar,
    };

    // Stacked series are cumulative; the tallest is drawn first so the
    // lower layers stay visible
    let mut points: Vec<Vec<(f64, f64)>> = Vec::with_capacity(data.series.len());
    let mut running = vec![0.0; data.x_labels.len()];
    for series in &data.series {
        let layer = series
            .points
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if stacked {
                    running[i] += v.max(0.0);
                    (i as f64, running[i])
                } else {
                    (i as f64, *v)
                }
            })
            .collect();
        points.push(layer);
    }

    let mut datasets: Vec<Dataset> = data
        .series
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (series, layer))| {
            Dataset::default()
                .name(series.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(graph_type)
                .style(Style::default().fg(series_color(i)))
                .data(layer)
        })
        .collect();
    if stacked {
        datasets.reverse();
    }

    let max = data.max_value(stacked).max(1.0);
    let last_x = data.x_labels.len().saturating_sub(1).max(1) as f64;
    let x_labels = match (data.x_labels.first(), data.x_labels.last()) {
        (Some(first), Some(last)) => vec![Span::raw(first.clone()), Span::raw(last.clone())],
        _ => Vec::new(),
    };

    let chart = Chart::new(datasets)
        .block(chart_block(kind))
        .x_axis(
            Axis::default()
                .title(data.x_column.clone().unwrap_or_default())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, last_x])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", max / 2.0)),
                    Span::raw(format!("{:.0}", max)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn draw_bar_chart(frame: &mut Frame, area: Rect, data: &ChartData) {
    let groups: Vec<BarGroup> = data
        .x_labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let bars: Vec<Bar> = data
                .series
                .iter()
                .enumerate()
                .map(|(s, series)| {
                    let value = series.points.get(i).copied().unwrap_or(0.0).max(0.0);
                    Bar::default()
                        .value(value.round() as u64)
                        .style(Style::default().fg(series_color(s)))
                })
                .collect();
            BarGroup::default()
                .label(Line::from(label.clone()))
                .bars(&bars)
        })
        .collect();

    let mut chart = BarChart::default()
        .block(chart_block(ChartKind::Bar))
        .bar_width(3)
        .bar_gap(1)
        .group_gap(2);
    for group in groups {
        chart = chart.data(group);
    }
    frame.render_widget(chart, area);
}

fn draw_bold_number(frame: &mut Frame, area: Rect, grid: &Grid, dark_mode: bool) {
    let (text, label) = match bold_number(grid) {
        Some(value) => (
            value,
            grid.columns.first().map(|c| c.name.clone()).unwrap_or_default(),
        ),
        None => ("–".to_string(), "No value".to_string()),
    };

    let top = area.height.saturating_sub(4) / 2;
    let mut lines: Vec<Line> = (0..top).map(|_| Line::from("")).collect();
    lines.push(Line::from(Span::styled(
        text,
        Style::default()
            .fg(if dark_mode { Color::Cyan } else { Color::Blue })
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        label,
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
