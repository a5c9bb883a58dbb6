//! Visualization settings and chart data extraction

use super::grid::{Grid, SemanticType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a query's tabular result is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationType {
    #[default]
    Table,
    Line,
    Bar,
    Area,
    StackedBar,
    BoldNumber,
}

/// Chart flavours handled by the chart view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Area,
    StackedBar,
}

/// Which sub-view renders the visualization tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationView {
    Table,
    Chart(ChartKind),
    BoldNumber,
}

impl VisualizationType {
    pub fn all() -> [VisualizationType; 6] {
        [
            VisualizationType::Table,
            VisualizationType::Line,
            VisualizationType::Bar,
            VisualizationType::Area,
            VisualizationType::StackedBar,
            VisualizationType::BoldNumber,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            VisualizationType::Table => "Table",
            VisualizationType::Line => "Line chart",
            VisualizationType::Bar => "Bar chart",
            VisualizationType::Area => "Area chart",
            VisualizationType::StackedBar => "Stacked bar chart",
            VisualizationType::BoldNumber => "Big number",
        }
    }

    pub fn is_tabular(&self) -> bool {
        *self == VisualizationType::Table
    }

    pub fn view(&self) -> VisualizationView {
        match self {
            VisualizationType::Table => VisualizationView::Table,
            VisualizationType::Line => VisualizationView::Chart(ChartKind::Line),
            VisualizationType::Bar => VisualizationView::Chart(ChartKind::Bar),
            VisualizationType::Area => VisualizationView::Chart(ChartKind::Area),
            VisualizationType::StackedBar => VisualizationView::Chart(ChartKind::StackedBar),
            VisualizationType::BoldNumber => VisualizationView::BoldNumber,
        }
    }

    pub fn next(&self) -> VisualizationType {
        let all = Self::all();
        let index = all.iter().position(|t| t == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }
}

/// Visualization state owned by the output pane
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationState {
    pub visualization_type: VisualizationType,
    pub settings_open: bool,
    pub show_result_controls: bool,
}

impl Default for VisualizationState {
    fn default() -> Self {
        Self {
            visualization_type: VisualizationType::Table,
            settings_open: false,
            show_result_controls: true,
        }
    }
}

impl VisualizationState {
    pub fn toggle_settings(&mut self) {
        self.settings_open = !self.settings_open;
    }

    pub fn cycle_type(&mut self) {
        self.visualization_type = self.visualization_type.next();
    }

    /// "Create insight" is only offered alongside the result controls
    pub fn can_create_insight(&self) -> bool {
        self.show_result_controls
    }
}

/// A numeric series plotted against the x axis
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<f64>,
}

/// Data handed to the chart view
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub x_column: Option<String>,
    pub x_labels: Vec<String>,
    pub series: Vec<Series>,
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl ChartData {
    /// First non-numeric column is the x axis, every numeric column a series
    pub fn from_grid(grid: &Grid) -> Self {
        let x_column = grid
            .columns
            .iter()
            .find(|c| !c.semantic_type.is_numeric())
            .map(|c| c.key.clone());

        let x_labels = match &x_column {
            Some(key) => grid
                .rows
                .iter()
                .map(|row| {
                    row.get(key)
                        .and_then(super::grid::cell_text)
                        .unwrap_or_default()
                })
                .collect(),
            None => (1..=grid.rows.len()).map(|i| i.to_string()).collect(),
        };

        let series = grid
            .columns
            .iter()
            .filter(|c| c.semantic_type.is_numeric())
            .map(|c| Series {
                name: c.name.clone(),
                points: grid
                    .rows
                    .iter()
                    .map(|row| numeric(row.get(&c.key)).unwrap_or(0.0))
                    .collect(),
            })
            .collect();

        ChartData {
            x_column,
            x_labels,
            series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() || self.x_labels.is_empty()
    }

    /// Largest value, with series stacked when `stacked`
    pub fn max_value(&self, stacked: bool) -> f64 {
        let len = self.x_labels.len();
        (0..len)
            .map(|i| {
                let values = self.series.iter().map(|s| s.points.get(i).copied().unwrap_or(0.0));
                if stacked {
                    values.filter(|v| *v > 0.0).sum()
                } else {
                    values.fold(f64::MIN, f64::max)
                }
            })
            .fold(0.0, f64::max)
    }
}

/// Value shown by the big number view: first cell of the first row
pub fn bold_number(grid: &Grid) -> Option<String> {
    let column = grid.columns.first()?;
    let value = grid.rows.first()?.get(&column.key)?;
    match value {
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => group_thousands(i),
            None => n.to_string(),
        }),
        other => super::grid::cell_text(other),
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Columns that feed a chart, used by the settings panel
pub fn series_columns(grid: &Grid) -> Vec<(String, SemanticType)> {
    grid.columns
        .iter()
        .filter(|c| c.semantic_type.is_numeric())
        .map(|c| (c.name.clone(), c.semantic_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response::{QueryResponse, TypeTag};
    use serde_json::json;

    fn grid() -> Grid {
        Grid::derive(&QueryResponse {
            columns: vec!["day".into(), "views".into(), "clicks".into()],
            types: vec![
                TypeTag::Label("Date".into()),
                TypeTag::Label("UInt64".into()),
                TypeTag::Label("Float64".into()),
            ],
            results: vec![
                vec![json!("2024-01-01"), json!(1200), json!(3.5)],
                vec![json!("2024-01-02"), json!(800), json!(1.5)],
            ],
            ..Default::default()
        })
    }

    #[test]
    fn test_view_selection() {
        assert_eq!(VisualizationType::Table.view(), VisualizationView::Table);
        assert_eq!(
            VisualizationType::StackedBar.view(),
            VisualizationView::Chart(ChartKind::StackedBar)
        );
        assert_eq!(
            VisualizationType::BoldNumber.view(),
            VisualizationView::BoldNumber
        );
    }

    #[test]
    fn test_cycle_wraps() {
        let mut state = VisualizationState::default();
        for _ in 0..VisualizationType::all().len() {
            state.cycle_type();
        }
        assert_eq!(state.visualization_type, VisualizationType::Table);
    }

    #[test]
    fn test_settings_toggle_is_independent_of_type() {
        let mut state = VisualizationState::default();
        state.toggle_settings();
        state.cycle_type();
        assert!(state.settings_open);
        state.toggle_settings();
        assert!(!state.settings_open);
    }

    #[test]
    fn test_chart_data_from_grid() {
        let data = ChartData::from_grid(&grid());
        assert_eq!(data.x_column.as_deref(), Some("day"));
        assert_eq!(data.x_labels, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series[0].points, vec![1200.0, 800.0]);
        assert_eq!(data.max_value(false), 1200.0);
        assert_eq!(data.max_value(true), 1203.5);
    }

    #[test]
    fn test_bold_number_groups_thousands() {
        let g = Grid::derive(&QueryResponse {
            columns: vec!["total".into()],
            types: vec![TypeTag::Label("UInt64".into())],
            results: vec![vec![json!(1234567)]],
            ..Default::default()
        });
        assert_eq!(bold_number(&g).as_deref(), Some("1,234,567"));
        assert_eq!(group_thousands(-1000), "-1,000");
        assert_eq!(group_thousands(999), "999");
    }

    #[test]
    fn test_bold_number_without_rows() {
        let g = Grid::derive(&QueryResponse {
            columns: vec!["total".into()],
            ..Default::default()
        });
        assert_eq!(bold_number(&g), None);
    }
}
