//! Result grid derivation
//!
//! Turns a query response into grid columns and keyed rows. Cell values
//! go through a renderer chosen by the column's semantic type.

use super::response::QueryResponse;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Semantic type of a column, parsed once from the backend type label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Boolean,
    Integer,
    Float,
    Text,
    DateTime,
    Nested,
    Unknown,
}

impl SemanticType {
    /// Parse a type label such as `Nullable(Bool)` or `DateTime64(6, 'UTC')`
    pub fn parse(label: &str) -> Self {
        let inner = unwrap_modifiers(label.trim());
        let name = inner.split('(').next().unwrap_or(inner).trim();

        match name {
            "Bool" | "Boolean" => SemanticType::Boolean,
            n if n.starts_with("Int") || n.starts_with("UInt") => SemanticType::Integer,
            n if n.starts_with("Float") || n.starts_with("Decimal") => SemanticType::Float,
            "String" | "FixedString" | "UUID" | "Enum8" | "Enum16" => SemanticType::Text,
            n if n.starts_with("Date") => SemanticType::DateTime,
            "Array" | "Tuple" | "Map" | "JSON" | "Object" => SemanticType::Nested,
            _ => SemanticType::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SemanticType::Boolean => "boolean",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Text => "text",
            SemanticType::DateTime => "datetime",
            SemanticType::Nested => "nested",
            SemanticType::Unknown => "unknown",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SemanticType::Integer | SemanticType::Float)
    }
}

fn unwrap_modifiers(label: &str) -> &str {
    for wrapper in ["Nullable(", "LowCardinality("] {
        if let Some(rest) = label.strip_prefix(wrapper) {
            if let Some(inner) = rest.strip_suffix(')') {
                return unwrap_modifiers(inner.trim());
            }
        }
    }
    label
}

/// Converts a raw cell value into what the grid holds for it
pub type CellRenderer = fn(&Value) -> Value;

/// Objects and arrays become their JSON text; the grid only shows scalars
pub fn render_default(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

/// Booleans become "true"/"false" so they are not shown as blanks; null stays null
pub fn render_boolean(value: &Value) -> Value {
    match render_default(value) {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

/// Lookup of cell renderers by semantic type
#[derive(Debug, Clone)]
pub struct RendererMap {
    renderers: HashMap<SemanticType, CellRenderer>,
    fallback: CellRenderer,
}

impl Default for RendererMap {
    fn default() -> Self {
        let mut renderers: HashMap<SemanticType, CellRenderer> = HashMap::new();
        renderers.insert(SemanticType::Boolean, render_boolean);
        Self {
            renderers,
            fallback: render_default,
        }
    }
}

impl RendererMap {
    pub fn get(&self, ty: SemanticType) -> CellRenderer {
        self.renderers.get(&ty).copied().unwrap_or(self.fallback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub key: String,
    pub name: String,
    pub resizable: bool,
    pub semantic_type: SemanticType,
}

pub type GridRow = Map<String, Value>;

/// Columns and rows ready for the data grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
}

impl Grid {
    pub fn derive(response: &QueryResponse) -> Self {
        Self::derive_with(response, &RendererMap::default())
    }

    pub fn derive_with(response: &QueryResponse, renderers: &RendererMap) -> Self {
        let columns: Vec<GridColumn> = response
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| GridColumn {
                key: name.clone(),
                name: name.clone(),
                resizable: true,
                semantic_type: response
                    .type_label(i)
                    .map(SemanticType::parse)
                    .unwrap_or(SemanticType::Unknown),
            })
            .collect();

        let column_renderers: Vec<CellRenderer> = columns
            .iter()
            .map(|c| renderers.get(c.semantic_type))
            .collect();

        let rows = response
            .results
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (i, column) in columns.iter().enumerate() {
                    let raw = row.get(i).unwrap_or(&Value::Null);
                    object.insert(column.key.clone(), column_renderers[i](raw));
                }
                object
            })
            .collect();

        Grid { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Rows as display strings in column order; empty cells are ""
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| {
                        row.get(&c.key)
                            .and_then(cell_text)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

/// Text shown in a grid cell; `None` renders nothing
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response::TypeTag;
    use serde_json::json;

    fn response(columns: &[&str], types: &[&str], results: Vec<Vec<Value>>) -> QueryResponse {
        QueryResponse {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            types: types
                .iter()
                .map(|t| TypeTag::Parts(vec![t.to_string()]))
                .collect(),
            results,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_semantic_types() {
        assert_eq!(SemanticType::parse("Bool"), SemanticType::Boolean);
        assert_eq!(SemanticType::parse("Nullable(Bool)"), SemanticType::Boolean);
        assert_eq!(
            SemanticType::parse("LowCardinality(Nullable(String))"),
            SemanticType::Text
        );
        assert_eq!(SemanticType::parse("UInt64"), SemanticType::Integer);
        assert_eq!(SemanticType::parse("Int"), SemanticType::Integer);
        assert_eq!(SemanticType::parse("Float64"), SemanticType::Float);
        assert_eq!(
            SemanticType::parse("DateTime64(6, 'UTC')"),
            SemanticType::DateTime
        );
        assert_eq!(SemanticType::parse("Array(String)"), SemanticType::Nested);
        assert_eq!(SemanticType::parse("Whatever"), SemanticType::Unknown);
    }

    #[test]
    fn test_boolean_lookalike_names_are_not_boolean() {
        // only the type name decides, not a substring match
        assert_eq!(SemanticType::parse("BoolishString"), SemanticType::Unknown);
    }

    #[test]
    fn test_derive_grid_end_to_end() {
        let r = response(
            &["a", "b"],
            &["Int", "Bool"],
            vec![vec![json!(1), json!(true)], vec![json!(2), Value::Null]],
        );
        let grid = Grid::derive(&r);

        assert_eq!(grid.columns.len(), 2);
        assert_eq!(grid.columns[0].key, "a");
        assert_eq!(grid.columns[1].key, "b");
        assert!(grid.columns.iter().all(|c| c.resizable));

        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0]["a"], json!(1));
        assert_eq!(grid.rows[0]["b"], json!("true"));
        assert_eq!(grid.rows[1]["a"], json!(2));
        assert_eq!(grid.rows[1]["b"], Value::Null);
    }

    #[test]
    fn test_boolean_null_renders_nothing() {
        let r = response(&["flag"], &["Bool"], vec![vec![Value::Null], vec![json!(false)]]);
        let grid = Grid::derive(&r);
        assert_eq!(cell_text(&grid.rows[0]["flag"]), None);
        assert_eq!(cell_text(&grid.rows[1]["flag"]).as_deref(), Some("false"));
        assert_eq!(grid.display_rows(), vec![vec![""], vec!["false"]]);
    }

    #[test]
    fn test_object_cells_are_stringified() {
        let r = response(
            &["props", "n", "s"],
            &["String", "Int64", "String"],
            vec![vec![json!({"k": 1}), json!(5), json!("x")]],
        );
        let grid = Grid::derive(&r);
        assert_eq!(grid.rows[0]["props"], json!("{\"k\":1}"));
        assert_eq!(grid.rows[0]["n"], json!(5));
        assert_eq!(grid.rows[0]["s"], json!("x"));
    }

    #[test]
    fn test_array_cells_are_stringified() {
        let r = response(&["tags"], &["Array(String)"], vec![vec![json!(["a", "b"])]]);
        let grid = Grid::derive(&r);
        assert_eq!(grid.rows[0]["tags"], json!("[\"a\",\"b\"]"));
    }

    #[test]
    fn test_short_rows_fill_with_null() {
        let r = response(&["a", "b"], &["Int", "Int"], vec![vec![json!(1)]]);
        let grid = Grid::derive(&r);
        assert_eq!(grid.rows[0]["b"], Value::Null);
    }

    #[test]
    fn test_missing_types_use_default_renderer() {
        let r = QueryResponse {
            columns: vec!["x".to_string()],
            results: vec![vec![json!(true)]],
            ..Default::default()
        };
        let grid = Grid::derive(&r);
        assert_eq!(grid.columns[0].semantic_type, SemanticType::Unknown);
        assert_eq!(grid.rows[0]["x"], json!(true));
    }

    #[test]
    fn test_custom_renderer() {
        fn upper(value: &Value) -> Value {
            match value {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other.clone(),
            }
        }
        let r = response(&["s"], &["String"], vec![vec![json!("abc")]]);
        let mut map = RendererMap::default();
        map.renderers.insert(SemanticType::Text, upper);
        let grid = Grid::derive_with(&r, &map);
        assert_eq!(grid.rows[0]["s"], json!("ABC"));
    }

    #[test]
    fn test_empty_response_gives_empty_grid() {
        let grid = Grid::derive(&QueryResponse::default());
        assert!(grid.is_empty());
        assert!(grid.rows.is_empty());
    }
}
