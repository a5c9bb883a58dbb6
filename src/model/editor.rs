//! SQL editor session state and validation

use super::saved::SavedView;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Plain identifiers need no alias to be usable as a view column
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").unwrap());

/// `{variables.name}` placeholders inside a query
static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{variables\.([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

pub const UNALIASED_FIELDS_REASON: &str = "Some fields may need an alias";

/// Source handed to the results exporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContext {
    pub source: String,
    pub file_stem: String,
}

/// A variable referenced by the current query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundVariable {
    pub name: String,
    pub value: Option<String>,
}

/// State of the editor session feeding the output pane
#[derive(Debug, Default)]
pub struct EditorState {
    /// Lines of the query being edited
    pub lines: Vec<String>,
    /// Saved view this query was opened from or saved as
    pub editing_view: Option<SavedView>,
    pub metadata_loading: bool,
    /// Key scoping metadata panels to this editor session
    pub editor_key: String,
    /// Known variable values
    pub variable_values: BTreeMap<String, String>,
}

impl EditorState {
    pub fn new(editor_key: impl Into<String>) -> Self {
        Self {
            lines: vec![String::new()],
            editor_key: editor_key.into(),
            ..Default::default()
        }
    }

    pub fn query(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_query(&mut self, query: &str) {
        self.lines = query.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(line) = self.lines.last_mut() {
            line.push(c);
        }
    }

    pub fn newline(&mut self) {
        self.lines.push(String::new());
    }

    pub fn backspace(&mut self) {
        let Some(line) = self.lines.last_mut() else {
            return;
        };
        if line.pop().is_none() && self.lines.len() > 1 {
            self.lines.pop();
        }
    }

    pub fn clear(&mut self) {
        self.lines = vec![String::new()];
    }

    /// Current validation error, `None` when the query can run
    pub fn validation_error(&self) -> Option<String> {
        validate_query(&self.query())
    }

    /// Export context exists once there is a query to export from
    pub fn export_context(&self) -> Option<ExportContext> {
        let source = self.query();
        if source.trim().is_empty() {
            return None;
        }
        let file_stem = match &self.editing_view {
            Some(view) => sanitize_file_stem(&view.name),
            None => "query_results".to_string(),
        };
        Some(ExportContext { source, file_stem })
    }

    /// Variables referenced by the query, in order of first use
    pub fn variables(&self) -> Vec<BoundVariable> {
        let query = self.query();
        let mut seen = Vec::new();
        for caps in VARIABLE_REGEX.captures_iter(&query) {
            let name = caps[1].to_string();
            if !seen.iter().any(|v: &BoundVariable| v.name == name) {
                let value = self.variable_values.get(&name).cloned();
                seen.push(BoundVariable { name, value });
            }
        }
        seen
    }

    /// Query text with known variable values substituted
    ///
    /// Placeholders without a value are left in place for the backend.
    pub fn resolved_query(&self) -> String {
        VARIABLE_REGEX
            .replace_all(&self.query(), |caps: &regex::Captures| {
                match self.variable_values.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Check a query for problems that make running it pointless
pub fn validate_query(query: &str) -> Option<String> {
    if query.trim().is_empty() {
        return Some("Query is empty".to_string());
    }

    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut chars = query.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Some("Unbalanced parentheses".to_string());
                    }
                }
                _ => {}
            },
        }
    }

    if quote.is_some() {
        return Some("Unterminated string literal".to_string());
    }
    if depth != 0 {
        return Some("Unbalanced parentheses".to_string());
    }
    None
}

/// Columns whose names are expressions rather than identifiers
pub fn unaliased_columns(columns: &[String]) -> Vec<&str> {
    columns
        .iter()
        .filter(|c| !IDENTIFIER_REGEX.is_match(c))
        .map(String::as_str)
        .collect()
}

/// A result can be saved as a view when every column is a plain identifier
pub fn is_valid_view(columns: &[String]) -> bool {
    unaliased_columns(columns).is_empty()
}

fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if stem.trim_matches('_').is_empty() {
        "query_results".to_string()
    } else {
        stem
    }
}
