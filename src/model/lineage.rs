//! Data models for query lineage

use super::saved::SavedView;
use regex::Regex;
use std::sync::LazyLock;

/// Table references following FROM / JOIN
static TABLE_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:from|join)\s+([A-Za-z_][A-Za-z0-9_.]*)").unwrap()
});

/// Kind of a lineage node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineageKind {
    Table,
    SavedView,
}

/// Represents a node in the lineage of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageNode {
    pub name: String,
    pub kind: LineageKind,
}

impl LineageNode {
    pub fn icon(&self) -> &str {
        match self.kind {
            LineageKind::Table => "🗄️",
            LineageKind::SavedView => "📊",
        }
    }
}

/// Tables referenced by a query, in order of first appearance
pub fn referenced_tables(query: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for caps in TABLE_REF_REGEX.captures_iter(query) {
        let name = caps[1].to_string();
        if !tables.contains(&name) {
            tables.push(name);
        }
    }
    tables
}

/// Upstream and downstream dependencies of the current query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryLineage {
    pub upstream: Vec<LineageNode>,
    pub downstream: Vec<LineageNode>,
}

impl QueryLineage {
    /// Build lineage for `query`
    ///
    /// Upstream nodes are the referenced tables, marked as saved views when a
    /// view of that name exists. Downstream nodes are saved views that read
    /// from `bound_view`.
    pub fn build(query: &str, bound_view: Option<&SavedView>, views: &[SavedView]) -> Self {
        let upstream = referenced_tables(query)
            .into_iter()
            .map(|name| {
                let kind = if views.iter().any(|v| v.name == name) {
                    LineageKind::SavedView
                } else {
                    LineageKind::Table
                };
                LineageNode { name, kind }
            })
            .collect();

        let downstream = match bound_view {
            Some(bound) => views
                .iter()
                .filter(|v| v.id != bound.id)
                .filter(|v| referenced_tables(&v.query).contains(&bound.name))
                .map(|v| LineageNode {
                    name: v.name.clone(),
                    kind: LineageKind::SavedView,
                })
                .collect(),
            None => Vec::new(),
        };

        QueryLineage {
            upstream,
            downstream,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upstream.is_empty() && self.downstream.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn view(id: &str, name: &str, query: &str) -> SavedView {
        SavedView {
            id: id.to_string(),
            name: name.to_string(),
            query: query.to_string(),
            columns: Vec::new(),
            types: Vec::new(),
            created_at: Local::now(),
            updated_at: Local::now(),
        }
    }

    #[test]
    fn test_referenced_tables() {
        let query = "SELECT e.event FROM events e\nLEFT JOIN persons p ON p.id = e.person_id \
                     join events x on true";
        assert_eq!(referenced_tables(query), vec!["events", "persons"]);
    }

    #[test]
    fn test_dotted_table_names() {
        assert_eq!(
            referenced_tables("select * from stripe.charges"),
            vec!["stripe.charges"]
        );
    }

    #[test]
    fn test_build_lineage() {
        let daily = view("1", "daily_events", "select * from events");
        let weekly = view("2", "weekly_events", "select * from daily_events");
        let views = vec![daily.clone(), weekly];

        let lineage = QueryLineage::build("select * from events join daily_events", Some(&daily), &views);
        assert_eq!(
            lineage.upstream,
            vec![
                LineageNode {
                    name: "events".into(),
                    kind: LineageKind::Table
                },
                LineageNode {
                    name: "daily_events".into(),
                    kind: LineageKind::SavedView
                },
            ]
        );
        assert_eq!(lineage.downstream.len(), 1);
        assert_eq!(lineage.downstream[0].name, "weekly_events");
    }

    #[test]
    fn test_no_lineage() {
        let lineage = QueryLineage::build("select 1", None, &[]);
        assert!(lineage.is_empty());
    }
}
