//! Query response and execution state

use super::grid::Grid;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Type tag of a result column
///
/// The backend sends either `[name, type]` pairs or bare type labels; the
/// type label is always the last element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeTag {
    Parts(Vec<String>),
    Label(String),
}

impl TypeTag {
    pub fn label(&self) -> Option<&str> {
        match self {
            TypeTag::Parts(parts) => parts.last().map(String::as_str),
            TypeTag::Label(label) => Some(label.as_str()),
        }
    }
}

/// Result of executing a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeTag>,
    #[serde(default, alias = "rows")]
    pub results: Vec<Vec<Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl QueryResponse {
    /// Type label of the column at `index`, if the backend sent one
    pub fn type_label(&self, index: usize) -> Option<&str> {
        self.types.get(index).and_then(TypeTag::label)
    }
}

/// A response together with the grid derived from it
///
/// The grid is only ever built here, so it can never describe a different
/// response than the one it sits next to.
#[derive(Debug, Clone)]
pub struct ResultSet {
    response: QueryResponse,
    grid: Grid,
}

impl ResultSet {
    pub fn new(response: QueryResponse) -> Self {
        let grid = Grid::derive(&response);
        Self { response, grid }
    }

    pub fn response(&self) -> &QueryResponse {
        &self.response
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

/// Execution state of the current query
#[derive(Debug, Default)]
pub struct QueryState {
    pub result: Option<ResultSet>,
    pub loading: bool,
    /// Raw error value of the last run
    pub error: Option<String>,
    pub cancelled: bool,
    /// Identifier of the run being polled
    pub query_id: Option<String>,
    pub started_at: Option<Instant>,
    pub last_duration: Option<Duration>,
    /// `result` came from the latest run rather than an earlier one
    result_current: bool,
}

pub const CANCELLED_MESSAGE: &str = "The query was cancelled";

impl QueryState {
    pub fn response(&self) -> Option<&QueryResponse> {
        self.result.as_ref().map(ResultSet::response)
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.result.as_ref().map(ResultSet::grid)
    }

    /// Mark a new run as started
    pub fn begin(&mut self, query_id: String) {
        self.loading = true;
        self.error = None;
        self.cancelled = false;
        self.result_current = false;
        self.query_id = Some(query_id);
        self.started_at = Some(Instant::now());
    }

    /// Replace the response; the grid is re-derived
    pub fn succeed(&mut self, response: QueryResponse) {
        self.finish();
        self.error = response.error.clone();
        self.result = Some(ResultSet::new(response));
        self.result_current = true;
    }

    pub fn fail(&mut self, error: String) {
        self.finish();
        self.error = Some(error);
    }

    pub fn cancel(&mut self) {
        self.finish();
        self.cancelled = true;
        self.error = Some(CANCELLED_MESSAGE.to_string());
    }

    fn finish(&mut self) {
        self.loading = false;
        self.last_duration = self.started_at.take().map(|start| start.elapsed());
    }

    /// Time spent on the running query, or on the last finished one
    pub fn elapsed(&self) -> Option<Duration> {
        match self.started_at {
            Some(start) if self.loading => Some(start.elapsed()),
            _ => self.last_duration,
        }
    }

    /// Message for the error panel, `None` when there is no error
    ///
    /// A cancellation wins over anything the backend reported, and an error
    /// embedded in the latest run's response wins over the raw error value.
    /// A response kept from an earlier run never supplies the message.
    pub fn error_message(&self) -> Option<String> {
        let raw = self.error.as_ref()?;
        if self.cancelled {
            return Some(CANCELLED_MESSAGE.to_string());
        }
        let embedded = self
            .response()
            .filter(|_| self.result_current)
            .and_then(|r| r.error.as_ref());
        if let Some(embedded) = embedded {
            return Some(embedded.clone());
        }
        Some(raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_with_pair_types() {
        let json = r#"{
            "columns": ["event", "count"],
            "types": [["event", "String"], ["count", "UInt64"]],
            "results": [["$pageview", 10]],
            "query_id": "q-1"
        }"#;
        let response: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.type_label(0), Some("String"));
        assert_eq!(response.type_label(1), Some("UInt64"));
        assert_eq!(response.type_label(2), None);
        assert_eq!(response.results[0][1], json!(10));
    }

    #[test]
    fn test_parse_response_with_bare_types() {
        let json = r#"{ "columns": ["a"], "types": [["Int"]], "rows": [[1]] }"#;
        let response: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.type_label(0), Some("Int"));
        assert_eq!(response.results.len(), 1);

        let json = r#"{ "columns": ["a"], "types": ["Bool"] }"#;
        let response: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.type_label(0), Some("Bool"));
    }

    #[test]
    fn test_error_message_prefers_cancellation() {
        let mut state = QueryState::default();
        state.begin("q".to_string());
        state.cancel();
        assert_eq!(state.error_message().as_deref(), Some(CANCELLED_MESSAGE));
        assert!(!state.loading);
    }

    #[test]
    fn test_error_message_prefers_embedded_error() {
        let mut state = QueryState::default();
        state.succeed(QueryResponse {
            error: Some("Unknown table `evnts`".to_string()),
            ..Default::default()
        });
        assert_eq!(
            state.error_message().as_deref(),
            Some("Unknown table `evnts`")
        );
    }

    #[test]
    fn test_failed_run_ignores_earlier_embedded_error() {
        let mut state = QueryState::default();
        state.begin("q1".to_string());
        state.succeed(QueryResponse {
            error: Some("Unknown table evnts".to_string()),
            ..Default::default()
        });
        state.begin("q2".to_string());
        state.fail("Command exited with status 2: connection refused".to_string());

        assert_eq!(
            state.error_message().as_deref(),
            Some("Command exited with status 2: connection refused")
        );
        // The earlier response is still around for the grid
        assert!(state.response().is_some());
    }

    #[test]
    fn test_error_message_falls_back_to_raw_error() {
        let mut state = QueryState::default();
        state.fail("exit status 2".to_string());
        assert_eq!(state.error_message().as_deref(), Some("exit status 2"));
    }

    #[test]
    fn test_no_error_means_no_message() {
        let mut state = QueryState::default();
        state.succeed(QueryResponse::default());
        assert!(state.error_message().is_none());
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let mut state = QueryState::default();
        state.fail("boom".to_string());
        state.begin("q-2".to_string());
        assert!(state.error.is_none());
        assert!(state.loading);
        assert_eq!(state.query_id.as_deref(), Some("q-2"));
    }

    #[test]
    fn test_grid_follows_response() {
        let mut state = QueryState::default();
        state.succeed(QueryResponse {
            columns: vec!["a".to_string()],
            results: vec![vec![json!(1)]],
            ..Default::default()
        });
        assert_eq!(state.grid().unwrap().columns[0].key, "a");

        state.succeed(QueryResponse {
            columns: vec!["b".to_string(), "c".to_string()],
            results: vec![],
            ..Default::default()
        });
        let grid = state.grid().unwrap();
        assert_eq!(grid.columns.len(), 2);
        assert_eq!(grid.columns[0].key, "b");
        assert!(grid.rows.is_empty());
    }
}
