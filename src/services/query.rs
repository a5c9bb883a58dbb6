//! Query execution through the configured query command

use super::job_runner::{JobOutcome, JobRunner};
use crate::model::response::QueryResponse;
use anyhow::Result;

/// Runs queries one at a time and reports their responses
#[derive(Default)]
pub struct QueryRunner {
    command: String,
    runner: JobRunner,
    query_id: Option<String>,
}

impl QueryRunner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            runner: JobRunner::new(),
            query_id: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Start a run and return its query id
    pub fn run(&mut self, sql: &str) -> Result<String> {
        if self.command.trim().is_empty() {
            anyhow::bail!("No query_command configured");
        }

        let query_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(query_id = %query_id, "Running query");
        self.runner.spawn(&self.command, Some(sql.to_string()));
        self.query_id = Some(query_id.clone());
        Ok(query_id)
    }

    /// Poll the running query; `Err` carries the raw error value
    pub fn poll(&mut self) -> Option<std::result::Result<QueryResponse, String>> {
        let result = self.runner.poll()?;
        let query_id = self.query_id.take();

        let response = result.and_then(|outcome| parse_outcome(&outcome));
        let response = response.map(|mut r| {
            if r.query_id.is_none() {
                r.query_id = query_id.clone();
            }
            r
        });

        match &response {
            Ok(r) => tracing::info!(
                query_id = query_id.as_deref().unwrap_or("-"),
                rows = r.results.len(),
                "Query finished"
            ),
            Err(e) => tracing::warn!(
                query_id = query_id.as_deref().unwrap_or("-"),
                "Query failed: {}",
                e
            ),
        }
        Some(response)
    }

    /// Kill the running query; nothing is reported for it
    pub fn cancel(&mut self) {
        if let Some(query_id) = self.query_id.take() {
            tracing::info!(query_id = %query_id, "Query cancelled");
        }
        self.runner.clear();
    }
}

/// Interpret the command output as a response
pub fn parse_outcome(outcome: &JobOutcome) -> std::result::Result<QueryResponse, String> {
    if !outcome.success() {
        return Err(outcome.failure_message());
    }
    serde_json::from_str::<QueryResponse>(outcome.stdout.trim())
        .map_err(|e| format!("Could not parse query response: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(code: i32, stdout: &str) -> JobOutcome {
        JobOutcome {
            exit_code: Some(code),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_parse_successful_outcome() {
        let response =
            parse_outcome(&outcome(0, r#"{"columns":["n"],"results":[[1]]}"#)).unwrap();
        assert_eq!(response.columns, vec!["n"]);
        assert_eq!(response.results[0][0], json!(1));
    }

    #[test]
    fn test_parse_failed_outcome() {
        let err = parse_outcome(&outcome(1, "")).unwrap_err();
        assert_eq!(err, "Command exited with status 1");
    }

    #[test]
    fn test_parse_garbage_output() {
        let err = parse_outcome(&outcome(0, "not json")).unwrap_err();
        assert!(err.starts_with("Could not parse query response"));
    }

    #[test]
    fn test_run_requires_command() {
        let mut runner = QueryRunner::new("");
        assert!(runner.run("select 1").is_err());
        assert!(!runner.is_running());
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_run_and_poll() {
        let mut runner =
            QueryRunner::new(r#"cat > /dev/null; echo '{"columns":["a"],"results":[[true]]}'"#);
        let query_id = runner.run("select true as a").unwrap();

        let mut response = None;
        for _ in 0..200 {
            if let Some(r) = runner.poll() {
                response = Some(r);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let response = response.expect("query finished").unwrap();
        assert_eq!(response.query_id.as_deref(), Some(query_id.as_str()));
        assert_eq!(response.results[0][0], json!(true));
    }

    #[test]
    fn test_cancel_discards_job() {
        let mut runner = QueryRunner::new("sleep 5");
        runner.run("select 1").unwrap();
        runner.cancel();
        assert!(!runner.is_running());
        assert!(runner.poll().is_none());
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_cancel_stops_query_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let mut runner =
            QueryRunner::new(format!("cat >/dev/null; sleep 1; touch {}", marker.display()));
        runner.run("select 1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(200));
        runner.cancel();

        std::thread::sleep(std::time::Duration::from_millis(1500));
        assert!(!marker.exists());
    }
}
