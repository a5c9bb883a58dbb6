//! Historical export records and the export trigger
//!
//! Records are read from a JSON file written by the export backend. The
//! file is reloaded periodically on a background thread.

use super::job_runner::JobRunner;
use crate::model::export::{ExportRecord, ExportsState};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportsFile {
    List(Vec<ExportRecord>),
    Paged { results: Vec<ExportRecord> },
}

/// Load export records from a JSON array or a `{ "results": [...] }` page
pub fn load_export_records(path: &Path) -> Result<Vec<ExportRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read exports from {}", path.display()))?;
    let file: ExportsFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse exports in {}", path.display()))?;
    Ok(match file {
        ExportsFile::List(records) => records,
        ExportsFile::Paged { results } => results,
    })
}

/// Keeps the export list fresh and starts new exports
pub struct ExportsService {
    path: Option<PathBuf>,
    refresh_every: Duration,
    last_refresh: Option<Instant>,
    pending: Option<Receiver<Result<Vec<ExportRecord>, String>>>,
    trigger_runner: JobRunner,
}

impl ExportsService {
    pub fn new(path: Option<PathBuf>, refresh_every: Duration) -> Self {
        Self {
            path,
            refresh_every,
            last_refresh: None,
            pending: None,
            trigger_runner: JobRunner::new(),
        }
    }

    /// Start a reload unless one is already in flight
    pub fn refresh(&mut self, state: &mut ExportsState) {
        let Some(path) = self.path.clone() else {
            return;
        };
        if self.pending.is_some() {
            return;
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = load_export_records(&path).map_err(|e| format!("{:#}", e));
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        self.last_refresh = Some(Instant::now());
        state.loading = true;
    }

    /// Advance background work; returns a message worth showing, if any
    pub fn tick(&mut self, state: &mut ExportsState) -> Option<String> {
        let mut message = None;

        if let Some(rx) = &self.pending {
            match rx.try_recv() {
                Ok(Ok(records)) => {
                    tracing::debug!(count = records.len(), "Export records reloaded");
                    state.records = records;
                    state.loading = false;
                    self.pending = None;
                }
                Ok(Err(err)) => {
                    tracing::warn!("Export reload failed: {}", err);
                    state.loading = false;
                    self.pending = None;
                    message = Some(err);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    state.loading = false;
                    self.pending = None;
                }
            }
        }

        if let Some(result) = self.trigger_runner.poll() {
            message = Some(match result {
                Ok(outcome) if outcome.success() => {
                    tracing::info!("Export job started");
                    "Export started".to_string()
                }
                Ok(outcome) => format!("Starting export failed: {}", outcome.failure_message()),
                Err(err) => format!("Starting export failed: {}", err),
            });
            // pick up the new job right away
            self.last_refresh = None;
        }

        let due = self
            .last_refresh
            .map_or(true, |at| at.elapsed() >= self.refresh_every);
        if due {
            self.refresh(state);
        }

        message
    }

    /// Run the rendered trigger command in the background
    pub fn start_export(&mut self, command: &str) {
        tracing::info!(command, "Starting historical export");
        self.trigger_runner.spawn(command, None);
    }

    pub fn is_starting_export(&self) -> bool {
        self.trigger_runner.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "job_id": "j1",
        "status": "success",
        "payload": { "dateRange": ["2024-01-01", "2024-01-01"] },
        "created_at": "2024-01-02T00:00:00Z"
    }"#;

    #[test]
    fn test_load_plain_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports.json");
        fs::write(&path, format!("[{}]", RECORD)).unwrap();

        let records = load_export_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_id, "j1");
    }

    #[test]
    fn test_load_paged_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports.json");
        fs::write(&path, format!(r#"{{"results": [{}, {}]}}"#, RECORD, RECORD)).unwrap();
        assert_eq!(load_export_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_export_records(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read exports"));
    }

    #[test]
    fn test_refresh_sets_loading_until_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports.json");
        fs::write(&path, format!("[{}]", RECORD)).unwrap();

        let mut service = ExportsService::new(Some(path), Duration::from_secs(60));
        let mut state = ExportsState::default();

        service.tick(&mut state);
        assert!(state.loading);

        for _ in 0..200 {
            service.tick(&mut state);
            if !state.loading {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!state.loading);
        assert_eq!(state.records.len(), 1);
    }

    #[test]
    fn test_without_path_nothing_loads() {
        let mut service = ExportsService::new(None, Duration::from_secs(1));
        let mut state = ExportsState::default();
        assert!(service.tick(&mut state).is_none());
        assert!(!state.loading);
    }
}
