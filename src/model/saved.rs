//! Saved views and insights, persisted as JSON next to the config

use super::response::TypeTag;
use super::visualization::VisualizationType;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named query usable as a table by other queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedView {
    pub id: String,
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeTag>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

/// A saved query + visualization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub name: String,
    pub query: String,
    pub visualization: VisualizationType,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entries<T> {
    entries: Vec<T>,
}

/// File-backed store of saved views and insights
#[derive(Debug, Clone)]
pub struct SavedStore {
    dir: PathBuf,
}

impl SavedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn views_path(&self) -> PathBuf {
        self.dir.join("saved_views.json")
    }

    fn insights_path(&self) -> PathBuf {
        self.dir.join("insights.json")
    }

    pub fn load_views(&self) -> Result<Vec<SavedView>> {
        load_entries(&self.views_path())
    }

    pub fn load_insights(&self) -> Result<Vec<Insight>> {
        load_entries(&self.insights_path())
    }

    /// Create a new view; the name must be unique
    pub fn create_view(
        &self,
        name: &str,
        query: &str,
        columns: Vec<String>,
        types: Vec<TypeTag>,
    ) -> Result<SavedView> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("View name cannot be empty");
        }

        let mut views = self.load_views()?;
        if views.iter().any(|v| v.name == name) {
            anyhow::bail!("A view named '{}' already exists", name);
        }

        let now = Local::now();
        let view = SavedView {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            query: query.to_string(),
            columns,
            types,
            created_at: now,
            updated_at: now,
        };
        views.push(view.clone());
        save_entries(&self.dir, &self.views_path(), views)?;
        Ok(view)
    }

    /// Rewrite the query and types of an existing view
    pub fn update_view(&self, id: &str, query: &str, types: Vec<TypeTag>) -> Result<SavedView> {
        let mut views = self.load_views()?;
        let view = views
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| anyhow::anyhow!("View {} no longer exists", id))?;

        view.query = query.to_string();
        view.types = types;
        view.updated_at = Local::now();
        let updated = view.clone();

        save_entries(&self.dir, &self.views_path(), views)?;
        Ok(updated)
    }

    pub fn create_insight(
        &self,
        name: &str,
        query: &str,
        visualization: VisualizationType,
    ) -> Result<Insight> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Insight name cannot be empty");
        }

        let mut insights = self.load_insights()?;
        let insight = Insight {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            query: query.to_string(),
            visualization,
            created_at: Local::now(),
        };
        insights.push(insight.clone());
        save_entries(&self.dir, &self.insights_path(), insights)?;
        Ok(insight)
    }
}

/// Entries stored at `path`; a missing file holds none
///
/// An unreadable file is an error so callers never overwrite it.
fn load_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let file: Entries<T> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid saved entries in {}", path.display()))?;
    Ok(file.entries)
}

fn save_entries<T: Serialize>(dir: &Path, path: &Path, entries: Vec<T>) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let json = serde_json::to_string_pretty(&Entries { entries })?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_reload_view() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path());

        let view = store
            .create_view(
                "daily_events",
                "select 1 as n",
                vec!["n".to_string()],
                vec![TypeTag::Parts(vec!["n".into(), "UInt8".into()])],
            )
            .unwrap();

        let views = store.load_views().unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0], view);
    }

    #[test]
    fn test_duplicate_view_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path());
        store.create_view("v", "select 1", vec![], vec![]).unwrap();
        let err = store.create_view("v", "select 2", vec![], vec![]).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path());
        assert!(store.create_view("  ", "select 1", vec![], vec![]).is_err());
        assert!(store
            .create_insight("", "select 1", VisualizationType::Table)
            .is_err());
    }

    #[test]
    fn test_update_view() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path());
        let view = store.create_view("v", "select 1", vec![], vec![]).unwrap();

        let updated = store
            .update_view(&view.id, "select 2", vec![TypeTag::Label("UInt8".into())])
            .unwrap();
        assert_eq!(updated.query, "select 2");
        assert_eq!(store.load_views().unwrap()[0].query, "select 2");

        assert!(store.update_view("missing", "select 3", vec![]).is_err());
    }

    #[test]
    fn test_create_insight() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path());
        store
            .create_insight("Pageviews", "select 1", VisualizationType::Line)
            .unwrap();
        let insights = store.load_insights().unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].visualization, VisualizationType::Line);
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path().join("nope"));
        assert!(store.load_views().unwrap().is_empty());
        assert!(store.load_insights().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = SavedStore::new(dir.path());
        let views_path = dir.path().join("saved_views.json");
        let insights_path = dir.path().join("insights.json");
        fs::write(&views_path, "{ \"entries\": [ oops").unwrap();
        fs::write(&insights_path, "not json").unwrap();

        assert!(store.load_views().is_err());
        let err = store.create_view("v", "select 1", vec![], vec![]).unwrap_err();
        assert!(format!("{:#}", err).contains("saved_views.json"));
        assert!(store.update_view("id", "select 2", vec![]).is_err());
        assert!(store
            .create_insight("i", "select 1", VisualizationType::Table)
            .is_err());

        assert_eq!(
            fs::read_to_string(&views_path).unwrap(),
            "{ \"entries\": [ oops"
        );
        assert_eq!(fs::read_to_string(&insights_path).unwrap(), "not json");
    }
}
