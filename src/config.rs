use crate::model::export::JobTriggerConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Process-wide feature flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Enables the Info and Lineage output tabs
    #[serde(default)]
    pub data_modeling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command that reads SQL on stdin and prints a JSON response
    pub query_command: String,
    /// JSON file holding the historical export records
    pub exports_file: Option<String>,
    pub exports_refresh_secs: u64,
    /// Identity of the plugin config whose exports are shown
    pub plugin_config_id: Option<u64>,
    /// Present when new exports can be started
    pub export_trigger: Option<JobTriggerConfig>,
    /// Where exported result files are written
    pub export_dir: Option<String>,
    /// Command converting `{input}` CSV into `{output}` XLSX
    pub xlsx_export_command: Option<String>,
    pub feature_flags: FeatureFlags,
    pub variables: BTreeMap<String, String>,
    pub dark_mode: bool,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_command: String::new(),
            exports_file: None,
            exports_refresh_secs: 10,
            plugin_config_id: None,
            export_trigger: None,
            export_dir: None,
            xlsx_export_command: None,
            feature_flags: FeatureFlags::default(),
            variables: BTreeMap::new(),
            dark_mode: true,
            tick_rate_ms: 100,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".querydeck"))
    }

    /// Load config from the config directory, falling back to defaults
    ///
    /// `config.yaml` takes precedence over `config.json`.
    pub fn load() -> anyhow::Result<Config> {
        match Self::config_dir() {
            Some(dir) => Self::load_from(&dir),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Config> {
        let yaml_path = dir.join("config.yaml");
        if yaml_path.exists() {
            let contents = fs::read_to_string(&yaml_path)?;
            return serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid config at {}", yaml_path.display()));
        }

        let json_path = dir.join("config.json");
        if json_path.exists() {
            let contents = fs::read_to_string(&json_path)?;
            return serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config at {}", json_path.display()));
        }

        Ok(Config::default())
    }

    /// Save the config back to disk
    ///
    /// An existing `config.yaml` is rewritten as YAML since it shadows
    /// `config.json` on load; otherwise JSON is written.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_dir)
    }

    pub fn save_to(&self, dir: &Path) -> anyhow::Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let yaml_path = dir.join("config.yaml");
        if yaml_path.exists() {
            let contents = serde_yaml::to_string(self)?;
            fs::write(&yaml_path, contents)
                .with_context(|| format!("Cannot write {}", yaml_path.display()))?;
            return Ok(());
        }

        let json_path = dir.join("config.json");
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&json_path, contents)
            .with_context(|| format!("Cannot write {}", json_path.display()))?;
        Ok(())
    }

    /// Directory for exported result files
    pub fn export_dir(&self) -> PathBuf {
        match &self.export_dir {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}
