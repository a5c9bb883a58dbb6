//! Tracing setup
//!
//! Stdout belongs to the terminal UI, so logs only go to
//! `~/.querydeck/querydeck.log`, without colors.

use crate::config::Config;
use anyhow::Context;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Variable holding the log filter, e.g. `QUERYDECK_LOG=debug`
const LOG_ENV: &str = "QUERYDECK_LOG";
const DEFAULT_FILTER: &str = "info";

fn log_dir() -> PathBuf {
    Config::config_dir().unwrap_or_else(|| PathBuf::from(".querydeck"))
}

/// Install the global subscriber; returns the log file path
pub fn initialize() -> anyhow::Result<PathBuf> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Cannot create log directory {}", dir.display()))?;

    let path = dir.join("querydeck.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;

    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()
        .context("Tracing subscriber already installed")?;

    Ok(path)
}
