//! Results export to CSV / XLSX files

use crate::model::editor::ExportContext;
use crate::model::grid::Grid;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// File format requested from the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn all() -> [ExportFormat; 2] {
        [ExportFormat::Csv, ExportFormat::Xlsx]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "XLSX",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn toggle(&self) -> ExportFormat {
        match self {
            ExportFormat::Csv => ExportFormat::Xlsx,
            ExportFormat::Xlsx => ExportFormat::Csv,
        }
    }
}

/// Write the grid as CSV: a header row, then one row per grid row
pub fn write_csv(grid: &Grid, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(grid.headers())?;
    for row in grid.display_rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes exported results to the export directory
#[derive(Debug, Clone)]
pub struct ResultsExporter {
    dir: PathBuf,
    /// Converts `{input}` CSV to `{output}` XLSX
    xlsx_command: Option<String>,
}

impl ResultsExporter {
    pub fn new(dir: PathBuf, xlsx_command: Option<String>) -> Self {
        Self { dir, xlsx_command }
    }

    fn target_path(&self, context: &ExportContext, format: ExportFormat) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.dir
            .join(format!("{}_{}.{}", context.file_stem, stamp, format.extension()))
    }

    /// Export `grid` and return the written file
    pub fn export(&self, format: ExportFormat, context: &ExportContext, grid: &Grid) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let target = self.target_path(context, format);

        match format {
            ExportFormat::Csv => write_csv(grid, &target)?,
            ExportFormat::Xlsx => {
                let command = self
                    .xlsx_command
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("XLSX export needs xlsx_export_command"))?;

                let csv_path = target.with_extension("csv");
                write_csv(grid, &csv_path)?;
                let rendered = command
                    .replace("{input}", &csv_path.to_string_lossy())
                    .replace("{output}", &target.to_string_lossy());

                let status = shell(&rendered)
                    .status()
                    .with_context(|| format!("Failed to run '{}'", rendered))?;
                let _ = std::fs::remove_file(&csv_path);
                if !status.success() {
                    anyhow::bail!("XLSX conversion failed with {}", status);
                }
            }
        }

        tracing::info!(path = %target.display(), format = format.label(), "Exported results");
        Ok(target)
    }
}

fn shell(command: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    }
}
