//! External service interactions
//!
//! This module contains the stand-ins for the collaborators the views talk to:
//! - Query execution through a configured command
//! - Historical export records and the export trigger
//! - Results export to files
//! - Background job execution

pub mod exporter;
pub mod exports;
pub mod job_runner;
pub mod query;

pub use exporter::{ExportFormat, ResultsExporter};
pub use exports::ExportsService;
pub use query::QueryRunner;
