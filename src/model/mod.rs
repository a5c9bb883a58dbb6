//! Model layer - centralized state management
//!
//! This module contains all state-related types:
//! - `ExportsState` - historical export jobs and the trigger configuration
//! - `QueryState` / `Grid` - the current response and the grid derived from it
//! - `EditorState` - the editor session feeding the output pane
//! - `OutputContent` - what the output pane renders for a tab and response
//! - `ModalStack` - Modal overlay management

pub mod editor;
pub mod export;
pub mod grid;
pub mod lineage;
pub mod modal;
pub mod output;
pub mod response;
pub mod saved;
pub mod ui;
pub mod visualization;

pub use editor::EditorState;
pub use export::ExportsState;
pub use response::QueryState;
pub use visualization::VisualizationState;
