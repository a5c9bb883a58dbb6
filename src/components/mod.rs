//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod data_grid;
pub mod export_detail;
pub mod export_menu;
pub mod export_trigger_dialog;
pub mod exports_status;
pub mod help_dialog;
pub mod info;
pub mod layout;
pub mod lineage;
pub mod name_prompt;
pub mod output_pane;
pub mod query_editor;
pub mod quit_dialog;
pub mod sql_highlight;
pub mod visualization;

pub use export_menu::ExportMenu;
pub use export_trigger_dialog::ExportTriggerDialog;
pub use exports_status::ExportsStatusView;
pub use help_dialog::HelpDialog;
pub use layout::{calculate_exports_layout, calculate_query_layout, centered_popup};
pub use name_prompt::NamePrompt;
pub use output_pane::{OutputRenderContext, QueryOutputView};
pub use query_editor::{variables_line, EditorRenderContext, QueryEditor};
pub use quit_dialog::QuitDialog;
