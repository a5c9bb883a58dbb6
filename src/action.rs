//! Action enum - All possible application actions
//!
//! Components emit Actions in response to events, and the App processes
//! them to update state. Actions are fire-and-forget from the emitter's
//! point of view.

use crate::model::output::OutputTab;
use crate::services::ExportFormat;
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick for polling background work
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit without confirmation
    ForceQuit,
    /// Switch to the query editor screen
    ShowQueryScreen,
    /// Switch to the historical exports screen
    ShowExportsScreen,
    /// Flip the color theme and persist it
    ToggleDarkMode,

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation & Scrolling
    // ─────────────────────────────────────────────────────────────────────────
    NextItem,
    PrevItem,
    FirstItem,
    LastItem,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    OpenQuitDialog,
    OpenHelp,
    CloseModal,
    ConfirmModal,
    ModalUp,
    ModalDown,
    /// Type a character into the focused modal input
    ModalInput(char),
    ModalBackspace,

    // ─────────────────────────────────────────────────────────────────────────
    // Historical Exports
    // ─────────────────────────────────────────────────────────────────────────
    /// Expand or collapse the selected export row
    ToggleExpandRow,
    /// Open the new export modal (needs a job-trigger configuration)
    OpenExportTrigger,
    RefreshExports,

    // ─────────────────────────────────────────────────────────────────────────
    // Output Pane
    // ─────────────────────────────────────────────────────────────────────────
    SetActiveTab(OutputTab),
    NextTab,
    PrevTab,
    RunQuery,
    CancelQuery,
    /// Save the query as a new view, or update the bound view
    SaveAsView,
    /// Prompt for an insight name
    SaveAsInsight,
    /// "Create insight" from the visualization result controls
    CreateInsight,
    ToggleChartSettings,
    CycleVisualization,
    OpenExportMenu,
    ExportResults(ExportFormat),

    // ─────────────────────────────────────────────────────────────────────────
    // Query Editor
    // ─────────────────────────────────────────────────────────────────────────
    EnterEditMode,
    ExitEditMode,
    EditorInput(char),
    EditorNewline,
    EditorBackspace,
    EditorClear,
    /// Replace the live query
    SetSourceQuery(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ModalInput(c) => write!(f, "ModalInput('{}')", c),
            Action::EditorInput(c) => write!(f, "EditorInput('{}')", c),
            Action::SetActiveTab(tab) => write!(f, "SetActiveTab({})", tab.label()),
            Action::ExportResults(format) => write!(f, "ExportResults({})", format.label()),
            Action::SetSourceQuery(query) => write!(f, "SetSourceQuery({} chars)", query.len()),
            other => write!(f, "{:?}", other),
        }
    }
}
