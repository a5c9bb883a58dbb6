//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that owns the shared state and delegates event handling and rendering to
//! child components. Views read that state when drawing and change it only
//! through Actions applied here.

use crate::action::Action;
use crate::component::Component;
use crate::components::export_trigger_dialog::{field_values, initial_values, missing_field};
use crate::components::{
    calculate_exports_layout, calculate_query_layout, variables_line, EditorRenderContext,
    ExportMenu, ExportTriggerDialog, ExportsStatusView, HelpDialog, NamePrompt,
    OutputRenderContext, QueryEditor, QueryOutputView, QuitDialog,
};
use crate::config::Config;
use crate::model::editor::is_valid_view;
use crate::model::lineage::QueryLineage;
use crate::model::modal::{Modal, ModalStack, NamePurpose};
use crate::model::output::{Capabilities, TopBar, TopBarInputs};
use crate::model::saved::{SavedStore, SavedView};
use crate::model::ui::{InputMode, Screen};
use crate::model::{EditorState, ExportsState, QueryState, VisualizationState};
use crate::services::{ExportFormat, ExportsService, QueryRunner, ResultsExporter};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

const PAGE_SIZE: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    pub screen: Screen,
    pub input_mode: InputMode,
    pub config: Config,

    /// Historical exports and their loader
    pub exports: ExportsState,
    pub exports_service: ExportsService,

    /// Current response and the runner producing it
    pub query: QueryState,
    pub query_runner: QueryRunner,
    pub editor: EditorState,
    pub visualization: VisualizationState,

    pub saved_store: SavedStore,
    pub saved_views: Vec<SavedView>,
    /// "Update view" running in the background
    pending_view_update: Option<Receiver<Result<SavedView, String>>>,
    pub exporter: ResultsExporter,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    /// Error message to display
    pub error: Option<String>,

    /// Status message to display
    pub status_message: Option<String>,

    /// Ticks since start, drives the spinners
    pub tick: usize,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub query_editor: QueryEditor,
    pub output: QueryOutputView,
    pub exports_view: ExportsStatusView,
    pub quit_dialog: QuitDialog,
    pub help_dialog: HelpDialog,
    pub export_trigger_dialog: ExportTriggerDialog,
    pub name_prompt: NamePrompt,
    pub export_menu: ExportMenu,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Create an App from the config in the home directory
    pub fn new() -> App {
        let (config, error) = match Config::load() {
            Ok(config) => (config, None),
            Err(e) => {
                tracing::warn!("Failed to load config: {:#}", e);
                (Config::default(), Some(format!("{:#}", e)))
            }
        };
        let data_dir = Config::config_dir().unwrap_or_else(|| PathBuf::from(".querydeck"));

        let mut app = Self::with_config(config, data_dir);
        if error.is_some() {
            app.error = error;
        }
        app
    }

    /// Create an App from `config`, keeping saved views and insights in `data_dir`
    pub fn with_config(config: Config, data_dir: PathBuf) -> App {
        let exports = ExportsState {
            records: Vec::new(),
            loading: false,
            trigger: config.export_trigger.clone(),
            plugin_config_id: config.plugin_config_id,
        };
        let exports_service = ExportsService::new(
            config.exports_file.as_ref().map(PathBuf::from),
            Duration::from_secs(config.exports_refresh_secs.max(1)),
        );

        let mut editor = EditorState::new(uuid::Uuid::new_v4().to_string());
        editor.variable_values = config.variables.clone();

        let saved_store = SavedStore::new(data_dir);
        let (saved_views, error) = match saved_store.load_views() {
            Ok(views) => (views, None),
            Err(e) => {
                tracing::warn!("Failed to load saved views: {:#}", e);
                (Vec::new(), Some(format!("{:#}", e)))
            }
        };

        App {
            screen: Screen::Query,
            input_mode: InputMode::Normal,
            exports,
            exports_service,
            query: QueryState::default(),
            query_runner: QueryRunner::new(config.query_command.clone()),
            editor,
            visualization: VisualizationState {
                show_result_controls: false,
                ..VisualizationState::default()
            },
            saved_store,
            saved_views,
            pending_view_update: None,
            exporter: ResultsExporter::new(config.export_dir(), config.xlsx_export_command.clone()),
            modals: ModalStack::new(),
            should_quit: false,
            error,
            status_message: None,
            tick: 0,
            query_editor: QueryEditor,
            output: QueryOutputView::new(),
            exports_view: ExportsStatusView::new(),
            quit_dialog: QuitDialog,
            help_dialog: HelpDialog,
            export_trigger_dialog: ExportTriggerDialog,
            name_prompt: NamePrompt,
            export_menu: ExportMenu,
            config,
        }
    }

    /// Capabilities for one render pass or action
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::resolve(&self.config.feature_flags)
    }

    pub fn top_bar(&self) -> TopBar {
        let validation_error = self.editor.validation_error();
        TopBar::build(&TopBarInputs {
            has_export_context: self.editor.export_context().is_some(),
            visualization_type: self.visualization.visualization_type,
            editing_view: self.editor.editing_view.is_some(),
            updating_view: self.pending_view_update.is_some(),
            is_valid_view: self
                .query
                .response()
                .map_or(true, |r| is_valid_view(&r.columns)),
            validation_error: validation_error.as_deref(),
            response_loading: self.query.loading,
        })
    }

    /// Background work that quitting would abandon
    fn pending_jobs(&self) -> Vec<&'static str> {
        let mut jobs = Vec::new();
        if self.query_runner.is_running() {
            jobs.push("A query");
        }
        if self.exports_service.is_starting_export() {
            jobs.push("An export start");
        }
        if self.pending_view_update.is_some() {
            jobs.push("A view update");
        }
        jobs
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.status_message = None;
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.error = None;
    }

    /// Recompute the Info and Lineage panels for the editor session
    fn refresh_metadata(&mut self) {
        self.output.info.set_info(
            &self.editor,
            self.query.grid(),
            self.query.query_id.as_deref(),
        );
        let lineage = QueryLineage::build(
            &self.editor.query(),
            self.editor.editing_view.as_ref(),
            &self.saved_views,
        );
        self.output
            .lineage
            .set_lineage(&self.editor.editor_key, &lineage);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query runs
    // ─────────────────────────────────────────────────────────────────────────

    fn run_query(&mut self) {
        if let Some(reason) = self.editor.validation_error() {
            self.set_error(format!("Cannot run: {}", reason));
            return;
        }
        if self.query_runner.is_running() {
            self.query_runner.cancel();
        }

        match self.query_runner.run(&self.editor.resolved_query()) {
            Ok(query_id) => {
                self.query.begin(query_id);
                self.editor.metadata_loading = true;
                self.input_mode = InputMode::Normal;
                self.error = None;
            }
            Err(e) => self.query.fail(format!("{:#}", e)),
        }
    }

    fn cancel_query(&mut self) {
        if !self.query.loading {
            return;
        }
        self.query_runner.cancel();
        self.query.cancel();
        self.editor.metadata_loading = false;
    }

    fn poll_query(&mut self) {
        let Some(result) = self.query_runner.poll() else {
            return;
        };

        match result {
            Ok(response) => {
                self.query.succeed(response);
                if let Some(grid) = self.query.grid() {
                    self.output.set_grid(grid, self.config.dark_mode);
                }
            }
            Err(err) => self.query.fail(err),
        }

        self.visualization.show_result_controls = self.query.response().is_some();
        self.editor.metadata_loading = false;
        self.refresh_metadata();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saved views and insights
    // ─────────────────────────────────────────────────────────────────────────

    fn save_view(&mut self, name: &str) -> Result<String> {
        let (columns, types) = self
            .query
            .response()
            .map(|r| (r.columns.clone(), r.types.clone()))
            .unwrap_or_default();
        let view = self
            .saved_store
            .create_view(name, &self.editor.query(), columns, types)?;

        tracing::info!(view = %view.name, id = %view.id, "Saved view");
        let message = format!("Saved view '{}'", view.name);
        self.saved_views.push(view.clone());
        self.editor.editing_view = Some(view);
        self.refresh_metadata();
        Ok(message)
    }

    fn save_insight(&mut self, name: &str) -> Result<String> {
        let insight = self.saved_store.create_insight(
            name,
            &self.editor.query(),
            self.visualization.visualization_type,
        )?;
        tracing::info!(insight = %insight.name, "Created insight");
        Ok(format!("Created insight '{}'", insight.name))
    }

    fn start_view_update(&mut self, view: SavedView) {
        if self.pending_view_update.is_some() {
            return;
        }

        let store = self.saved_store.clone();
        let query = self.editor.query();
        let types = self
            .query
            .response()
            .map(|r| r.types.clone())
            .unwrap_or_else(|| view.types.clone());

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = store
                .update_view(&view.id, &query, types)
                .map_err(|e| format!("{:#}", e));
            let _ = tx.send(result);
        });
        self.pending_view_update = Some(rx);
    }

    fn poll_view_update(&mut self) {
        let Some(rx) = &self.pending_view_update else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err("View update was interrupted".to_string()),
        };
        self.pending_view_update = None;

        match result {
            Ok(view) => {
                tracing::info!(view = %view.name, "Updated view");
                if let Some(existing) = self.saved_views.iter_mut().find(|v| v.id == view.id) {
                    *existing = view.clone();
                }
                self.set_status(format!("Updated view '{}'", view.name));
                self.editor.editing_view = Some(view);
                self.refresh_metadata();
            }
            Err(e) => {
                tracing::warn!("View update failed: {}", e);
                self.set_error(e);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Results export
    // ─────────────────────────────────────────────────────────────────────────

    fn open_export_menu(&mut self) {
        let top_bar = self.top_bar();
        match top_bar.export {
            None => self.set_error("Nothing to export yet"),
            Some(button) if button.is_disabled() => self.set_error(button.reason_text()),
            Some(_) if self.query.grid().is_none() => {
                self.set_error("Run the query before exporting")
            }
            Some(_) => self.modals.push(Modal::ExportFormat {
                selected: ExportFormat::Csv,
            }),
        }
    }

    fn export_results(&mut self, format: ExportFormat) {
        let (Some(context), Some(grid)) = (self.editor.export_context(), self.query.grid()) else {
            self.set_error("Nothing to export yet");
            return;
        };

        match self.exporter.export(format, &context, grid) {
            Ok(path) => self.set_status(format!("Exported to {}", path.display())),
            Err(e) => {
                tracing::warn!("Export failed: {:#}", e);
                self.set_error(format!("Export failed: {:#}", e));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    /// Scrolling goes to the help overlay when open, else to the screen
    fn navigate(&mut self, action: Action) -> Result<Option<Action>> {
        if let Some(Modal::Help { scroll_offset }) = self.modals.top_mut() {
            *scroll_offset = match action {
                Action::ScrollDown => scroll_offset.saturating_add(1),
                Action::ScrollUp => scroll_offset.saturating_sub(1),
                Action::PageDown => scroll_offset.saturating_add(PAGE_SIZE),
                Action::PageUp => scroll_offset.saturating_sub(PAGE_SIZE),
                _ => *scroll_offset,
            };
            return Ok(None);
        }

        match self.screen {
            Screen::Query => self.output.update(action),
            Screen::Exports => {
                let len = self.exports.records.len();
                match action {
                    Action::NextItem | Action::ScrollDown => self.exports_view.next(len),
                    Action::PrevItem | Action::ScrollUp => self.exports_view.previous(),
                    Action::FirstItem => self.exports_view.select_first(),
                    Action::LastItem => self.exports_view.select_last(len),
                    Action::PageDown => {
                        for _ in 0..PAGE_SIZE {
                            self.exports_view.next(len);
                        }
                    }
                    Action::PageUp => {
                        for _ in 0..PAGE_SIZE {
                            self.exports_view.previous();
                        }
                    }
                    _ => {}
                }
                Ok(None)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::Help { .. } => self.help_dialog.handle_key_event(key),
            Modal::ExportTrigger { .. } => self.export_trigger_dialog.handle_key_event(key),
            Modal::NamePrompt { .. } => self.name_prompt.handle_key_event(key),
            Modal::ExportFormat { .. } => self.export_menu.handle_key_event(key),
        }
    }

    fn open_export_trigger(&mut self) {
        match &self.exports.trigger {
            Some(trigger) => {
                let values = initial_values(trigger);
                self.modals.push(Modal::ExportTrigger {
                    field_index: 0,
                    values,
                });
            }
            None => self.set_error("No export job is configured"),
        }
    }

    fn confirm_modal(&mut self) -> Result<Option<Action>> {
        let Some(modal) = self.modals.top().cloned() else {
            return Ok(None);
        };

        match modal {
            Modal::QuitConfirm => return Ok(Some(Action::ForceQuit)),
            Modal::Help { .. } => {
                self.modals.pop();
            }
            Modal::ExportTrigger { values, .. } => {
                let Some(trigger) = self.exports.trigger.clone() else {
                    self.modals.pop();
                    return Ok(None);
                };
                if let Some(label) = missing_field(&trigger, &values) {
                    self.set_error(format!("{} is required", label));
                    return Ok(None);
                }
                if self.exports_service.is_starting_export() {
                    self.set_error(format!("{} is already starting", trigger.job_name));
                    return Ok(None);
                }
                let command = trigger.render_command(&field_values(&trigger, &values));
                self.exports_service.start_export(&command);
                self.modals.pop();
                self.set_status(format!("Starting {}...", trigger.job_name));
            }
            Modal::NamePrompt { purpose, input } => {
                let result = match purpose {
                    NamePurpose::SaveView => self.save_view(&input),
                    NamePurpose::SaveInsight => self.save_insight(&input),
                };
                match result {
                    Ok(message) => {
                        self.modals.pop();
                        self.set_status(message);
                    }
                    Err(e) => self.set_error(format!("{:#}", e)),
                }
            }
            Modal::ExportFormat { selected } => return Ok(Some(Action::ExportResults(selected))),
        }
        Ok(None)
    }

    fn move_modal_focus(&mut self, down: bool) {
        let field_count = self.exports.trigger.as_ref().map_or(0, |t| t.fields.len());
        match self.modals.top_mut() {
            Some(Modal::ExportTrigger { field_index, .. }) if field_count > 0 => {
                *field_index = if down {
                    (*field_index + 1) % field_count
                } else {
                    (*field_index + field_count - 1) % field_count
                };
            }
            Some(Modal::ExportFormat { selected }) => *selected = selected.toggle(),
            _ => {}
        }
    }

    fn edit_modal_input(&mut self, c: Option<char>) {
        let input = match self.modals.top_mut() {
            Some(Modal::ExportTrigger {
                field_index,
                values,
            }) => values.get_mut(*field_index),
            Some(Modal::NamePrompt { input, .. }) => Some(input),
            _ => None,
        };
        if let Some(input) = input {
            match c {
                Some(c) => input.push(c),
                None => {
                    input.pop();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    fn draw_query_screen(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let caps = self.capabilities();
        let top_bar = self.top_bar();
        let variables = self.editor.variables();
        let layout = calculate_query_layout(area, !variables.is_empty(), self.has_status());

        self.draw_screen_bar(frame, layout.screens);

        let validation_error = self.editor.validation_error();
        let editor_ctx = EditorRenderContext {
            editor: &self.editor,
            mode: self.input_mode,
            validation_error: validation_error.as_deref(),
            dark_mode: self.config.dark_mode,
        };
        self.query_editor
            .draw_with_context(frame, layout.editor, &editor_ctx)?;
        if let Some(rect) = layout.variables {
            frame.render_widget(Paragraph::new(variables_line(&variables)), rect);
        }

        let ctx = OutputRenderContext {
            caps: &caps,
            query: &self.query,
            top_bar: &top_bar,
            visualization: &self.visualization,
            metadata_loading: self.editor.metadata_loading,
            tick: self.tick,
            dark_mode: self.config.dark_mode,
        };
        self.output.draw_header(frame, layout.top_bar, &ctx);
        self.output.draw_content(frame, layout.content, &ctx)?;
        self.output.draw_footer(frame, layout.footer, &ctx);

        if let Some(rect) = layout.status {
            self.draw_status(frame, rect);
        }
        self.draw_help_line(frame, layout.help);
        Ok(())
    }

    fn draw_exports_screen(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let layout = calculate_exports_layout(area, self.has_status());

        self.draw_screen_bar(frame, layout.screens);
        frame.render_widget(
            Paragraph::new(ExportsStatusView::actions_line(&self.exports)),
            layout.actions,
        );
        self.exports_view
            .draw_with_state(frame, layout.table, &self.exports, self.tick)?;

        if let Some(rect) = layout.status {
            self.draw_status(frame, rect);
        }
        self.draw_help_line(frame, layout.help);
        Ok(())
    }

    fn has_status(&self) -> bool {
        self.error.is_some() || self.status_message.is_some()
    }

    fn draw_screen_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            " querydeck ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        for screen in Screen::all() {
            let style = if screen == self.screen {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("[{}] {}", screen.shortcut(), screen.name()),
                style,
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let line = match (&self.error, &self.status_message) {
            (Some(error), _) => Line::from(Span::styled(
                format!(" ✗ {}", error.lines().next().unwrap_or_default()),
                Style::default().fg(Color::Red),
            )),
            (None, Some(status)) => Line::from(Span::styled(
                format!(" ✓ {}", status),
                Style::default().fg(Color::Green),
            )),
            (None, None) => Line::from(""),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_help_line(&self, frame: &mut Frame, area: Rect) {
        let keys: &[(&str, &str)] = match (self.screen, self.input_mode) {
            (Screen::Query, InputMode::Editing) => &[
                ("Esc", "Stop editing"),
                ("Ctrl+r", "Run"),
                ("Ctrl+l", "Clear"),
            ],
            (Screen::Query, InputMode::Normal) => &[
                ("e", "Edit"),
                ("r", "Run"),
                ("Tab", "Switch tab"),
                ("v", "Visualization"),
                ("x", "Export"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            (Screen::Exports, _) => &[
                ("j/k", "Move"),
                ("Enter", "Details"),
                ("n", "New export"),
                ("R", "Refresh"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
        };

        let mut spans = Vec::new();
        for (key, description) in keys {
            spans.push(Span::styled(
                format!(" {} ", key),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!("{} ", description),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => {
                let pending = self.pending_jobs();
                self.quit_dialog.draw_with_pending(frame, area, &pending);
            }
            Modal::Help { scroll_offset } => {
                let clamped =
                    self.help_dialog
                        .draw_with_offset(frame, area, self.screen, *scroll_offset);
                if let Some(Modal::Help { scroll_offset }) = self.modals.top_mut() {
                    *scroll_offset = clamped;
                }
            }
            Modal::ExportTrigger {
                field_index,
                values,
            } => {
                if let Some(trigger) = &self.exports.trigger {
                    self.export_trigger_dialog
                        .draw_with_form(frame, area, trigger, *field_index, values)?;
                }
            }
            Modal::NamePrompt { purpose, input } => {
                self.name_prompt
                    .draw_with_input(frame, area, *purpose, input)?;
            }
            Modal::ExportFormat { selected } => {
                let file_stem = self
                    .editor
                    .export_context()
                    .map(|c| c.file_stem)
                    .unwrap_or_else(|| "query_results".to_string());
                self.export_menu
                    .draw_with_selection(frame, area, *selected, &file_stem)?;
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn init(&mut self) -> Result<()> {
        self.refresh_metadata();
        self.exports_service.refresh(&mut self.exports);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            return self.handle_modal_key_event(&modal, key);
        }

        if self.screen == Screen::Query && self.input_mode == InputMode::Editing {
            return self.query_editor.handle_key_event(key);
        }

        let global = match key.code {
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('1') | KeyCode::F(1) => Some(Action::ShowQueryScreen),
            KeyCode::Char('2') | KeyCode::F(2) => Some(Action::ShowExportsScreen),
            KeyCode::Char('D') => Some(Action::ToggleDarkMode),
            _ => None,
        };
        if global.is_some() {
            return Ok(global);
        }

        match self.screen {
            Screen::Query => self.output.handle_key_event(key),
            Screen::Exports => self.exports_view.handle_key_event(key),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        // Only the help overlay scrolls; other modals keep the screen still
        if !self.modals.is_empty() && !matches!(self.modals.top(), Some(Modal::Help { .. })) {
            return Ok(None);
        }
        let action = match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::ScrollDown),
            MouseEventKind::ScrollUp => Some(Action::ScrollUp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if action != Action::Tick {
            tracing::debug!(%action, "Applying action");
        }

        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
                self.poll_query();
                self.poll_view_update();
                if let Some(message) = self.exports_service.tick(&mut self.exports) {
                    self.status_message = Some(message);
                }
            }
            Action::Resize(_, _) => {}
            Action::ForceQuit => {
                self.should_quit = true;
            }
            Action::ShowQueryScreen => self.screen = Screen::Query,
            Action::ShowExportsScreen => self.screen = Screen::Exports,
            Action::ToggleDarkMode => {
                self.config.dark_mode = !self.config.dark_mode;
                if let Some(grid) = self.query.grid() {
                    self.output.set_grid(grid, self.config.dark_mode);
                }
                match self.config.save() {
                    Ok(()) => self.set_status(if self.config.dark_mode {
                        "Dark mode on"
                    } else {
                        "Dark mode off"
                    }),
                    Err(e) => self.set_error(format!("Failed to save config: {:#}", e)),
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Navigation & Scrolling
            // ─────────────────────────────────────────────────────────────────
            Action::NextItem
            | Action::PrevItem
            | Action::FirstItem
            | Action::LastItem
            | Action::ScrollUp
            | Action::ScrollDown
            | Action::PageUp
            | Action::PageDown => return self.navigate(action),

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => self.modals.push(Modal::QuitConfirm),
            Action::OpenHelp => {
                if matches!(self.modals.top(), Some(Modal::Help { .. })) {
                    self.modals.pop();
                } else {
                    self.modals.push(Modal::Help { scroll_offset: 0 });
                }
            }
            Action::CloseModal => {
                self.modals.pop();
            }
            Action::ConfirmModal => return self.confirm_modal(),
            Action::ModalUp => self.move_modal_focus(false),
            Action::ModalDown => self.move_modal_focus(true),
            Action::ModalInput(c) => self.edit_modal_input(Some(c)),
            Action::ModalBackspace => self.edit_modal_input(None),

            // ─────────────────────────────────────────────────────────────────
            // Historical Exports
            // ─────────────────────────────────────────────────────────────────
            Action::ToggleExpandRow => self.exports_view.toggle_expand(&self.exports),
            Action::OpenExportTrigger => self.open_export_trigger(),
            Action::RefreshExports => self.exports_service.refresh(&mut self.exports),

            // ─────────────────────────────────────────────────────────────────
            // Output Pane
            // ─────────────────────────────────────────────────────────────────
            Action::SetActiveTab(tab) => self.output.set_active_tab(tab),
            Action::NextTab => {
                return Ok(Some(Action::SetActiveTab(
                    self.output.active_tab.next(&self.capabilities()),
                )))
            }
            Action::PrevTab => {
                return Ok(Some(Action::SetActiveTab(
                    self.output.active_tab.previous(&self.capabilities()),
                )))
            }
            Action::RunQuery => self.run_query(),
            Action::CancelQuery => self.cancel_query(),
            Action::SaveAsView => {
                if let Some(reason) = self.top_bar().view.disabled_reason {
                    self.set_error(reason);
                    return Ok(None);
                }
                match self.editor.editing_view.clone() {
                    Some(view) => self.start_view_update(view),
                    None => self.modals.push(Modal::NamePrompt {
                        purpose: NamePurpose::SaveView,
                        input: String::new(),
                    }),
                }
            }
            Action::SaveAsInsight => self.modals.push(Modal::NamePrompt {
                purpose: NamePurpose::SaveInsight,
                input: String::new(),
            }),
            Action::CreateInsight => {
                if self.visualization.can_create_insight() {
                    return Ok(Some(Action::SaveAsInsight));
                }
            }
            Action::ToggleChartSettings => self.visualization.toggle_settings(),
            Action::CycleVisualization => self.visualization.cycle_type(),
            Action::OpenExportMenu => self.open_export_menu(),
            Action::ExportResults(format) => {
                if matches!(self.modals.top(), Some(Modal::ExportFormat { .. })) {
                    self.modals.pop();
                }
                self.export_results(format);
            }

            // ─────────────────────────────────────────────────────────────────
            // Query Editor
            // ─────────────────────────────────────────────────────────────────
            Action::EnterEditMode => self.input_mode = InputMode::Editing,
            Action::ExitEditMode => {
                self.input_mode = InputMode::Normal;
                self.refresh_metadata();
            }
            Action::EditorInput(c) => {
                self.editor.insert_char(c);
                return Ok(Some(Action::SetSourceQuery(self.editor.query())));
            }
            Action::EditorNewline => {
                self.editor.newline();
                return Ok(Some(Action::SetSourceQuery(self.editor.query())));
            }
            Action::EditorBackspace => {
                self.editor.backspace();
                return Ok(Some(Action::SetSourceQuery(self.editor.query())));
            }
            Action::EditorClear => {
                self.editor.clear();
                return Ok(Some(Action::SetSourceQuery(self.editor.query())));
            }
            Action::SetSourceQuery(query) => {
                if self.editor.query() != query {
                    self.editor.set_query(&query);
                }
            }
        }

        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        match self.screen {
            Screen::Query => self.draw_query_screen(frame, area)?,
            Screen::Exports => self.draw_exports_screen(frame, area)?,
        }

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}
