//! Output pane state machine
//!
//! What the output pane shows is a total function of the active tab, the
//! state of the current response and the capabilities enabled for this
//! render pass. Keeping it here keeps the drawing code free of branching.

use super::editor::UNALIASED_FIELDS_REASON;
use super::response::QueryState;
use super::visualization::VisualizationType;
use crate::config::FeatureFlags;

/// Tabs of the output pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTab {
    #[default]
    Results,
    Visualization,
    Info,
    Lineage,
}

impl OutputTab {
    pub fn label(&self) -> &'static str {
        match self {
            OutputTab::Results => "Results",
            OutputTab::Visualization => "Visualization",
            OutputTab::Info => "Info",
            OutputTab::Lineage => "Lineage",
        }
    }

    /// Tabs shown for the given capabilities, in display order
    pub fn available(caps: &Capabilities) -> Vec<OutputTab> {
        let mut tabs = vec![OutputTab::Results, OutputTab::Visualization];
        if caps.data_modeling {
            tabs.push(OutputTab::Info);
            tabs.push(OutputTab::Lineage);
        }
        tabs
    }

    /// Metadata tabs show a spinner while metadata loads
    pub fn shows_metadata_spinner(&self) -> bool {
        matches!(self, OutputTab::Info | OutputTab::Lineage)
    }

    pub fn next(&self, caps: &Capabilities) -> OutputTab {
        let tabs = Self::available(caps);
        let index = tabs.iter().position(|t| t == self).unwrap_or(0);
        tabs[(index + 1) % tabs.len()]
    }

    pub fn previous(&self, caps: &Capabilities) -> OutputTab {
        let tabs = Self::available(caps);
        let index = tabs.iter().position(|t| t == self).unwrap_or(0);
        tabs[(index + tabs.len() - 1) % tabs.len()]
    }
}

/// Feature capabilities resolved once per render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub data_modeling: bool,
}

impl Capabilities {
    pub fn resolve(flags: &FeatureFlags) -> Self {
        Self {
            data_modeling: flags.data_modeling,
        }
    }
}

/// State of the current response as far as rendering is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseState {
    Error { message: String },
    Loading { query_id: Option<String>, has_response: bool },
    Empty,
    Ready,
}

impl ResponseState {
    /// Errors win over loading, loading wins over data
    pub fn of(query: &QueryState) -> Self {
        if let Some(message) = query.error_message() {
            return ResponseState::Error { message };
        }
        if query.loading {
            return ResponseState::Loading {
                query_id: query.query_id.clone(),
                has_response: query.result.is_some(),
            };
        }
        if query.result.is_none() {
            return ResponseState::Empty;
        }
        ResponseState::Ready
    }
}

pub const RESULTS_PLACEHOLDER: &str = "Query results will appear here";
pub const VISUALIZATION_PLACEHOLDER: &str = "Query results will be visualized here";

/// What the output pane body renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputContent {
    ErrorPanel { message: String },
    Loading { query_id: Option<String> },
    Placeholder(&'static str),
    Grid,
    Visualization { loading: bool },
    Info,
    Lineage,
}

impl OutputContent {
    /// Map every (tab, response state) pair to content
    ///
    /// Tabs that the capabilities do not allow render as Results.
    pub fn resolve(tab: OutputTab, state: &ResponseState, caps: &Capabilities) -> Self {
        let tab = if OutputTab::available(caps).contains(&tab) {
            tab
        } else {
            OutputTab::Results
        };

        match (tab, state) {
            (OutputTab::Results | OutputTab::Visualization, ResponseState::Error { message }) => {
                OutputContent::ErrorPanel {
                    message: message.clone(),
                }
            }
            (OutputTab::Results, ResponseState::Loading { query_id, .. }) => {
                OutputContent::Loading {
                    query_id: query_id.clone(),
                }
            }
            (OutputTab::Results, ResponseState::Empty) => {
                OutputContent::Placeholder(RESULTS_PLACEHOLDER)
            }
            (OutputTab::Results, ResponseState::Ready) => OutputContent::Grid,
            (
                OutputTab::Visualization,
                ResponseState::Loading {
                    has_response: true, ..
                },
            ) => OutputContent::Visualization { loading: true },
            (
                OutputTab::Visualization,
                ResponseState::Empty
                | ResponseState::Loading {
                    has_response: false,
                    ..
                },
            ) => OutputContent::Placeholder(VISUALIZATION_PLACEHOLDER),
            (OutputTab::Visualization, ResponseState::Ready) => {
                OutputContent::Visualization { loading: false }
            }
            (OutputTab::Info, _) => OutputContent::Info,
            (OutputTab::Lineage, _) => OutputContent::Lineage,
        }
    }
}

/// Rendered state of a top bar button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub label: &'static str,
    pub disabled_reason: Option<String>,
    pub loading: bool,
}

impl ButtonState {
    fn enabled(label: &'static str) -> Self {
        Self {
            label,
            disabled_reason: None,
            loading: false,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_reason.is_some()
    }

    /// Reason text, empty when the button is enabled
    pub fn reason_text(&self) -> &str {
        self.disabled_reason.as_deref().unwrap_or("")
    }
}

/// Inputs of the top bar
#[derive(Debug, Clone)]
pub struct TopBarInputs<'a> {
    pub has_export_context: bool,
    pub visualization_type: VisualizationType,
    pub editing_view: bool,
    pub updating_view: bool,
    pub is_valid_view: bool,
    pub validation_error: Option<&'a str>,
    pub response_loading: bool,
}

pub const ONLY_TABLES_EXPORTABLE: &str = "Only table results are exportable";

/// Buttons of the output pane top bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopBar {
    pub export: Option<ButtonState>,
    pub view: ButtonState,
    pub run: ButtonState,
}

impl TopBar {
    pub fn build(inputs: &TopBarInputs) -> Self {
        let export = inputs.has_export_context.then(|| ButtonState {
            disabled_reason: (!inputs.visualization_type.is_tabular())
                .then(|| ONLY_TABLES_EXPORTABLE.to_string()),
            ..ButtonState::enabled("Export")
        });

        let view = ButtonState {
            label: if inputs.editing_view {
                "Update view"
            } else {
                "Save as view"
            },
            disabled_reason: (!inputs.is_valid_view).then(|| UNALIASED_FIELDS_REASON.to_string()),
            loading: inputs.editing_view && inputs.updating_view,
        };

        let run = ButtonState {
            disabled_reason: inputs.validation_error.map(str::to_string),
            loading: inputs.response_loading,
            ..ButtonState::enabled("Run")
        };

        TopBar { export, view, run }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::response::QueryResponse;

    const ALL_TABS: [OutputTab; 4] = [
        OutputTab::Results,
        OutputTab::Visualization,
        OutputTab::Info,
        OutputTab::Lineage,
    ];

    fn caps(data_modeling: bool) -> Capabilities {
        Capabilities { data_modeling }
    }

    fn inputs() -> TopBarInputs<'static> {
        TopBarInputs {
            has_export_context: true,
            visualization_type: VisualizationType::Table,
            editing_view: false,
            updating_view: false,
            is_valid_view: true,
            validation_error: None,
            response_loading: false,
        }
    }

    #[test]
    fn test_flagged_tabs() {
        assert_eq!(
            OutputTab::available(&caps(false)),
            vec![OutputTab::Results, OutputTab::Visualization]
        );
        assert_eq!(OutputTab::available(&caps(true)).len(), 4);
    }

    #[test]
    fn test_tab_cycling_respects_capabilities() {
        assert_eq!(
            OutputTab::Visualization.next(&caps(false)),
            OutputTab::Results
        );
        assert_eq!(OutputTab::Visualization.next(&caps(true)), OutputTab::Info);
        assert_eq!(OutputTab::Results.previous(&caps(true)), OutputTab::Lineage);
    }

    #[test]
    fn test_response_state_error_beats_loading() {
        let mut query = QueryState::default();
        query.loading = true;
        query.error = Some("boom".to_string());
        assert_eq!(
            ResponseState::of(&query),
            ResponseState::Error {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_error_shown_on_results_and_visualization() {
        let state = ResponseState::Error {
            message: "boom".to_string(),
        };
        for tab in [OutputTab::Results, OutputTab::Visualization] {
            assert_eq!(
                OutputContent::resolve(tab, &state, &caps(true)),
                OutputContent::ErrorPanel {
                    message: "boom".to_string()
                }
            );
        }
    }

    #[test]
    fn test_results_transitions() {
        let c = caps(false);
        assert_eq!(
            OutputContent::resolve(
                OutputTab::Results,
                &ResponseState::Loading {
                    query_id: Some("q1".into()),
                    has_response: true
                },
                &c
            ),
            OutputContent::Loading {
                query_id: Some("q1".into())
            }
        );
        assert_eq!(
            OutputContent::resolve(OutputTab::Results, &ResponseState::Empty, &c),
            OutputContent::Placeholder(RESULTS_PLACEHOLDER)
        );
        assert_eq!(
            OutputContent::resolve(OutputTab::Results, &ResponseState::Ready, &c),
            OutputContent::Grid
        );
    }

    #[test]
    fn test_visualization_transitions() {
        let c = caps(false);
        assert_eq!(
            OutputContent::resolve(OutputTab::Visualization, &ResponseState::Empty, &c),
            OutputContent::Placeholder(VISUALIZATION_PLACEHOLDER)
        );
        assert_eq!(
            OutputContent::resolve(
                OutputTab::Visualization,
                &ResponseState::Loading {
                    query_id: None,
                    has_response: false
                },
                &c
            ),
            OutputContent::Placeholder(VISUALIZATION_PLACEHOLDER)
        );
        assert_eq!(
            OutputContent::resolve(
                OutputTab::Visualization,
                &ResponseState::Loading {
                    query_id: None,
                    has_response: true
                },
                &c
            ),
            OutputContent::Visualization { loading: true }
        );
        assert_eq!(
            OutputContent::resolve(OutputTab::Visualization, &ResponseState::Ready, &c),
            OutputContent::Visualization { loading: false }
        );
    }

    #[test]
    fn test_metadata_tabs_ignore_response_state() {
        let states = [
            ResponseState::Error {
                message: "x".into(),
            },
            ResponseState::Loading {
                query_id: None,
                has_response: false,
            },
            ResponseState::Empty,
            ResponseState::Ready,
        ];
        for state in &states {
            assert_eq!(
                OutputContent::resolve(OutputTab::Info, state, &caps(true)),
                OutputContent::Info
            );
            assert_eq!(
                OutputContent::resolve(OutputTab::Lineage, state, &caps(true)),
                OutputContent::Lineage
            );
        }
    }

    #[test]
    fn test_disabled_tabs_fall_back_to_results() {
        assert_eq!(
            OutputContent::resolve(OutputTab::Info, &ResponseState::Ready, &caps(false)),
            OutputContent::Grid
        );
    }

    #[test]
    fn test_mapping_is_total() {
        let states = [
            ResponseState::Error {
                message: "x".into(),
            },
            ResponseState::Loading {
                query_id: None,
                has_response: true,
            },
            ResponseState::Loading {
                query_id: None,
                has_response: false,
            },
            ResponseState::Empty,
            ResponseState::Ready,
        ];
        for data_modeling in [false, true] {
            for tab in ALL_TABS {
                for state in &states {
                    // every combination resolves without panicking
                    let _ = OutputContent::resolve(tab, state, &caps(data_modeling));
                }
            }
        }
    }

    #[test]
    fn test_resolving_does_not_touch_query_state() {
        let mut query = QueryState::default();
        query.succeed(QueryResponse {
            columns: vec!["a".into()],
            ..Default::default()
        });
        let before = query.response().cloned();
        for tab in ALL_TABS {
            let state = ResponseState::of(&query);
            let _ = OutputContent::resolve(tab, &state, &caps(true));
        }
        assert_eq!(query.response().cloned(), before);
    }

    #[test]
    fn test_run_reason_is_validation_error() {
        let bar = TopBar::build(&inputs());
        assert!(!bar.run.is_disabled());
        assert_eq!(bar.run.reason_text(), "");

        let bar = TopBar::build(&TopBarInputs {
            validation_error: Some("Query is empty"),
            ..inputs()
        });
        assert!(bar.run.is_disabled());
        assert_eq!(bar.run.reason_text(), "Query is empty");
    }

    #[test]
    fn test_export_button() {
        assert!(TopBar::build(&TopBarInputs {
            has_export_context: false,
            ..inputs()
        })
        .export
        .is_none());

        let export = TopBar::build(&inputs()).export.unwrap();
        assert!(!export.is_disabled());

        let export = TopBar::build(&TopBarInputs {
            visualization_type: VisualizationType::Line,
            ..inputs()
        })
        .export
        .unwrap();
        assert_eq!(export.reason_text(), ONLY_TABLES_EXPORTABLE);
    }

    #[test]
    fn test_view_button() {
        let bar = TopBar::build(&TopBarInputs {
            is_valid_view: false,
            ..inputs()
        });
        assert_eq!(bar.view.label, "Save as view");
        assert_eq!(bar.view.reason_text(), UNALIASED_FIELDS_REASON);

        let bar = TopBar::build(&TopBarInputs {
            editing_view: true,
            updating_view: true,
            is_valid_view: false,
            ..inputs()
        });
        assert_eq!(bar.view.label, "Update view");
        assert_eq!(bar.view.reason_text(), UNALIASED_FIELDS_REASON);
        assert!(bar.view.loading);

        let bar = TopBar::build(&TopBarInputs {
            editing_view: true,
            ..inputs()
        });
        assert!(!bar.view.is_disabled());
        assert!(!bar.view.loading);
    }
}
