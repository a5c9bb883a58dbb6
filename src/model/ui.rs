//! UI state - presentation state separate from domain data

/// Top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Query,
    Exports,
}

impl Screen {
    pub fn all() -> [Screen; 2] {
        [Screen::Query, Screen::Exports]
    }

    pub fn name(&self) -> &str {
        match self {
            Screen::Query => "SQL editor",
            Screen::Exports => "Historical exports",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Screen::Query => '1',
            Screen::Exports => '2',
        }
    }
}

/// Whether keys go to the query buffer or to shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Frames of the loading spinner
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}
