//! Layout calculations for the UI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Query screen layout areas
pub struct QueryLayout {
    pub screens: Rect,
    pub editor: Rect,
    pub variables: Option<Rect>,
    pub top_bar: Rect,
    pub content: Rect,
    pub footer: Rect,
    pub status: Option<Rect>,
    pub help: Rect,
}

/// Exports screen layout areas
pub struct ExportsLayout {
    pub screens: Rect,
    pub actions: Rect,
    pub table: Rect,
    pub status: Option<Rect>,
    pub help: Rect,
}

/// Calculate centered popup area
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_x = area.x + (area.width.saturating_sub(width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(
        popup_x,
        popup_y,
        width.min(area.width),
        height.min(area.height),
    )
}

/// Calculate query screen layout
///
/// Screen switcher, editor (about a third of the height), optional variables
/// row, the output pane top bar, its content and a footer line.
pub fn calculate_query_layout(area: Rect, has_variables: bool, has_status: bool) -> QueryLayout {
    let mut constraints = vec![
        Constraint::Length(1),
        Constraint::Percentage(30),
    ];
    if has_variables {
        constraints.push(Constraint::Length(1));
    }
    constraints.extend([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ]);
    if has_status {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut i = 0;
    let mut next = || {
        let rect = chunks[i];
        i += 1;
        rect
    };

    let screens = next();
    let editor = next();
    let variables = has_variables.then(&mut next);
    let top_bar = next();
    let content = next();
    let footer = next();
    let status = has_status.then(&mut next);
    let help = next();

    QueryLayout {
        screens,
        editor,
        variables,
        top_bar,
        content,
        footer,
        status,
        help,
    }
}

/// Calculate exports screen layout
pub fn calculate_exports_layout(area: Rect, has_status: bool) -> ExportsLayout {
    let chunks = if has_status {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area)
    };

    let (status, help) = if has_status {
        (Some(chunks[3]), chunks[4])
    } else {
        (None, chunks[3])
    };

    ExportsLayout {
        screens: chunks[0],
        actions: chunks[1],
        table: chunks[2],
        status,
        help,
    }
}

/// Split the visualization area into an optional settings sidebar and the chart
pub fn split_visualization(area: Rect, settings_open: bool, has_controls: bool) -> (Option<Rect>, Rect, Option<Rect>) {
    let (main, controls) = if has_controls {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    if settings_open {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(main);
        (Some(chunks[0]), chunks[1], controls)
    } else {
        (None, main, controls)
    }
}
