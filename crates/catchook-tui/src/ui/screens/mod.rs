//! Per-route screens plus the form widgets they share.

pub mod dashboard;
pub mod login;
pub mod setup;
pub mod users;

use ratatui::text::{Line, Span};

use catchook_core::forms::FieldState;

use super::styles;

/// Width of the value area of a text input
pub const FIELD_WIDTH: usize = 28;

/// One labelled input, followed by one line per error under it.
pub fn field_lines(label: &str, field: &FieldState, focused: bool, masked: bool) -> Vec<Line<'static>> {
    let shown: String = if masked {
        "*".repeat(field.value.chars().count())
    } else {
        field.value.clone()
    };
    // Keep the tail visible while typing past the box width
    let skip = shown.chars().count().saturating_sub(FIELD_WIDTH - 1);
    let visible: String = shown.chars().skip(skip).collect();
    let cursor = if focused { "▌" } else { "" };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("  {:>17}: [", label), styles::muted_style()),
        Span::styled(
            format!("{:<width$}", format!("{}{}", visible, cursor), width = FIELD_WIDTH),
            styles::field_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])];
    for error in field.errors() {
        lines.push(Line::from(Span::styled(
            format!("  {:>17}  {}", "", error),
            styles::error_style(),
        )));
    }
    lines
}

/// A labelled choice (role, active flag) cycled with Space.
pub fn choice_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:>17}: ", label), styles::muted_style()),
        Span::styled(format!("< {} >", value), styles::field_style(focused)),
    ])
}

pub fn button_line(label: &str, focused: bool, busy: bool) -> Line<'static> {
    let text = if busy {
        format!("  {}...  ", label)
    } else if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("                     ["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ])
}

pub fn form_error_line(error: Option<&str>) -> Option<Line<'static>> {
    error.map(|e| Line::from(Span::styled(format!("  {}", e), styles::error_style())))
}
