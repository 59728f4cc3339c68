use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use catchook_core::forms::Form;

use crate::app::{App, SetupFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

use super::{button_line, field_lines, form_error_line};

/// First-time setup: create the initial administrator account.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.setup_form;
    let focus = app.setup_focus;

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Welcome to Catchook", styles::title_style())),
        Line::from(Span::styled(
            "  Create the administrator account to get started.",
            styles::muted_style(),
        )),
        Line::from(""),
    ];
    lines.extend(field_lines("First name", &form.first_name, focus == SetupFocus::FirstName, false));
    lines.extend(field_lines("Last name", &form.last_name, focus == SetupFocus::LastName, false));
    lines.extend(field_lines("Email", &form.email, focus == SetupFocus::Email, false));
    lines.extend(field_lines("Password", &form.password, focus == SetupFocus::Password, true));
    lines.extend(field_lines(
        "Confirm password",
        &form.confirm_password,
        focus == SetupFocus::ConfirmPassword,
        true,
    ));
    lines.push(Line::from(""));
    lines.push(button_line(
        "Create account",
        focus == SetupFocus::Button,
        form.status().submitting,
    ));
    if let Some(line) = form_error_line(form.form_error()) {
        lines.push(Line::from(""));
        lines.push(line);
    }

    let height = lines.len() as u16 + 2;
    let block = Block::default()
        .title(" Setup ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), centered_rect_fixed(64, height, area));
}
