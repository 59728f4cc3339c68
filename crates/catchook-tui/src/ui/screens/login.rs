use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use catchook_core::forms::Form;

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

use super::{button_line, field_lines, form_error_line};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.login_form;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Sign in to Catchook", styles::title_style())),
        Line::from(""),
    ];

    lines.extend(field_lines("Email", &form.email, app.login_focus == LoginFocus::Email, false));
    lines.extend(field_lines(
        "Password",
        &form.password,
        app.login_focus == LoginFocus::Password,
        true,
    ));
    lines.push(Line::from(""));
    lines.push(button_line(
        "Login",
        app.login_focus == LoginFocus::Button,
        form.status().submitting,
    ));

    if let Some(line) = form_error_line(form.form_error()) {
        lines.push(Line::from(""));
        lines.push(line);
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Tab: next field  Enter: submit  Esc: quit",
        styles::muted_style(),
    )));

    let height = lines.len() as u16 + 2;
    let block = Block::default()
        .title(" Login ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), centered_rect_fixed(60, height, area));
}
