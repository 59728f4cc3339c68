use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use catchook_core::forms::Form;

use crate::app::{App, AppState, EditorFocus, Screen};

use super::screens::{self, button_line, choice_line, field_lines, form_error_line};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Navigation
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_nav(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::CommandMenu => render_command_menu(frame, app),
        AppState::EditingUser => render_editor_overlay(frame, app),
        AppState::ConfirmingDelete(id) => render_delete_overlay(frame, app, id),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Catchook";
    let status = app.api_status();
    let right = format!("{}   [?] Help ", status.label());

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 1),
        )),
        Span::styled(status.label(), styles::api_status_style(status)),
        Span::styled("   [?] Help ", styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_nav(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    if app.is_protected_screen() {
        let entries = [
            ("[1] Dashboard", app.screen == Screen::Dashboard),
            ("[2] Users", app.screen == Screen::Users),
        ];
        for (i, (label, selected)) in entries.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            spans.push(Span::styled(*label, styles::tab_style(*selected)));
        }

        if let Some(ref user) = app.current_user {
            let who = format!("{} ({}) ", user.display_name(), user.role.label());
            let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
            let padding = (area.width as usize).saturating_sub(used + who.chars().count());
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::styled(who, styles::highlight_style()));
        }
    } else {
        spans.push(Span::styled(app.screen.title(), styles::tab_style(true)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.screen {
        Screen::Login => screens::login::render(frame, app, area),
        Screen::Setup => screens::setup::render(frame, app, area),
        Screen::Dashboard => screens::dashboard::render(frame, app, area),
        Screen::Users => screens::users::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if app.is_protected_screen() {
        "[Ctrl+K] commands | [u]pdate | [q]uit"
    } else {
        "[Esc] quit"
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", app.config.api_base_url),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 26, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let help_text = vec![
        Line::from(Span::styled("  Catchook", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1 / 2", "Dashboard / Users"),
        help_line("Ctrl+K", "Command menu"),
        help_line("↑/↓", "Navigate list"),
        help_line("←/→", "Previous / next page"),
        help_line("Esc", "Close dialog"),
        Line::from(""),
        Line::from(Span::styled(" Users", styles::highlight_style())),
        help_line("/", "Search"),
        help_line("n/e/r/s/c", "Sort by name/email/role/status/created"),
        help_line("f / t", "Cycle role / status filter"),
        help_line("x", "Clear filters"),
        help_line("a", "Add user"),
        help_line("Enter", "Edit selected user"),
        help_line("d", "Delete selected user"),
        Line::from(""),
        Line::from(Span::styled(" General", styles::highlight_style())),
        help_line("u", "Refresh data"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_command_menu(frame: &mut Frame, app: &App) {
    let commands = app.filtered_commands();
    let height = commands.len().max(1) as u16 + 5;
    let area = centered_rect_fixed(44, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" > ", styles::search_style()),
            Span::styled(format!("{}▌", app.command_filter), styles::search_style()),
        ]),
        Line::from(""),
    ];
    if commands.is_empty() {
        lines.push(Line::from(Span::styled("   No matching commands", styles::muted_style())));
    }
    for (i, command) in commands.iter().enumerate() {
        let selected = i == app.command_selection;
        let marker = if selected { " ▶ " } else { "   " };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, command.label()),
            styles::field_style(selected),
        )));
    }

    let block = Block::default()
        .title(" Commands ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_editor_overlay(frame: &mut Frame, app: &App) {
    let Some(ref editor) = app.editor else {
        return;
    };
    let focus = app.editor_focus;
    let create = editor.is_create();

    let mut lines = vec![Line::from("")];
    lines.extend(field_lines("First name", &editor.first_name, focus == EditorFocus::FirstName, false));
    lines.extend(field_lines("Last name", &editor.last_name, focus == EditorFocus::LastName, false));
    if create {
        lines.extend(field_lines("Email", &editor.email, focus == EditorFocus::Email, false));
    } else {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>17}: ", "Email"), styles::muted_style()),
            Span::styled(editor.email.value.clone(), styles::muted_style()),
        ]));
    }
    lines.push(choice_line("Role", editor.role.label(), focus == EditorFocus::Role));
    if !create {
        let active = if editor.is_active { "Active" } else { "Inactive" };
        lines.push(choice_line("Status", active, focus == EditorFocus::Active));
    }
    lines.push(Line::from(""));
    lines.push(button_line(
        if create { "Create" } else { "Save" },
        focus == EditorFocus::Button,
        editor.status().submitting,
    ));
    if let Some(line) = form_error_line(editor.form_error()) {
        lines.push(Line::from(""));
        lines.push(line);
    }

    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let title = if create { " New user " } else { " Edit user " };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App, id: i64) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let name = app
        .users
        .users
        .iter()
        .find(|u| u.id == id)
        .map(|u| u.display_name())
        .unwrap_or_else(|| format!("user #{}", id));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  Delete {}?", name), styles::error_style())),
        Line::from(Span::styled("  This cannot be undone.", styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::raw("        "),
            Span::styled("[Y]", styles::help_key_style()),
            Span::raw(" Delete      "),
            Span::styled("[N]", styles::help_key_style()),
            Span::raw(" Cancel"),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Quit Catchook?", styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::raw("        "),
            Span::styled("[Y]", styles::help_key_style()),
            Span::raw(" Yes      "),
            Span::styled("[N]", styles::help_key_style()),
            Span::raw(" No"),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(40, 10, outer), Rect::new(30, 15, 40, 10));
        // Clamped to the outer area
        assert_eq!(centered_rect_fixed(200, 50, outer), Rect::new(0, 0, 100, 40));
    }
}
