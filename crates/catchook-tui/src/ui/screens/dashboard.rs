use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_account(frame, app, chunks[0]);
    render_health(frame, app, chunks[1]);
}

fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match app.current_user {
        Some(ref user) => {
            lines.push(Line::from(Span::styled(
                format!("Welcome back, {}", user.first_name),
                styles::title_style(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Name:    ", styles::muted_style()),
                Span::raw(user.display_name()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Email:   ", styles::muted_style()),
                Span::raw(user.email.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Role:    ", styles::muted_style()),
                Span::styled(user.role.label(), styles::role_style(user.role)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Member since ", styles::muted_style()),
                Span::raw(user.created_display()),
            ]));
        }
        None => lines.push(Line::from(Span::styled("Loading account...", styles::muted_style()))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Quick actions", styles::highlight_style())));
    lines.push(Line::from(vec![
        Span::styled("  2       ", styles::help_key_style()),
        Span::styled("Manage users", styles::help_desc_style()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  Ctrl+K  ", styles::help_key_style()),
        Span::styled("Command menu", styles::help_desc_style()),
    ]));

    let block = Block::default()
        .title(" Account ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_health(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.api_status();
    let mut lines = vec![Line::from(Span::styled(status.label(), styles::api_status_style(status)))];

    if let Some(ref health) = app.health {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Status:    ", styles::muted_style()),
            Span::raw(health.status.clone()),
        ]));
        if !health.version.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Version:   ", styles::muted_style()),
                Span::raw(health.version.clone()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Database:  ", styles::muted_style()),
            Span::raw(health.services.database.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Redis:     ", styles::muted_style()),
            Span::raw(health.services.redis.clone()),
        ]));
        if let Some(ref message) = health.message {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(message.clone(), styles::muted_style())));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("API: {}", app.config.api_base_url),
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(" Service health ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
