use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use catchook_core::users::SortField;

use crate::app::{App, AppState};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search and filters
            Constraint::Min(5),    // Table + detail
            Constraint::Length(1), // Pagination
        ])
        .split(area);

    render_filter_bar(frame, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);
    render_user_table(frame, app, columns[0]);
    render_user_detail(frame, app, columns[1]);

    render_pagination(frame, app, rows[2]);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching;
    let filters = app.users.filters();

    let search_text = if searching {
        format!("{}▌", app.search_input)
    } else if app.search_input.is_empty() {
        "press / to search".to_string()
    } else {
        app.search_input.clone()
    };
    let search_style = if searching || !app.search_input.is_empty() {
        styles::search_style()
    } else {
        styles::muted_style()
    };

    let role = filters.role.map(|r| r.label()).unwrap_or("All roles");
    let line = Line::from(vec![
        Span::styled(" Search: ", styles::muted_style()),
        Span::styled(format!("{:<30}", search_text), search_style),
        Span::styled("  [f] Role: ", styles::muted_style()),
        Span::styled(role, styles::highlight_style()),
        Span::styled("  [t] Status: ", styles::muted_style()),
        Span::styled(filters.status.label(), styles::highlight_style()),
        Span::styled("  [x] clear", styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_user_table(frame: &mut Frame, app: &App, area: Rect) {
    let filters = app.users.filters();
    let sort_indicator = |field: SortField| {
        if filters.order_by == field {
            format!(" {}", filters.order.arrow())
        } else {
            String::new()
        }
    };

    let header = Row::new([
        Cell::from(format!("Name{}", sort_indicator(SortField::FirstName))),
        Cell::from(format!("Email{}", sort_indicator(SortField::Email))),
        Cell::from(format!("Role{}", sort_indicator(SortField::Role))),
        Cell::from(format!("Status{}", sort_indicator(SortField::IsActive))),
        Cell::from(format!("Created{}", sort_indicator(SortField::CreatedAt))),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .users
        .users
        .iter()
        .map(|user| {
            Row::new(vec![
                Cell::from(user.display_name()),
                Cell::from(user.email.clone()),
                Cell::from(Span::styled(user.role.label(), styles::role_style(user.role))),
                Cell::from(Span::styled(user.status_label(), styles::active_style(user.is_active))),
                Cell::from(user.created_display()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(25),
        Constraint::Fill(3),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(13),
    ];

    let total = app.users.pagination.map(|p| p.total).unwrap_or(0);
    let title = format!(
        " Users ({}) - sort [n]ame [e]mail [r]ole [s]tatus [c]reated ",
        total
    );

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.state == AppState::Normal));

    if app.users.users.is_empty() {
        let message = if app.users.is_loading() {
            Span::styled(" Loading users...", styles::muted_style())
        } else if let Some(ref error) = app.users.error {
            Span::styled(format!(" {}", error), styles::error_style())
        } else {
            Span::styled(" No users found", styles::muted_style())
        };
        frame.render_widget(Paragraph::new(Line::from(message)).block(block), area);
        return;
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.user_selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_user_detail(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match app.selected_user() {
        Some(user) => {
            lines.push(Line::from(Span::styled(user.display_name(), styles::title_style())));
            lines.push(Line::from(Span::styled(user.email.clone(), styles::muted_style())));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Role:     ", styles::muted_style()),
                Span::styled(user.role.label(), styles::role_style(user.role)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Status:   ", styles::muted_style()),
                Span::styled(user.status_label(), styles::active_style(user.is_active)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Created:  ", styles::muted_style()),
                Span::raw(user.created_display()),
            ]));
            if let Some(updated) = user.updated_at {
                lines.push(Line::from(vec![
                    Span::styled("Updated:  ", styles::muted_style()),
                    Span::raw(updated.format("%b %d, %Y").to_string()),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[Enter] edit  [d] delete",
                styles::muted_style(),
            )));
        }
        None => lines.push(Line::from(Span::styled("No user selected", styles::muted_style()))),
    }
    lines.push(Line::from(Span::styled("[a] add user", styles::muted_style())));

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let query = app.users.query();
    let line = Line::from(vec![
        Span::styled(
            format!(" Page {} of {}", query.page, app.users.total_pages()),
            styles::muted_style(),
        ),
        Span::styled("  [←/→] page", styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
