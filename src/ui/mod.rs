mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup, Screen};
use crate::export::ExportFormat;
use crate::reimbursement::filter::StatusFilter;
use crate::reimbursement::pagination::PAGE_SIZE_OPTIONS;
use crate::status::MessageKind;
use crate::theme::Theme;
use components::CARD_HEIGHT;

// Set once from config at startup; falls back to the built-in palette
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    if app.screen == Screen::Login {
        draw_login(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(1), // Message line
            Constraint::Length(3), // Facets / page size / search / download
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1), // Pager
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_title(f, chunks[0]);
    draw_message_line(f, app, chunks[1]);
    draw_controls(f, app, chunks[2]);
    draw_cards(f, app, chunks[3]);
    draw_pager(f, app, chunks[4]);
    draw_footer(f, app, chunks[5]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Download => draw_download_menu(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Span::styled(
        "Reimbursement Management",
        Style::default().fg(header()).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, area);
}

fn message_color(kind: MessageKind) -> Color {
    match kind {
        MessageKind::Success => success(),
        MessageKind::Warning => warning(),
        MessageKind::Error => danger(),
    }
}

fn draw_message_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: loading > last message > nothing
    let line = if app.loading {
        Line::from(Span::styled("Loading reimbursements...", Style::default().fg(text_dim())))
    } else if let Some(ref message) = app.message {
        Line::from(Span::styled(message.text.as_str(), Style::default().fg(message_color(message.kind))))
    } else {
        Line::from("")
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_controls(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(34),    // Facets
            Constraint::Length(24), // Items per page
            Constraint::Min(24),    // Search
            Constraint::Length(18), // Download
        ])
        .split(area);

    draw_facets(f, app, chunks[0]);
    draw_page_size(f, app, chunks[1]);
    draw_search(f, app, chunks[2]);
    draw_download_button(f, app, chunks[3]);
}

fn draw_facets(f: &mut Frame, app: &App, area: Rect) {
    let counts = app.counts();

    let mut spans = vec![Span::raw(" ")];
    for (i, status) in [StatusFilter::All, StatusFilter::Paid, StatusFilter::Unpaid].into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
        }
        let label = format!("{} ({})", status.label(), counts.get(status));
        let style = if app.status_filter == status {
            let fill = if status == StatusFilter::All { accent() } else { success() };
            Style::default().fg(Color::Black).bg(fill).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text_dim())
        };
        spans.push(Span::styled(format!(" {} ", label), style));
    }

    let block = Block::default()
        .title(Span::styled(" Status ", Style::default().fg(inactive())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_page_size(f: &mut Frame, app: &App, area: Rect) {
    let current = app.paginator.page_size();
    let spans: Vec<Span> = PAGE_SIZE_OPTIONS
        .iter()
        .map(|&option| {
            let style = if option == current {
                Style::default().fg(accent()).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(text_dim())
            };
            Span::styled(format!(" {}", option), style)
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Items per page ", Style::default().fg(inactive())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_search(f: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.search_active { accent() } else { inactive() };

    let content = if app.search_query.is_empty() && !app.search_active {
        Line::from(Span::styled(" Search reimbursements...", Style::default().fg(text_dim())))
    } else {
        let cursor = if app.search_active { "_" } else { "" };
        Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled(format!("{}{}", app.search_query, cursor), Style::default().fg(text())),
        ])
    };

    let block = Block::default()
        .title(Span::styled(" (/) Search ", Style::default().fg(border_color)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_download_button(f: &mut Frame, app: &App, area: Rect) {
    let (label, color) = if app.is_downloading {
        ("Downloading...", text_dim())
    } else {
        ("(d) Download", accent())
    };

    let button = Paragraph::new(Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(button, area);
}

/// Cards per row for the available width
fn card_columns(width: u16) -> usize {
    if width >= 120 {
        3
    } else if width >= 80 {
        2
    } else {
        1
    }
}

fn draw_cards(f: &mut Frame, app: &App, area: Rect) {
    let records = app.page_records();

    if records.is_empty() {
        app.scroll_limit.set(0);
        let note = if app.loading { "" } else { "No reimbursements to show" };
        let empty = Paragraph::new(Span::styled(note, Style::default().fg(text_dim())))
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let columns = card_columns(area.width);
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;

    // Scroll whole rows of cards so a large page stays reachable
    let total_rows = records.len().div_ceil(columns);
    let max_offset = total_rows.saturating_sub(visible_rows);
    app.scroll_limit.set(max_offset);
    let offset = app.scroll.min(max_offset);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (row_area, chunk) in row_areas.iter().zip(records[offset * columns..].chunks(columns)) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);

        for (cell, record) in cells.iter().zip(chunk) {
            f.render_widget(components::reimbursement_card(record), *cell);
        }
    }
}

fn draw_pager(f: &mut Frame, app: &App, area: Rect) {
    let len = app.filtered().len();
    let total = app.total_pages().max(1);

    let prev_color = if app.paginator.is_first() { inactive() } else { accent() };
    let next_color = if app.paginator.is_last(len) { inactive() } else { accent() };

    let line = Line::from(vec![
        Span::styled("◀ Previous", Style::default().fg(prev_color)),
        Span::styled(
            format!("   Page {} of {}   ", app.paginator.page(), total),
            Style::default().fg(text()),
        ),
        Span::styled("Next ▶", Style::default().fg(next_color)),
    ]);

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = if app.search_active {
        vec![("Type", "Filter"), ("Backspace", "Delete"), ("Enter/Esc", "Done")]
    } else {
        vec![
            ("a/p/u", "Status"),
            ("/", "Search"),
            ("←→", "Page"),
            ("↑↓", "Scroll"),
            ("+/-", "Per page"),
            ("d", "Download"),
            ("r", "Refresh"),
            ("?", "Help"),
            ("q", "Quit"),
        ]
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 90 { 6 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_download_menu(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(36, 30, f.area());
    f.render_widget(Clear, popup_area);

    let mut lines = vec![Line::from("")];
    for (i, format) in ExportFormat::ALL.iter().enumerate() {
        let style = if i == app.download_selected {
            Style::default().bg(bg_selected()).fg(text())
        } else {
            Style::default().fg(text())
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", i + 1), Style::default().fg(accent())),
            Span::styled(format!(" {} ", format.label()), style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if app.is_downloading { "  Downloading..." } else { "  Enter select │ Esc close" },
        Style::default().fg(text_dim()),
    )));

    let menu = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Download ", Style::default().fg(accent())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );
    f.render_widget(menu, popup_area);
}

fn draw_login(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(60, 40, f.area());

    let masked: String = "•".repeat(app.token_input.chars().count());

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Sign in to view your reimbursements", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Paste your access token and press Enter", Style::default().fg(text_dim()))),
        Line::from(""),
        Line::from(Span::styled(format!("{}_", masked), Style::default().fg(text()))),
        Line::from(""),
    ];

    if let Some(ref message) = app.message {
        lines.push(Line::from(Span::styled(message.text.as_str(), Style::default().fg(message_color(message.kind)))));
    }

    lines.push(Line::from(vec![
        Span::styled("Enter", Style::default().fg(accent())),
        Span::styled(" sign in │ ", Style::default().fg(text_dim())),
        Span::styled("Esc", Style::default().fg(accent())),
        Span::styled(" quit", Style::default().fg(text_dim())),
    ]));

    let login = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(Span::styled(" Login ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        );

    f.render_widget(login, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 30 { 95 } else { 75 },
        area
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("═══ Filtering ═══"),
        entry("a / p / u", "Show all / paid / unpaid"),
        entry("Tab", "Cycle status filter"),
        entry("/", "Search category, driver phone or amount"),
        entry("Esc", "Clear search"),
        Line::from(""),
        section("═══ Pages ═══"),
        entry("← / →", "Previous / next page"),
        entry("+ / -", "More / fewer items per page"),
        entry("↑ / ↓", "Scroll cards when a page is taller than the screen"),
        Line::from(""),
        section("═══ Export ═══"),
        entry("d", "Download menu (PDF, Excel, CSV)"),
        Line::from(vec![
            Span::raw("            Exports every record matching the filters, not just this page"),
        ]),
        Line::from(""),
        section("═══ Other ═══"),
        entry("r", "Refresh from server"),
        entry("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" reimburse Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::reimbursement::tests::record;
    use crossterm::event::{KeyCode, KeyEvent};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn app_with_records(name: &str) -> App {
        let dir = std::env::temp_dir().join(format!("reimburse-ui-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let session_path = dir.join("session.json");
        std::fs::write(&session_path, r#"{"access_token":"tok"}"#).unwrap();

        let mut app = App::new(AppConfig::default(), session_path).unwrap();
        app.apply_fetch_result(Ok(vec![
            record("Fuel", "0788111222", json!(1500), true),
            record("Tolls", "0788333444", json!(300), false),
        ]));
        app
    }

    #[test]
    fn test_dashboard_shows_counts_and_cards() {
        let app = app_with_records("dashboard");
        let screen = render(&app, 140, 30);

        assert!(screen.contains("Reimbursement Management"));
        assert!(screen.contains("2 reimbursements retrieved"));
        assert!(screen.contains("All (2)"));
        assert!(screen.contains("Paid (1)"));
        assert!(screen.contains("Unpaid (1)"));
        assert!(screen.contains("Fuel"));
        assert!(screen.contains("1500 FRW"));
        assert!(screen.contains("Page 1 of 1"));
    }

    #[test]
    fn test_login_screen_when_signed_out() {
        let dir = std::env::temp_dir().join(format!("reimburse-ui-login-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let app = App::new(AppConfig::default(), dir.join("missing-session.json")).unwrap();

        let screen = render(&app, 100, 30);
        assert!(screen.contains("Sign in to view your reimbursements"));
    }

    #[tokio::test]
    async fn test_large_page_scrolls_to_every_card() {
        let mut app = app_with_records("scroll");
        app.apply_fetch_result(Ok((0..30)
            .map(|i| record(&format!("Cat{:02}", i), "0788111222", json!(100 + i), i % 2 == 0))
            .collect()));
        app.paginator.set_page_size(30);
        assert_eq!(app.page_records().len(), 30);

        let label = |i: usize| format!("Cat{:02}", i);
        let mut seen = std::collections::HashSet::new();
        let first = render(&app, 160, 45);
        assert!((0..30).any(|i| !first.contains(&label(i))), "page should not fit at once");

        for _ in 0..30 {
            let screen = render(&app, 160, 45);
            seen.extend((0..30).filter(|&i| screen.contains(&label(i))));
            app.handle_key(KeyEvent::from(KeyCode::Down)).await.unwrap();
        }
        assert_eq!(seen.len(), 30);

        // Scrolled to the bottom; a facet change brings the top back
        app.handle_key(KeyEvent::from(KeyCode::Char('a'))).await.unwrap();
        assert_eq!(app.scroll, 0);
        assert!(render(&app, 160, 45).contains(&label(0)));
    }

    #[test]
    fn test_card_columns() {
        assert_eq!(card_columns(60), 1);
        assert_eq!(card_columns(100), 2);
        assert_eq!(card_columns(160), 3);
    }
}
