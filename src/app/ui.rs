//! UI rendering for the TUI

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::state::{AppState, Overlay};
use crate::api::FetchError;
use crate::config::Config;
use crate::db::CacheStore;
use crate::engine::{NavState, View};
use crate::models::Item;
use crate::theme::ThemeColors;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const AUTHOR_WIDTH: u16 = 24;

/// Main render function
pub fn render<S: CacheStore>(frame: &mut Frame, state: &mut AppState<S>) {
    let colors = state.theme.colors();

    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(colors.bg)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    // The table height is the engine's page size
    state.engine.set_page_size(usize::from(chunks[1].height.max(1)));

    let view = state.engine.view();
    render_header(frame, &view, &colors, state.current_tick(), chunks[0]);
    render_table(frame, &view, &state.config, &colors, chunks[1]);
    render_status_bar(frame, &state.status, &colors, chunks[2]);

    match view.state {
        NavState::JumpPrompt(_) => render_jump_prompt(frame, &colors),
        NavState::ErrorModal(_, error) => render_error_modal(frame, error, &colors),
        NavState::Viewing(_) => {}
    }

    match &state.overlay {
        Overlay::None => {}
        Overlay::Content { item, scroll } => render_content(frame, item, *scroll, &colors),
        Overlay::RowPrompt { input } => render_row_prompt(frame, input, &colors),
        Overlay::Help => render_help(frame, &colors),
    }
}

fn render_header(frame: &mut Frame, view: &View<'_>, colors: &ThemeColors, tick: u64, area: Rect) {
    let mut spans = vec![Span::styled(format!(" {} ", view.identity.title()), colors.accent())];

    if view.depth > 0 {
        spans.push(Span::styled(format!("‹{} ", view.depth), colors.dim()));
    }
    spans.push(Span::styled(
        format!("{} unread / {} ", view.unread, view.total),
        colors.dim(),
    ));

    if view.loading {
        let frame_idx = (tick / 2) as usize % SPINNER.len();
        spans.push(Span::styled(format!("{} loading", SPINNER[frame_idx]), colors.busy()));
    } else if let Some(error) = view.error {
        spans.push(Span::styled(format!("✗ {error}"), colors.failure()));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.bg_raised));
    frame.render_widget(header, area);
}

fn render_table(frame: &mut Frame, view: &View<'_>, config: &Config, colors: &ThemeColors, area: Rect) {
    if view.total == 0 {
        let text = if view.loading { "Loading..." } else { "Nothing here yet. Press r to refresh." };
        let empty = Paragraph::new(text)
            .style(colors.dim())
            .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let number_width = (view.total.to_string().len() as u16).max(2);
    let title_width = area
        .width
        .saturating_sub(number_width + 12 + AUTHOR_WIDTH + 2 + 2 + 2 + 6);

    let rows: Vec<Row> = view
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let index = view.offset + i;
            let base = if index == view.selected {
                colors.selected()
            } else if item.read {
                colors.read()
            } else {
                colors.unread()
            };

            Row::new(vec![
                Cell::from(format!("{:>width$}", index + 1, width = number_width as usize))
                    .style(colors.dim()),
                Cell::from(item.short_date()).style(colors.dim()),
                Cell::from(fit_width(&item.author, AUTHOR_WIDTH as usize)),
                Cell::from(fit_width(&row_title(item), title_width as usize)),
                Cell::from(if item.is_reply() { "↩" } else { "" }).style(colors.mark()),
                Cell::from(notification_sign(item, config)).style(colors.mark()),
                Cell::from(if item.read { "" } else { "●" }).style(colors.accent()),
            ])
            .style(base)
        })
        .collect();

    let widths = [
        Constraint::Length(number_width),
        Constraint::Length(12),
        Constraint::Length(AUTHOR_WIDTH),
        Constraint::Fill(1),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
    ];

    let table = Table::new(rows, widths).column_spacing(1);
    frame.render_widget(table, area);
}

fn render_status_bar(frame: &mut Frame, status: &str, colors: &ThemeColors, area: Rect) {
    let content = if status.is_empty() {
        let mut spans = vec![Span::raw(" ")];
        for (key, label) in [
            ("s", "timelines  "),
            ("t", "thread  "),
            ("Enter", "read  "),
            ("r", "refresh  "),
            ("?", "help  "),
            ("q", "close"),
        ] {
            spans.push(Span::styled(key, colors.key_hint()));
            spans.push(Span::styled(format!(": {label}"), colors.dim()));
        }
        spans
    } else {
        vec![Span::raw(" "), Span::styled(status, colors.mark())]
    };

    let bar = Paragraph::new(Line::from(content)).style(Style::default().bg(colors.bg_raised));
    frame.render_widget(bar, area);
}

fn render_jump_prompt(frame: &mut Frame, colors: &ThemeColors) {
    let popup_area = centered_fixed(32, 10, frame.area());
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = [
        ("h", "Home"),
        ("l", "Local"),
        ("n", "Notifications"),
        ("p", "Personal"),
        ("b", "Bookmarks"),
        ("g", "Public"),
    ]
    .into_iter()
    .map(|(key, name)| {
        Line::from(vec![
            Span::styled(format!("  {key}  "), colors.key_hint()),
            Span::raw(name),
        ])
    })
    .collect();

    let popup = Paragraph::new(lines).style(colors.popup()).block(
        Block::default()
            .title(" Go to timeline ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.border()),
    );
    frame.render_widget(popup, popup_area);
}

fn render_error_modal(frame: &mut Frame, error: &FetchError, colors: &ThemeColors) {
    let popup_area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, popup_area);

    let hint = match error {
        FetchError::Auth(_) => "Log in again to get a new access token.",
        FetchError::RateLimited { .. } => "Wait a moment, then press r to refresh.",
        FetchError::Network(_) => "Check your connection, then press r to refresh.",
    };

    let modal = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error.to_string(), colors.failure())),
        Line::from(""),
        Line::from(Span::styled(hint, colors.dim())),
        Line::from(""),
        Line::from(Span::styled("Enter to dismiss", colors.key_hint())),
    ])
    .style(colors.popup())
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.failure()),
    );
    frame.render_widget(modal, popup_area);
}

fn render_content(frame: &mut Frame, item: &Item, scroll: u16, colors: &ThemeColors) {
    let popup_area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, popup_area);

    let text_width = usize::from(popup_area.width.saturating_sub(4)).max(10);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(item.author.clone(), colors.accent()),
            Span::styled(format!("  {}", item.short_date()), colors.dim()),
        ]),
        Line::from(""),
    ];
    for paragraph in item.body.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for wrapped in textwrap::wrap(paragraph, text_width) {
            lines.push(Line::from(wrapped.into_owned()));
        }
    }
    if let Some(url) = &item.url {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(url.clone(), colors.dim())));
    }

    let popup = Paragraph::new(lines)
        .style(colors.popup())
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(colors.border()),
        );
    frame.render_widget(popup, popup_area);
}

fn render_row_prompt(frame: &mut Frame, input: &str, colors: &ThemeColors) {
    let area = frame.area();
    let prompt_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: area.height.min(1),
    };
    frame.render_widget(Clear, prompt_area);
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled(" Go to row: ", colors.key_hint()),
        Span::raw(input),
        Span::styled("▏", colors.accent()),
    ]))
    .style(colors.popup());
    frame.render_widget(prompt, prompt_area);
}

fn render_help(frame: &mut Frame, colors: &ThemeColors) {
    let popup_area = centered_fixed(46, 18, frame.area());
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = [
        ("j/k ↑/↓", "Move selection"),
        ("ctrl+d/u", "Page down/up"),
        ("g/G", "First/last row"),
        ("0-9", "Go to row"),
        ("Enter/l", "Read the selected item"),
        ("t", "Open the conversation"),
        ("s", "Switch timeline"),
        ("r", "Refresh"),
        ("h/Esc", "Back from a conversation"),
        ("q", "Close timeline, quit on the last"),
        ("T", "Next theme"),
    ]
    .into_iter()
    .map(|(key, action)| {
        Line::from(vec![
            Span::styled(format!("  {key:<10}"), colors.key_hint()),
            Span::raw(action),
        ])
    })
    .collect();

    let popup = Paragraph::new(lines).style(colors.popup()).block(
        Block::default()
            .title(" Keys ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.border()),
    );
    frame.render_widget(popup, popup_area);
}

fn row_title(item: &Item) -> String {
    let preview = item.preview(200);
    match (&item.notification, preview.is_empty()) {
        (Some(kind), true) => kind.as_str().to_string(),
        _ => preview,
    }
}

fn notification_sign(item: &Item, config: &Config) -> String {
    item.notification
        .and_then(|kind| config.notifications.sign(kind))
        .unwrap_or_default()
}

/// Cut `text` to at most `width` terminal columns
fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

const fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_width = r.width * percent_x / 100;
    let popup_height = r.height * percent_y / 100;
    centered_fixed(popup_width, popup_height, r)
}

const fn centered_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let width = if width < r.width { width } else { r.width };
    let height = if height < r.height { height } else { r.height };
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}
