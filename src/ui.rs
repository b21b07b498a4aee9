use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, GRID_COLS};
use crate::backend::ResultCloud;
use crate::controller::ViewState;
use crate::selection::SLOT_COUNT;
use crate::theme::Theme;

// Load theme colors once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color {
    theme().accent
}
fn danger() -> Color {
    theme().danger
}
fn success() -> Color {
    theme().success
}
fn text() -> Color {
    theme().text
}
fn text_dim() -> Color {
    theme().text_dim
}
fn bg_selected() -> Color {
    theme().bg_selected
}
fn inactive() -> Color {
    theme().inactive
}
fn header() -> Color {
    theme().header
}

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(8),    // Main screen
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);

    match app.controller.view() {
        ViewState::Selecting => draw_selection_screen(f, app, chunks[1]),
        ViewState::Transitioning => draw_launch_screen(f, app, chunks[1]),
        ViewState::ResultShown => draw_result_screen(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);

    if app.show_help {
        draw_help_popup(f);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > screen hint
    let line = if let Some(ref msg) = app.status_message {
        let color = if msg.starts_with('⚠') { danger() } else { text() };
        Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled(msg.clone(), Style::default().fg(color)),
        ])
    } else {
        let hint = match app.controller.view() {
            ViewState::Selecting => format!(
                "Pick three things you care about ({}/{})",
                app.controller.selection.len(),
                SLOT_COUNT
            ),
            ViewState::Transitioning => "Sending your vote...".to_string(),
            ViewState::ResultShown => "What everyone voted for".to_string(),
        };
        Line::from(vec![
            Span::styled(" kumo ", Style::default().fg(header()).add_modifier(Modifier::BOLD)),
            Span::styled("│ ", Style::default().fg(text_dim())),
            Span::styled(hint, Style::default().fg(text())),
            Span::styled(
                format!(" │ lang: {}", app.controller.language()),
                Style::default().fg(text_dim()),
            ),
        ])
    };

    f.render_widget(Paragraph::new(line), area);
}

fn draw_selection_screen(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    draw_grid(f, app, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(SLOT_COUNT as u16 + 2), Constraint::Length(3)])
        .split(chunks[1]);

    draw_slots(f, app, side[0]);
    draw_submit_box(f, app, side[1]);
}

fn draw_grid(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " Choices ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.items.is_empty() {
        f.render_widget(
            Paragraph::new("No items configured").style(Style::default().fg(text_dim())),
            inner,
        );
        return;
    }

    let cols = GRID_COLS.min(app.items.len());
    let full = app.controller.selection.is_full();
    let cell_width = (inner.width as usize / cols).max(8);

    let mut lines = Vec::new();
    for (row_idx, row) in app.items.chunks(cols).enumerate() {
        let mut spans = Vec::new();
        for (col_idx, key) in row.iter().enumerate() {
            let idx = row_idx * cols + col_idx;
            let selected = app.controller.selection.is_selected(key);
            let under_cursor = idx == app.cursor;

            // All non-selected items disable exactly when the set is full
            let mut style = if selected {
                Style::default().fg(success()).add_modifier(Modifier::BOLD)
            } else if full {
                Style::default().fg(text_dim())
            } else {
                Style::default().fg(text())
            };
            if under_cursor {
                style = style.bg(bg_selected());
            }

            let marker = if selected { "✔ " } else { "  " };
            let label = format!("{}{}", marker, app.controller.text(key));
            let padded = format!("{:width$}", label, width = cell_width.saturating_sub(1));
            spans.push(Span::styled(padded, style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
        lines.push(Line::default());
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_slots(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Your picks ", Style::default().fg(text())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    for slot in 0..SLOT_COUNT {
        let line = match app.controller.selection.slot_key(slot) {
            Some(key) => Line::from(vec![
                Span::styled(format!(" {} ", slot + 1), Style::default().fg(text_dim())),
                Span::styled(
                    app.controller.text(key).to_string(),
                    Style::default().fg(success()).add_modifier(Modifier::BOLD),
                ),
            ]),
            None => Line::from(vec![
                Span::styled(format!(" {} ", slot + 1), Style::default().fg(text_dim())),
                Span::styled("· · ·", Style::default().fg(inactive())),
            ]),
        };
        lines.push(line);
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_submit_box(f: &mut Frame, app: &App, area: Rect) {
    let ready = app.controller.selection.is_full();
    let (label, color) = if ready {
        ("  Press s to vote ", success())
    } else {
        ("  Pick 3 to vote ", text_dim())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if ready { success() } else { inactive() }));

    let style = if ready {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };

    f.render_widget(Paragraph::new(label).style(style).block(block), area);
}

fn draw_launch_screen(f: &mut Frame, app: &App, area: Rect) {
    let progress = app.controller.launch_progress().unwrap_or(0.0);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(area);

    // A small ascending cloud, climbing with progress
    let height = chunks[0].height.max(1);
    let pad = ((1.0 - progress) * (height.saturating_sub(2)) as f64) as usize;
    let mut lines = vec![Line::default(); pad];
    lines.push(Line::from(Span::styled(
        "  ☁ ☁ ☁",
        Style::default().fg(accent()).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(inactive())),
        )
        .gauge_style(Style::default().fg(accent()))
        .ratio(progress)
        .label(Span::styled(
            "counting votes",
            Style::default().fg(text()),
        ));
    f.render_widget(gauge, centered_horizontal(chunks[1], 40));
}

fn draw_result_screen(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let block = Block::default()
        .title(Span::styled(
            " Everyone's cloud ",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    match app.controller.cloud() {
        Some(cloud) => {
            f.render_widget(
                Paragraph::new(cloud_lines(cloud))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
        }
        None => {
            f.render_widget(
                Paragraph::new("No result available")
                    .style(Style::default().fg(text_dim()))
                    .alignment(Alignment::Center),
                inner,
            );
        }
    }

    if let Some(secs) = app.controller.idle_remaining_secs() {
        let line = Line::from(vec![
            Span::styled(" Back to the start in ", Style::default().fg(text_dim())),
            Span::styled(
                format!("{}s", secs),
                Style::default().fg(accent()).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" (or press Esc)", Style::default().fg(text_dim())),
        ]);
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), chunks[1]);
    }
}

/// Lay the weighted words out as styled spans; heavier words get louder
/// styling so the paragraph reads like a cloud.
fn cloud_lines(cloud: &ResultCloud) -> Vec<Line<'_>> {
    let max_weight = cloud.words.iter().map(|w| w.weight).max().unwrap_or(1).max(1);

    let mut spans = Vec::new();
    for word in &cloud.words {
        let ratio = word.weight as f64 / max_weight as f64;
        let style = if ratio > 0.66 {
            Style::default()
                .fg(accent())
                .add_modifier(Modifier::BOLD)
        } else if ratio > 0.33 {
            Style::default().fg(success())
        } else {
            Style::default().fg(text_dim())
        };
        spans.push(Span::styled(word.text.clone(), style));
        spans.push(Span::raw("   "));
    }

    if spans.is_empty() {
        vec![Line::from(Span::styled(
            "Nobody has voted yet",
            Style::default().fg(text_dim()),
        ))]
    } else {
        vec![Line::from(spans)]
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: &[(&str, &str)] = match app.controller.view() {
        ViewState::Selecting => &[
            ("←↑↓→", "move"),
            ("Space", "pick"),
            ("1-3", "clear slot"),
            ("s", "vote"),
            ("Tab", "language"),
            ("?", "help"),
        ],
        ViewState::Transitioning => &[("", "hold on...")],
        ViewState::ResultShown => &[("Esc", "back"), ("Tab", "language")],
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, action) in hints {
        if !key.is_empty() {
            spans.push(Span::styled(*key, Style::default().fg(accent())));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(*action, Style::default().fg(text_dim())));
        spans.push(Span::styled("  │  ", Style::default().fg(inactive())));
    }
    spans.pop();

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(50, 14, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Help ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let rows = [
        ("←↑↓→ / hjkl", "move around the grid"),
        ("Space / Enter", "pick or unpick an item"),
        ("1, 2, 3", "clear that display slot"),
        ("s", "submit your three picks"),
        ("Esc", "clear picks / leave the result"),
        ("Tab", "switch language"),
        ("q", "quit the kiosk"),
    ];

    let lines: Vec<Line> = rows
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!(" {:<14}", key), Style::default().fg(accent())),
                Span::styled(*action, Style::default().fg(text())),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn centered_horizontal(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    let x = area.x + (area.width - width) / 2;
    Rect::new(x, area.y, width, area.height)
}
