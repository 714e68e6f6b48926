//! Drawing

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, InputMode};
use crate::tui::model::{ListModel, ViewStatus};
use crate::tui::overlay::Overlay;
use crate::tui::theme::Theme;
use bizdash_core::Record;

/// Overlay box size before clamping to the screen
const OVERLAY_WIDTH: u16 = 72;
const OVERLAY_HEIGHT: u16 = 24;

/// Fields shown after each row title, at most two per row
const ROW_FIELDS: &[&str] = &["region", "salesman_name", "category", "visit_date", "phone"];

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.bg_color)),
        f.area(),
    );

    draw_header(f, chunks[0], app);

    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.border_color));
    let list_area = list_block.inner(chunks[1]);
    f.render_widget(list_block, chunks[1]);
    app.scroll.set_visible_height(list_area.height as usize);

    let app: &App = app;
    app.session
        .model
        .read(|model| draw_list(f, list_area, model, app));

    draw_footer(f, chunks[2], app);

    // Stacked overlays step down and right so the ones below stay visible
    for (depth, overlay) in app.overlays.iter().enumerate() {
        let base = center_rect(OVERLAY_WIDTH, OVERLAY_HEIGHT, f.area());
        let step = depth as u16 * 2;
        let area = Rect::new(
            (base.x + step).min(f.area().right().saturating_sub(base.width)),
            (base.y + step / 2).min(f.area().bottom().saturating_sub(base.height)),
            base.width,
            base.height,
        );
        draw_overlay(f, area, overlay, &app.theme);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let list = &app.session.list;
    let count = if list.has_more() {
        format!("{} of {}", list.len(), list.total_count())
    } else {
        format!("{}", list.len())
    };

    // What the rows on screen were loaded with, until the first load starts
    let shown_filter = list
        .active_filter()
        .unwrap_or_else(|| app.filter.clone())
        .to_string();

    let spans = vec![
        Span::styled(
            format!(" {} ", app.session.entity.title()),
            Style::default()
                .fg(theme.title_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(theme.dim_color)),
        Span::styled(shown_filter, Style::default().fg(theme.text_color)),
        Span::styled(" │ ", Style::default().fg(theme.dim_color)),
        Span::styled(count, Style::default().fg(theme.accent_color)),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_list(f: &mut Frame, area: Rect, model: &ListModel, app: &App) {
    let theme = &app.theme;
    let placeholder = match model.status {
        ViewStatus::Loading => Some("Loading…"),
        ViewStatus::Empty => Some("No records"),
        ViewStatus::Ready => None,
    };
    if let Some(text) = placeholder {
        let line = Line::from(Span::styled(text, Style::default().fg(theme.dim_color)));
        f.render_widget(Paragraph::new(line), area);
        return;
    }

    let range = app.scroll.visible_range();
    let lines: Vec<Line> = range
        .map(|index| {
            let selected = app.scroll.is_selected(index);
            let line = match model.rows.get(index) {
                Some(record) => record_line(record, area.width, theme),
                None => load_more_line(model, theme),
            };
            if selected {
                line.style(Style::default().bg(theme.selection_bg))
            } else {
                line
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn record_line(record: &Record, width: u16, theme: &Theme) -> Line<'static> {
    let title = record.title();
    let detail = ROW_FIELDS
        .iter()
        .filter_map(|key| record.text(key))
        .take(2)
        .collect::<Vec<_>>()
        .join(" · ");

    let mut spans = vec![Span::styled(
        format!(" {}", title),
        Style::default().fg(theme.text_color),
    )];
    if !record.is_active() {
        spans.push(Span::styled(" (inactive)", Style::default().fg(theme.warning_color)));
    }
    let used = 1 + title.width() + 2;
    if !detail.is_empty() && used + detail.width() < width as usize {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(detail, Style::default().fg(theme.dim_color)));
    }
    Line::from(spans)
}

fn load_more_line(model: &ListModel, theme: &Theme) -> Line<'static> {
    let (text, color) = match model.load_more {
        Some(row) if row.enabled => ("  [ Load more ]", theme.accent_color),
        Some(_) => ("  [ Loading… ]", theme.dim_color),
        None => ("", theme.dim_color),
    };
    Line::from(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let mut spans = Vec::new();

    if let InputMode::Search(term) = &app.input {
        spans.push(Span::styled(" search: ", Style::default().fg(theme.title_color)));
        spans.push(Span::styled(
            format!("{}▏", term),
            Style::default().fg(theme.text_color),
        ));
    } else if let Some(error) = app.session.model.read(|m| m.error.clone()) {
        let hint = if app.session.model.read(|m| m.retryable) {
            " (m to retry)"
        } else {
            ""
        };
        spans.push(Span::styled(
            format!(" {}{}", error, hint),
            Style::default().fg(theme.error_color),
        ));
    } else {
        spans.push(Span::styled(
            " ? keys  / search  s status  m more  Tab next  q quit",
            Style::default().fg(theme.dim_color),
        ));
    }

    let below = app.scroll.items_below();
    if below > 0 {
        spans.push(Span::styled(
            format!("  ↓{}", below),
            Style::default().fg(theme.dim_color),
        ));
    }

    let locks = app.scroll_lock.lock_count();
    if locks > 0 {
        spans.push(Span::styled(
            format!("  [locked {}]", locks),
            Style::default().fg(theme.warning_color),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_overlay(f: &mut Frame, area: Rect, overlay: &Overlay, theme: &Theme) {
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border_color))
        .style(Style::default().bg(theme.bg_color))
        .title(Span::styled(
            format!(" {} ", overlay.kind.title()),
            Style::default()
                .fg(theme.title_color)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = overlay
        .kind
        .lines()
        .into_iter()
        .skip(overlay.offset)
        .take(inner.height as usize)
        .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.text_color))))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

/// Rows of body text an overlay shows on a terminal `height` rows tall
pub fn overlay_body_height(height: u16) -> usize {
    OVERLAY_HEIGHT.min(height.saturating_sub(2)).saturating_sub(2) as usize
}

/// Centered area of a fixed size, clamped to `area`
pub fn center_rect(width: u16, height: u16, area: Rect) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(x, y, popup_width, popup_height)
}
