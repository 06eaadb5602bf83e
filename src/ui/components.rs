//! Shared UI components (navbar, search bar, pagination, status bar, notifications, help).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, format_action};
use crate::app::{AppState, InputMode, NotificationLevel};

/// Top bar: title, remote service and session state.
pub fn render_navbar(f: &mut Frame, area: Rect, app: &AppState) {
    let signed_in = if app.session.is_signed_in() { "signed in" } else { "read-only (no token)" };
    let line = Line::from(vec![
        Span::styled("User Management", Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(app.base_url.clone(), Style::default().fg(app.theme.muted)),
        Span::raw("  "),
        Span::raw(signed_in),
        Span::raw("  theme: "),
        Span::raw(app.theme.name.as_str()),
    ]);
    let p = Paragraph::new(line)
        .block(
            Block::default()
                .title("userdeck")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}

pub fn render_search_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let editing = app.input_mode == InputMode::Search;
    let mut spans = vec![Span::raw(app.search_query.clone())];
    if editing {
        spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    } else if app.search_query.is_empty() {
        spans.push(Span::styled("Search users... (/)", Style::default().fg(app.theme.muted)));
    }
    if app.is_searching() {
        spans.push(Span::styled("  searching…", Style::default().fg(app.theme.muted)));
    } else if app.has_query() {
        spans.push(Span::styled(
            format!("  {} match(es)", app.visible_users().len()),
            Style::default().fg(app.theme.muted),
        ));
    }
    let border = if editing { app.theme.highlight_fg } else { app.theme.border };
    let p = Paragraph::new(Line::from(spans)).style(Style::default().fg(app.theme.text)).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(p, area);
}

/// `◀ Prev  Page n of m  Next ▶`, with disabled controls dimmed.
pub fn render_pagination_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let loading = app.is_loading_page();
    let style_for = |enabled: bool| {
        if enabled && !loading {
            Style::default().fg(app.theme.text).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.muted).add_modifier(Modifier::DIM)
        }
    };
    let mut spans = vec![
        Span::styled("◀ Prev", style_for(app.pagination.can_prev())),
        Span::raw(format!("   Page {} of {}   ", app.pagination.page, app.pagination.total_pages)),
        Span::styled("Next ▶", style_for(app.pagination.can_next())),
    ];
    if loading {
        spans.push(Span::styled("   loading…", Style::default().fg(app.theme.muted)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the bottom status bar with mode and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let msg = format!(
        "mode: {mode}  shown:{}  cached:{}  /: search  e: edit  d: delete  [ ]: page  r: refresh  t: theme  o: sign out  ?: help  q: quit",
        app.visible_users().len(),
        app.store.len(),
    );
    let p = Paragraph::new(msg).style(Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg));
    f.render_widget(p, area);
}

/// Stack of transient notifications in the top-right corner, newest last.
pub fn render_notifications(f: &mut Frame, area: Rect, app: &AppState) {
    let width = 48u16.min(area.width);
    let mut y = area.y + 1;
    for n in &app.notifications {
        let height = if n.detail.is_some() { 4 } else { 3 };
        if y + height > area.y + area.height {
            break;
        }
        let color = match n.level {
            NotificationLevel::Info => app.theme.header_fg,
            NotificationLevel::Success => app.theme.success,
            NotificationLevel::Error => app.theme.error,
        };
        let mut lines = vec![Line::from(Span::styled(n.title.clone(), Style::default().add_modifier(Modifier::BOLD)))];
        if let Some(detail) = &n.detail {
            lines.push(Line::raw(detail.clone()));
        }
        let rect = Rect { x: area.x + area.width - width, y, width, height };
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(app.theme.text))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
        y += height;
    }
}

/// Key reference built from the active keymap.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 60u16.min(area.width.saturating_sub(4)).max(30);
    let height = 22u16.min(area.height.saturating_sub(2)).max(8);
    let rect = centered_rect(width, height, area);

    let actions = [
        (KeyAction::StartSearch, "Search"),
        (KeyAction::ClearSearch, "Clear search"),
        (KeyAction::EditSelection, "Edit user"),
        (KeyAction::DeleteSelection, "Delete user"),
        (KeyAction::PrevPage, "Previous page"),
        (KeyAction::NextPage, "Next page"),
        (KeyAction::MoveUp, "Move up"),
        (KeyAction::MoveDown, "Move down"),
        (KeyAction::MoveLeft, "Move left"),
        (KeyAction::MoveRight, "Move right"),
        (KeyAction::Refresh, "Refresh"),
        (KeyAction::ToggleTheme, "Toggle theme"),
        (KeyAction::SignOut, "Sign out"),
        (KeyAction::Quit, "Quit"),
    ];
    let label_w = actions.iter().map(|(_, l)| l.len()).max().unwrap_or(0);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled("Keys:", Style::default().add_modifier(Modifier::BOLD))));
    for (action, label) in actions {
        let keys = app.keymap.keys_for(action);
        if keys.is_empty() {
            continue;
        }
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>width$} │ ", label, width = label_w)),
            Span::styled(keys.join(", "), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("In dialogs:", Style::default().add_modifier(Modifier::BOLD))));
    lines.push(Line::raw("  Tab / Up / Down move between fields, Enter confirms, Esc closes."));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        format!("Remap in keybinds.conf, e.g. `{} = Ctrl+q`.", format_action(KeyAction::Quit)),
        Style::default().fg(app.theme.muted),
    )));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
