use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, EditField, EditForm, ModalState};
use crate::ui::components::centered_rect;

const CARD_WIDTH: u16 = 34;
const CARD_HEIGHT: u16 = 6;

/// Number of card columns that fit in `width`.
pub fn grid_columns(width: u16) -> usize {
    (width / CARD_WIDTH).max(1) as usize
}

/// Render the visible users as a grid of cards, scrolled so the selection is on screen.
pub fn render_user_grid(f: &mut Frame, area: Rect, app: &mut AppState) {
    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let users = app.visible_users();
    if users.is_empty() {
        let msg = if app.is_loading_page() || app.is_searching() { "Loading…" } else { "No users found" };
        let p = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted));
        let y = inner.y + inner.height / 2;
        f.render_widget(p, Rect { x: inner.x, y, width: inner.width, height: 1.min(inner.height) });
        return;
    }

    let cols = grid_columns(inner.width);
    app.grid_columns = cols;
    app.selected_index = app.selected_index.min(users.len() - 1);

    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = app.selected_index / cols;
    let first_row = (selected_row / visible_rows) * visible_rows;
    let card_w = inner.width / cols as u16;

    for (i, user) in users.iter().enumerate().skip(first_row * cols).take(visible_rows * cols) {
        let row = i / cols - first_row;
        let col = i % cols;
        let rect = Rect {
            x: inner.x + col as u16 * card_w,
            y: inner.y + row as u16 * CARD_HEIGHT,
            width: card_w,
            height: CARD_HEIGHT.min(inner.height.saturating_sub(row as u16 * CARD_HEIGHT)),
        };
        if rect.height < 3 {
            continue;
        }
        let selected = i == app.selected_index;
        let border = if selected {
            Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.border)
        };
        let lines = vec![
            Line::from(Span::styled(
                user.display_name(),
                Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(user.email.clone(), Style::default().fg(app.theme.text))),
            Line::from(Span::styled(user.avatar.clone(), Style::default().fg(app.theme.muted))),
        ];
        let card = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(format!("#{}", user.id))
                    .borders(Borders::ALL)
                    .border_style(border),
            )
            .style(if selected { Style::default().bg(app.theme.highlight_bg) } else { Style::default() });
        f.render_widget(card, rect);
    }
}

pub fn render_edit_modal(f: &mut Frame, area: Rect, app: &AppState, form: &EditForm) {
    let rect = centered_rect(60, 12, area);
    let marker = |field: EditField| if form.focus == field { "▶" } else { " " };
    let cursor = |field: EditField| if form.focus == field && !form.saving { "_" } else { "" };

    let mut lines = vec![
        Line::raw(format!("{} First name: {}{}", marker(EditField::FirstName), form.first_name, cursor(EditField::FirstName))),
        Line::raw(format!("{} Last name:  {}{}", marker(EditField::LastName), form.last_name, cursor(EditField::LastName))),
        Line::raw(format!("{} Email:      {}{}", marker(EditField::Email), form.email, cursor(EditField::Email))),
        Line::raw(""),
    ];
    let save = if form.focus == EditField::Save { "[Save]" } else { " Save " };
    let cancel = if form.focus == EditField::Cancel { "[Cancel]" } else { " Cancel " };
    lines.push(Line::raw(format!("  {save}    {cancel}")));
    lines.push(Line::raw(""));
    if form.saving {
        lines.push(Line::from(Span::styled("Saving…", Style::default().fg(app.theme.muted))));
    } else if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(app.theme.error))));
    } else {
        lines.push(Line::from(Span::styled(
            "Tab/Up/Down: move  Enter: next/confirm  Esc: cancel",
            Style::default().fg(app.theme.muted),
        )));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(format!("Edit user #{}", form.user_id))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_delete_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::DeleteConfirm { user, selected, pending } = state {
        let rect = centered_rect(54, 8, area);
        let mut body = format!(
            "Delete {} (#{})?\nThis cannot be undone.\n\n",
            user.display_name(),
            user.id
        );
        if *pending {
            body.push_str("  Deleting…");
        } else {
            let yes = if *selected == 0 { "[Yes]" } else { " Yes " };
            let no = if *selected == 1 { "[No]" } else { " No  " };
            body.push_str(&format!("  {}    {}", yes, no));
        }
        let p = Paragraph::new(body).wrap(Wrap { trim: false }).block(
            Block::default()
                .title("Confirm delete")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.error)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
