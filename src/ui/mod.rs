pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::{AppState, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    components::render_navbar(f, root[0], app);
    components::render_search_bar(f, root[1], app);
    users::render_user_grid(f, root[2], app);
    components::render_pagination_bar(f, root[3], app);
    components::render_status_bar(f, root[4], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
    components::render_notifications(f, f.area(), app);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    match &app.modal {
        Some(ModalState::EditUser(form)) => users::render_edit_modal(f, area, app, form),
        Some(state @ ModalState::DeleteConfirm { .. }) => users::render_delete_modal(f, area, app, state),
        Some(ModalState::Help { scroll }) => components::render_help_modal(f, area, app, *scroll),
        None => {}
    }
}
