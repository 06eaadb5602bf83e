use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::api::{Session, User, UserId, UserPatch};
use crate::app::keymap::KeyAction;
use crate::app::{AppState, EditField, EditForm, InputMode, ModalState, NotificationLevel, Theme};
use crate::controller::{AppEvent, Controller};
use crate::ui;

/// Whether the event loop keeps running after a key press.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: AppState,
    mut controller: Controller,
    mut events: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    load_page(&mut app, &mut controller, 1);

    loop {
        while let Ok(ev) = events.try_recv() {
            apply_event(&mut app, ev);
        }
        app.prune_notifications(Instant::now());

        terminal.draw(|f| {
            ui::render(f, &mut app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut app, &mut controller, key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    info!(uptime_secs = app.started_at.elapsed().as_secs(), "exiting");
    Ok(())
}

/// Start loading `page`; the previous page request, if any, is superseded.
pub fn load_page(app: &mut AppState, controller: &mut Controller, page: u32) {
    app.pending_page = Some(controller.fetch_page(page));
}

/// Re-evaluate the search after the query changed.
pub fn on_query_changed(app: &mut AppState, controller: &mut Controller) {
    app.selected_index = 0;
    if !app.has_query() {
        controller.cancel_search();
        app.pending_search = None;
    } else if !app.store.has_catalog() {
        app.pending_search = Some(controller.search());
    }
}

pub fn handle_key(app: &mut AppState, controller: &mut Controller, key: KeyEvent) -> Flow {
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, controller, key),
        InputMode::Search => {
            handle_search_key(app, controller, key);
            Flow::Continue
        }
        InputMode::Modal => {
            handle_modal_key(app, controller, key.code);
            Flow::Continue
        }
    }
}

fn handle_normal_key(app: &mut AppState, controller: &mut Controller, key: KeyEvent) -> Flow {
    let Some(action) = app.keymap.resolve(&key) else {
        return Flow::Continue;
    };
    let len = app.visible_users().len();
    let cols = app.grid_columns.max(1);
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::StartSearch => app.input_mode = InputMode::Search,
        KeyAction::ClearSearch => {
            if app.has_query() {
                app.search_query.clear();
                on_query_changed(app, controller);
            }
        }
        KeyAction::EditSelection => {
            if let Some(user) = app.selected_user() {
                app.modal = Some(ModalState::EditUser(EditForm::for_user(&user)));
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(user) = app.selected_user() {
                app.modal = Some(ModalState::DeleteConfirm { user, selected: 1, pending: false });
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::NextPage => {
            if !app.is_loading_page() {
                if let Some(p) = app.pagination.next() {
                    load_page(app, controller, p);
                }
            }
        }
        KeyAction::PrevPage => {
            if !app.is_loading_page() {
                if let Some(p) = app.pagination.prev() {
                    load_page(app, controller, p);
                }
            }
        }
        KeyAction::MoveLeft => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveRight => {
            if app.selected_index + 1 < len {
                app.selected_index += 1;
            }
        }
        KeyAction::MoveUp => {
            if app.selected_index >= cols {
                app.selected_index -= cols;
            }
        }
        KeyAction::MoveDown => {
            if app.selected_index + cols < len {
                app.selected_index += cols;
            }
        }
        KeyAction::Refresh => {
            info!(page = app.pagination.page, "refresh requested");
            app.store.invalidate_catalog();
            let page = app.pagination.page;
            load_page(app, controller, page);
            if app.has_query() {
                app.pending_search = Some(controller.search());
            }
            app.notify(NotificationLevel::Info, "Refreshing", Some(format!("page {page}")));
        }
        KeyAction::ToggleTheme => app.theme = Theme::named(app.theme.name.toggled()),
        KeyAction::SignOut => {
            if app.session.is_signed_in() {
                app.session = Session::default();
                info!("signed out");
                app.notify(NotificationLevel::Info, "Signed out", Some("edits and deletes are disabled".into()));
            } else {
                app.notify(NotificationLevel::Info, "Not signed in", None);
            }
        }
        KeyAction::OpenHelp => {
            app.modal = Some(ModalState::Help { scroll: 0 });
            app.input_mode = InputMode::Modal;
        }
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

fn handle_search_key(app: &mut AppState, controller: &mut Controller, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Down => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.search_query.clear();
            app.input_mode = InputMode::Normal;
            on_query_changed(app, controller);
        }
        KeyCode::Backspace => {
            if app.search_query.pop().is_some() {
                on_query_changed(app, controller);
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_query.push(c);
            on_query_changed(app, controller);
        }
        _ => {}
    }
}

enum ModalOutcome {
    Stay,
    Close,
    Submit(UserId, UserPatch),
    ConfirmDelete(User),
}

fn handle_modal_key(app: &mut AppState, controller: &mut Controller, code: KeyCode) {
    let outcome = match &mut app.modal {
        Some(ModalState::EditUser(form)) => edit_form_key(form, code),
        Some(ModalState::DeleteConfirm { user, selected, pending }) => {
            if *pending {
                ModalOutcome::Stay
            } else {
                match code {
                    KeyCode::Esc | KeyCode::Char('n') => ModalOutcome::Close,
                    KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                        *selected = if *selected == 0 { 1 } else { 0 };
                        ModalOutcome::Stay
                    }
                    KeyCode::Char('y') => ModalOutcome::ConfirmDelete(user.clone()),
                    KeyCode::Enter if *selected == 0 => ModalOutcome::ConfirmDelete(user.clone()),
                    KeyCode::Enter => ModalOutcome::Close,
                    _ => ModalOutcome::Stay,
                }
            }
        }
        Some(ModalState::Help { scroll }) => match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => ModalOutcome::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                *scroll = scroll.saturating_sub(1);
                ModalOutcome::Stay
            }
            KeyCode::Down | KeyCode::Char('j') => {
                *scroll = scroll.saturating_add(1);
                ModalOutcome::Stay
            }
            _ => ModalOutcome::Stay,
        },
        None => ModalOutcome::Close,
    };

    match outcome {
        ModalOutcome::Stay => {}
        ModalOutcome::Close => app.close_modal(),
        ModalOutcome::Submit(id, patch) => {
            debug!(id, ?patch, "submitting edit");
            controller.update_user(id, patch, &app.session);
        }
        ModalOutcome::ConfirmDelete(user) => {
            if let Some(ModalState::DeleteConfirm { pending, .. }) = &mut app.modal {
                *pending = true;
            }
            controller.delete_user(user, &app.session);
        }
    }
}

fn edit_form_key(form: &mut EditForm, code: KeyCode) -> ModalOutcome {
    if form.saving {
        return ModalOutcome::Stay;
    }
    match code {
        KeyCode::Esc => return ModalOutcome::Close,
        KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
        KeyCode::Left | KeyCode::Right if matches!(form.focus, EditField::Save | EditField::Cancel) => {
            form.focus = if form.focus == EditField::Save { EditField::Cancel } else { EditField::Save };
        }
        KeyCode::Enter => match form.focus {
            EditField::Cancel => return ModalOutcome::Close,
            EditField::Save => {
                let patch = form.patch();
                if patch.is_empty() {
                    form.error = Some("Nothing to save: every field is blank".to_string());
                } else {
                    form.saving = true;
                    form.error = None;
                    return ModalOutcome::Submit(form.user_id, patch);
                }
            }
            _ => form.focus = form.focus.next(),
        },
        KeyCode::Backspace => {
            if let Some(text) = form.focused_text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(text) = form.focused_text_mut() {
                text.push(c);
            }
        }
        _ => {}
    }
    ModalOutcome::Stay
}

/// Apply a background result to the state. Results carrying a ticket that is
/// no longer the latest one issued are dropped.
pub fn apply_event(app: &mut AppState, ev: AppEvent) {
    match ev {
        AppEvent::PageLoaded { ticket, page } => {
            if app.pending_page != Some(ticket) {
                debug!(ticket, "dropping superseded page result");
                return;
            }
            app.pending_page = None;
            app.store.replace_page(&page);
            app.pagination.page = page.page;
            app.pagination.total_pages = page.total_pages.max(1);
            if !app.has_query() {
                app.selected_index = 0;
            }
            app.clamp_selection();
        }
        AppEvent::PageFailed { ticket, page, error } => {
            if app.pending_page != Some(ticket) {
                debug!(ticket, "dropping superseded page failure");
                return;
            }
            app.pending_page = None;
            app.notify(
                NotificationLevel::Error,
                "Failed to load users",
                Some(format!("page {page}: {error}")),
            );
        }
        AppEvent::CatalogLoaded { ticket, users } => {
            if app.pending_search != Some(ticket) {
                debug!(ticket, "dropping superseded search result");
                return;
            }
            app.pending_search = None;
            app.store.replace_catalog(users);
            app.clamp_selection();
        }
        AppEvent::CatalogFailed { ticket, error } => {
            if app.pending_search != Some(ticket) {
                debug!(ticket, "dropping superseded search failure");
                return;
            }
            app.pending_search = None;
            app.notify(NotificationLevel::Error, "Failed to search users", Some(error.to_string()));
        }
        AppEvent::UserUpdated { id, patch } => {
            app.store.apply_patch(id, &patch);
            if matches!(&app.modal, Some(ModalState::EditUser(form)) if form.user_id == id) {
                app.close_modal();
            }
            let name = app.store.get(id).map(User::display_name);
            app.notify(NotificationLevel::Success, "User updated", name);
            app.clamp_selection();
        }
        AppEvent::UpdateFailed { id, error } => {
            if let Some(ModalState::EditUser(form)) = &mut app.modal {
                if form.user_id == id {
                    form.saving = false;
                    form.error = Some(error.to_string());
                    return;
                }
            }
            app.notify(NotificationLevel::Error, "Failed to update user", Some(error.to_string()));
        }
        AppEvent::UserDeleted { user } => {
            app.store.remove(user.id);
            if matches!(&app.modal, Some(ModalState::DeleteConfirm { user: u, .. }) if u.id == user.id) {
                app.close_modal();
            }
            app.notify(
                NotificationLevel::Success,
                format!("{} deleted successfully", user.display_name()),
                None,
            );
            app.clamp_selection();
        }
        AppEvent::DeleteFailed { user, error } => {
            if let Some(ModalState::DeleteConfirm { user: u, pending, .. }) = &mut app.modal {
                if u.id == user.id {
                    *pending = false;
                }
            }
            app.notify(NotificationLevel::Error, "Failed to delete user", Some(error.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, UserPage, UserService};
    use crate::app::keymap::Keymap;
    use crate::app::settings::Settings;

    fn user(id: u32, first: &str, last: &str) -> User {
        User {
            id,
            first_name: first.into(),
            last_name: last.into(),
            email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
            avatar: String::new(),
        }
    }

    fn app() -> AppState {
        AppState::new(&Settings::default(), Session::new(Some("t".into())), Keymap::default())
    }

    #[test]
    fn stale_page_results_are_ignored() {
        let mut app = app();
        app.pending_page = Some(2);
        let page = UserPage { page: 1, per_page: None, total: None, total_pages: 2, data: vec![user(1, "George", "Bluth")] };
        apply_event(&mut app, AppEvent::PageLoaded { ticket: 1, page: page.clone() });
        assert!(app.store.is_empty());
        assert!(app.is_loading_page());

        apply_event(&mut app, AppEvent::PageLoaded { ticket: 2, page });
        assert_eq!(app.visible_users().len(), 1);
        assert_eq!(app.pagination.total_pages, 2);
        assert!(!app.is_loading_page());
    }

    #[test]
    fn failed_page_keeps_the_previous_view() {
        let mut app = app();
        app.pending_page = Some(1);
        let page = UserPage { page: 1, per_page: None, total: None, total_pages: 2, data: vec![user(1, "George", "Bluth")] };
        apply_event(&mut app, AppEvent::PageLoaded { ticket: 1, page });
        app.pending_page = Some(2);
        apply_event(&mut app, AppEvent::PageFailed { ticket: 2, page: 2, error: ApiError::Network("down".into()) });
        assert_eq!(app.pagination.page, 1);
        assert_eq!(app.visible_users()[0].id, 1);
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(app.notifications[0].level, NotificationLevel::Error);
    }

    #[test]
    fn edit_form_typing_and_submit() {
        let mut form = EditForm::for_user(&user(3, "Emma", "Wong"));
        form.focus = EditField::Email;
        form.email.clear();
        for c in "emma@example.com".chars() {
            assert!(matches!(edit_form_key(&mut form, KeyCode::Char(c)), ModalOutcome::Stay));
        }
        edit_form_key(&mut form, KeyCode::Tab);
        assert_eq!(form.focus, EditField::Save);
        match edit_form_key(&mut form, KeyCode::Enter) {
            ModalOutcome::Submit(id, patch) => {
                assert_eq!(id, 3);
                assert_eq!(patch.email.as_deref(), Some("emma@example.com"));
            }
            _ => panic!("expected submit"),
        }
        assert!(form.saving);
        assert!(matches!(edit_form_key(&mut form, KeyCode::Esc), ModalOutcome::Stay));
    }

    #[test]
    fn blank_form_is_not_submitted() {
        let mut form = EditForm::for_user(&user(3, "Emma", "Wong"));
        form.first_name.clear();
        form.last_name.clear();
        form.email.clear();
        form.focus = EditField::Save;
        assert!(matches!(edit_form_key(&mut form, KeyCode::Enter), ModalOutcome::Stay));
        assert!(form.error.is_some());
        assert!(!form.saving);
    }

    #[test]
    fn update_failure_reopens_the_form_for_retry() {
        let mut app = app();
        let mut form = EditForm::for_user(&user(3, "Emma", "Wong"));
        form.saving = true;
        app.modal = Some(ModalState::EditUser(form));
        app.input_mode = InputMode::Modal;
        apply_event(&mut app, AppEvent::UpdateFailed { id: 3, error: ApiError::Status { status: 500, message: "boom".into() } });
        match &app.modal {
            Some(ModalState::EditUser(f)) => {
                assert!(!f.saving);
                assert!(f.error.as_deref().unwrap_or("").contains("500"));
            }
            _ => panic!("edit modal should stay open"),
        }
        assert!(app.notifications.is_empty());
    }

    #[test]
    fn delete_failure_keeps_the_dialog_open() {
        let mut app = app();
        let u = user(6, "Tracey", "Ramos");
        app.modal = Some(ModalState::DeleteConfirm { user: u.clone(), selected: 0, pending: true });
        app.input_mode = InputMode::Modal;
        apply_event(&mut app, AppEvent::DeleteFailed { user: u, error: ApiError::Network("reset".into()) });
        assert!(matches!(app.modal, Some(ModalState::DeleteConfirm { pending: false, .. })));
        assert_eq!(app.notifications[0].title, "Failed to delete user");
    }

    #[test]
    fn successful_update_closes_the_edit_form() {
        let mut app = app();
        app.pending_page = Some(1);
        let page = UserPage { page: 1, per_page: None, total: None, total_pages: 2, data: vec![user(3, "Emma", "Wong")] };
        apply_event(&mut app, AppEvent::PageLoaded { ticket: 1, page });
        let mut form = EditForm::for_user(&user(3, "Emma", "Wong"));
        form.saving = true;
        app.modal = Some(ModalState::EditUser(form));
        app.input_mode = InputMode::Modal;

        let patch = UserPatch::from_form("", "", "emma@example.com");
        apply_event(&mut app, AppEvent::UserUpdated { id: 3, patch });
        assert!(app.modal.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.visible_users()[0].email, "emma@example.com");
        assert_eq!(app.notifications[0].level, NotificationLevel::Success);
    }

    #[test]
    fn successful_delete_closes_the_dialog() {
        let mut app = app();
        let u = user(6, "Tracey", "Ramos");
        app.modal = Some(ModalState::DeleteConfirm { user: u.clone(), selected: 0, pending: true });
        app.input_mode = InputMode::Modal;
        apply_event(&mut app, AppEvent::UserDeleted { user: u });
        assert!(app.modal.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.notifications[0].title, "Tracey Ramos deleted successfully");
    }

    #[test]
    fn failed_catalog_fetch_notifies_and_stops_searching() {
        let mut app = app();
        app.search_query = "george".into();
        app.pending_search = Some(4);
        apply_event(&mut app, AppEvent::CatalogFailed { ticket: 4, error: ApiError::Timeout("page 2".into()) });
        assert_eq!(app.pending_search, None);
        assert!(!app.store.has_catalog());
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(app.notifications[0].level, NotificationLevel::Error);
        assert_eq!(app.notifications[0].title, "Failed to search users");
    }

    /// Service that answers every page with two pages of nothing.
    struct EmptyService;

    #[async_trait::async_trait]
    impl UserService for EmptyService {
        async fn list_page(&self, page: u32) -> Result<UserPage, ApiError> {
            Ok(UserPage { page, per_page: None, total: None, total_pages: 2, data: Vec::new() })
        }

        async fn update_user(&self, _id: UserId, _patch: &UserPatch, _token: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn delete_user(&self, _id: UserId, _token: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn login(&self, _email: &str, _password: &str) -> Result<String, ApiError> {
            Ok("t".into())
        }
    }

    fn controller(rt: &tokio::runtime::Runtime) -> Controller {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Controller::new(
            std::sync::Arc::new(EmptyService),
            rt.handle().clone(),
            tx,
            crate::controller::ControllerOptions::default(),
        )
    }

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn paging_is_refused_while_a_page_is_loading() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut controller = controller(&rt);
        let mut app = app();
        app.pagination = crate::app::Pagination { page: 1, total_pages: 2 };
        app.pending_page = Some(42);

        assert_eq!(handle_key(&mut app, &mut controller, press(']')), Flow::Continue);
        assert_eq!(app.pending_page, Some(42));

        app.pending_page = None;
        handle_key(&mut app, &mut controller, press(']'));
        assert_eq!(app.pending_page, Some(1));

        // already on the first page
        app.pending_page = None;
        handle_key(&mut app, &mut controller, press('['));
        assert_eq!(app.pending_page, None);
    }

    #[test]
    fn vertical_moves_step_by_a_grid_row() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut controller = controller(&rt);
        let mut app = app();
        app.pending_page = Some(1);
        let data = (1..=5).map(|i| user(i, "User", &format!("N{i}"))).collect();
        apply_event(&mut app, AppEvent::PageLoaded { ticket: 1, page: UserPage { page: 1, per_page: None, total: None, total_pages: 1, data } });
        app.grid_columns = 3;

        handle_key(&mut app, &mut controller, KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(app.selected_index, 3);
        // no card below index 4
        handle_key(&mut app, &mut controller, press('l'));
        handle_key(&mut app, &mut controller, press('j'));
        assert_eq!(app.selected_index, 4);
        handle_key(&mut app, &mut controller, press('k'));
        assert_eq!(app.selected_index, 1);
        handle_key(&mut app, &mut controller, press('k'));
        assert_eq!(app.selected_index, 1);
        handle_key(&mut app, &mut controller, press('h'));
        handle_key(&mut app, &mut controller, press('h'));
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn refresh_reloads_and_sign_out_drops_the_token() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut controller = controller(&rt);
        let mut app = app();

        handle_key(&mut app, &mut controller, press('r'));
        assert!(app.is_loading_page());
        assert_eq!(app.notifications[0].level, NotificationLevel::Info);

        assert!(app.session.is_signed_in());
        handle_key(&mut app, &mut controller, press('o'));
        assert!(!app.session.is_signed_in());
        assert_eq!(app.session.bearer(), Err(ApiError::MissingToken));
        assert_eq!(app.notifications[1].title, "Signed out");
        assert_eq!(handle_key(&mut app, &mut controller, press('q')), Flow::Quit);
    }
}
