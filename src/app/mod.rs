//! Application state types and entry glue.
//!
//! Defines enums and structs that model the TUI state, as well as helpers
//! to construct defaults and to run the application loop (re-exported as `run`).
//!
pub mod keymap;
pub mod settings;
pub mod update;

use ratatui::style::Color;
use std::time::{Duration, Instant};

use crate::api::{Session, User, UserId, UserPatch};
use crate::controller::Ticket;
use crate::search;
use crate::store::UserStore;

use keymap::Keymap;
use settings::Settings;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThemeName {
    Dark,
    Light,
}

impl ThemeName {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub name: ThemeName,
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub error: Color,
}

impl Theme {
    /// Catppuccin Mocha.
    pub fn dark() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            name: ThemeName::Dark,
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
        }
    }

    /// Catppuccin Latte.
    pub fn light() -> Self {
        Self {
            name: ThemeName::Light,
            text: Color::Rgb(0x4c, 0x4f, 0x69),         // text
            muted: Color::Rgb(0x8c, 0x8f, 0xa1),        // overlay1
            title: Color::Rgb(0x88, 0x39, 0xef),        // mauve
            border: Color::Rgb(0xac, 0xb0, 0xbe),       // surface2
            header_bg: Color::Rgb(0xcc, 0xd0, 0xda),    // surface0
            header_fg: Color::Rgb(0x72, 0x87, 0xfd),    // lavender
            status_bg: Color::Rgb(0xbc, 0xc0, 0xcc),    // surface1
            status_fg: Color::Rgb(0x4c, 0x4f, 0x69),    // text
            highlight_fg: Color::Rgb(0xdf, 0x8e, 0x1d), // yellow
            highlight_bg: Color::Rgb(0xe6, 0xe9, 0xef), // mantle
            success: Color::Rgb(0x40, 0xa0, 0x2b),      // green
            error: Color::Rgb(0xd2, 0x0f, 0x39),        // red
        }
    }

    pub fn named(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }
}

/// Bounded 1-based page counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, total_pages: 1 }
    }
}

impl Pagination {
    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Target page for "previous", if allowed.
    pub fn prev(&self) -> Option<u32> {
        self.can_prev().then(|| self.page - 1)
    }

    /// Target page for "next", if allowed.
    pub fn next(&self) -> Option<u32> {
        self.can_next().then(|| self.page + 1)
    }
}

/// Fields of the edit form, in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditField {
    FirstName,
    LastName,
    Email,
    Save,
    Cancel,
}

impl EditField {
    pub const ALL: [EditField; 5] = [Self::FirstName, Self::LastName, Self::Email, Self::Save, Self::Cancel];

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// State of the edit-user modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditForm {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub focus: EditField,
    pub saving: bool,
    pub error: Option<String>,
}

impl EditForm {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            focus: EditField::FirstName,
            saving: false,
            error: None,
        }
    }

    /// Text buffer behind the focused field, when it is a text field.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            EditField::FirstName => Some(&mut self.first_name),
            EditField::LastName => Some(&mut self.last_name),
            EditField::Email => Some(&mut self.email),
            EditField::Save | EditField::Cancel => None,
        }
    }

    pub fn patch(&self) -> UserPatch {
        UserPatch::from_form(&self.first_name, &self.last_name, &self.email)
    }
}

/// Modal dialog states.
#[derive(Clone, Debug)]
pub enum ModalState {
    EditUser(EditForm),
    DeleteConfirm {
        user: User,
        /// 0 = Yes, 1 = No
        selected: usize,
        pending: bool,
    },
    Help {
        scroll: u16,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Transient message shown in the top-right corner.
#[derive(Clone, Debug)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub detail: Option<String>,
    pub raised_at: Instant,
}

pub struct AppState {
    pub started_at: Instant,
    pub store: UserStore,
    pub pagination: Pagination,
    pub selected_index: usize,
    pub grid_columns: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub notifications: Vec<Notification>,
    pub notification_ttl: Duration,
    pub session: Session,
    pub base_url: String,
    pub pending_page: Option<Ticket>,
    pub pending_search: Option<Ticket>,
}

impl AppState {
    pub fn new(settings: &Settings, session: Session, keymap: Keymap) -> Self {
        Self {
            started_at: Instant::now(),
            store: UserStore::new(),
            pagination: Pagination::default(),
            selected_index: 0,
            grid_columns: 1,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme: Theme::named(settings.theme),
            keymap,
            modal: None,
            notifications: Vec::new(),
            notification_ttl: settings.notification_ttl(),
            session,
            base_url: settings.base_url.clone(),
            pending_page: None,
            pending_search: None,
        }
    }

    pub fn has_query(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    /// Users currently shown: the whole catalog filtered by the query when a
    /// query is active and the catalog is loaded, otherwise the current page
    /// (filtered while the catalog is still on its way).
    pub fn visible_users(&self) -> Vec<User> {
        if !self.has_query() {
            return self.store.page_users().into_iter().cloned().collect();
        }
        if self.store.has_catalog() {
            search::filter_users(self.store.catalog_users(), &self.search_query)
        } else {
            search::filter_users(self.store.page_users(), &self.search_query)
        }
    }

    pub fn selected_user(&self) -> Option<User> {
        self.visible_users().into_iter().nth(self.selected_index)
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_users().len();
        self.selected_index = self.selected_index.min(len.saturating_sub(1));
    }

    pub fn is_loading_page(&self) -> bool {
        self.pending_page.is_some()
    }

    pub fn is_searching(&self) -> bool {
        self.pending_search.is_some()
    }

    pub fn notify(&mut self, level: NotificationLevel, title: impl Into<String>, detail: Option<String>) {
        self.notifications.push(Notification {
            level,
            title: title.into(),
            detail,
            raised_at: Instant::now(),
        });
    }

    /// Drop notifications older than the configured lifetime.
    pub fn prune_notifications(&mut self, now: Instant) {
        let ttl = self.notification_ttl;
        self.notifications
            .retain(|n| now.saturating_duration_since(n.raised_at) < ttl);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
