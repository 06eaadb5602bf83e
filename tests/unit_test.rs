// Unit tests for userdeck public API

use userdeck::api::{Session, User, UserPage, UserPatch};
use userdeck::app::keymap::Keymap;
use userdeck::app::settings::Settings;
use userdeck::app::AppState;
use userdeck::app::update::apply_event;
use userdeck::controller::AppEvent;

fn user(id: u32, first: &str, last: &str) -> User {
    User {
        id,
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
        avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
    }
}

fn catalog() -> Vec<User> {
    vec![
        user(1, "George", "Bluth"),
        user(2, "Janet", "Weaver"),
        user(3, "Emma", "Wong"),
        user(4, "Eve", "Holt"),
        user(5, "Charles", "Morris"),
        user(6, "Tracey", "Ramos"),
        user(7, "Michael", "Lawson"),
        user(8, "Lindsay", "Ferguson"),
        user(9, "Tobias", "Funke"),
        user(10, "Byron", "Fields"),
        user(11, "George", "Edwards"),
        user(12, "Rachel", "Howell"),
    ]
}

fn first_page() -> UserPage {
    UserPage { page: 1, per_page: Some(6), total: Some(12), total_pages: 2, data: catalog()[..6].to_vec() }
}

fn temp_path(tag: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nonce = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("userdeck_{tag}_{}_{}.conf", std::process::id(), nonce));
    path.to_string_lossy().to_string()
}

/// App with page 1 and the full catalog loaded, searching for `query`.
fn loaded_app(query: &str) -> AppState {
    let mut app = AppState::new(&Settings::default(), Session::new(Some("token".into())), Keymap::default());
    app.pending_page = Some(1);
    apply_event(&mut app, AppEvent::PageLoaded { ticket: 1, page: first_page() });
    app.search_query = query.to_string();
    app.pending_search = Some(2);
    apply_event(&mut app, AppEvent::CatalogLoaded { ticket: 2, users: catalog() });
    app
}

// 1) Search covers the whole catalog, not only the visible page
#[test]
fn search_spans_all_pages() {
    let app = loaded_app("george");
    let ids: Vec<u32> = app.visible_users().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 11]);

    let app = loaded_app("REQRES.IN");
    assert_eq!(app.visible_users().len(), 12);

    let app = loaded_app("zzz");
    assert!(app.visible_users().is_empty());
}

// 2) Without a query the current page is shown in server order
#[test]
fn empty_query_shows_current_page() {
    let app = loaded_app("   ");
    let ids: Vec<u32> = app.visible_users().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(app.pagination.page, 1);
    assert_eq!(app.pagination.total_pages, 2);
}

// 3) An edit shows up in every view that holds the record
#[test]
fn update_is_visible_in_page_and_search_views() {
    let mut app = loaded_app("george");
    let patch = UserPatch::from_form("Georgie", "", "");
    apply_event(&mut app, AppEvent::UserUpdated { id: 1, patch });

    let searched = app.visible_users();
    assert_eq!(searched[0].display_name(), "Georgie Bluth");
    assert_eq!(searched[0].email, "george.bluth@reqres.in");

    app.search_query.clear();
    assert_eq!(app.visible_users()[0].first_name, "Georgie");
    assert_eq!(app.store.get(1).map(|u| u.first_name.as_str()), Some("Georgie"));
}

// 4) A delete removes the record from every view and keeps the selection in range
#[test]
fn delete_is_visible_everywhere() {
    let mut app = loaded_app("george");
    app.selected_index = 1;
    apply_event(&mut app, AppEvent::UserDeleted { user: user(11, "George", "Edwards") });
    let ids: Vec<u32> = app.visible_users().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(app.selected_index, 0);
    assert!(app.store.get(11).is_none());
    assert_eq!(app.notifications[0].title, "George Edwards deleted successfully");

    apply_event(&mut app, AppEvent::UserDeleted { user: user(1, "George", "Bluth") });
    app.search_query.clear();
    let ids: Vec<u32> = app.visible_users().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6]);
}

// 5) A stale catalog result does not replace a newer search
#[test]
fn superseded_search_result_is_dropped() {
    let mut app = AppState::new(&Settings::default(), Session::default(), Keymap::default());
    app.search_query = "emma".into();
    app.pending_search = Some(5);
    apply_event(&mut app, AppEvent::CatalogLoaded { ticket: 4, users: catalog() });
    assert!(!app.store.has_catalog());
    assert!(app.is_searching());
}

// 6) Settings file roundtrip and init
#[test]
fn settings_roundtrip_and_init() {
    let path = temp_path("settings");
    let mut s = Settings::default();
    s.base_url = "http://127.0.0.1:8080/api".into();
    s.api_key = Some("reqres-free-v1".into());
    s.fetch_concurrency = 2;
    s.write_file(&path).expect("write settings");
    let back = Settings::from_file(&path).expect("read settings");
    assert_eq!(back, s);
    assert_eq!(back.controller_options().fetch_concurrency, 2);

    let init = temp_path("settings_init");
    let _ = std::fs::remove_file(&init);
    let created = Settings::load_or_init(&init);
    assert_eq!(created, Settings::default());
    assert!(std::path::Path::new(&init).exists());

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&init);
}

// 7) Keybinds file roundtrip keeps remapped keys
#[test]
fn keybinds_roundtrip() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use userdeck::app::keymap::KeyAction;

    let path = temp_path("keybinds");
    let km = Keymap::parse("Quit = Ctrl+q\nRefresh = Ctrl+r\n");
    km.write_file(&path).expect("write keybinds");
    let back = Keymap::from_file(&path).expect("read keybinds");
    assert_eq!(
        back.resolve(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)),
        Some(KeyAction::Quit)
    );
    assert_eq!(back.resolve(&KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)), Some(KeyAction::Refresh));
    let _ = std::fs::remove_file(&path);
}
