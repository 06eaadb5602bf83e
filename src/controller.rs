//! List-and-search controller.
//!
//! Spawns network work on the Tokio runtime and reports back to the UI loop
//! through an unbounded channel of [`AppEvent`]s. Every page load and search
//! gets a [`Ticket`]; issuing a new one cancels the previous request of the
//! same kind, and the app ignores results carrying a stale ticket.

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiError, Session, User, UserId, UserPage, UserPatch, UserService};

pub type Ticket = u64;

/// Results delivered from background tasks to the UI loop.
#[derive(Clone, Debug)]
pub enum AppEvent {
    PageLoaded { ticket: Ticket, page: UserPage },
    PageFailed { ticket: Ticket, page: u32, error: ApiError },
    CatalogLoaded { ticket: Ticket, users: Vec<User> },
    CatalogFailed { ticket: Ticket, error: ApiError },
    UserUpdated { id: UserId, patch: UserPatch },
    UpdateFailed { id: UserId, error: ApiError },
    UserDeleted { user: User },
    DeleteFailed { user: User, error: ApiError },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Quiet period after the last keystroke before the catalog is fetched.
    pub debounce: Duration,
    /// Upper bound on concurrent page requests while fetching the catalog.
    pub fetch_concurrency: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(300), fetch_concurrency: 4 }
    }
}

struct InFlight {
    ticket: Ticket,
    cancel: CancellationToken,
}

pub struct Controller {
    service: Arc<dyn UserService>,
    runtime: Handle,
    events: UnboundedSender<AppEvent>,
    options: ControllerOptions,
    next_ticket: Ticket,
    page_request: Option<InFlight>,
    search_request: Option<InFlight>,
}

impl Controller {
    pub fn new(
        service: Arc<dyn UserService>,
        runtime: Handle,
        events: UnboundedSender<AppEvent>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            service,
            runtime,
            events,
            options,
            next_ticket: 0,
            page_request: None,
            search_request: None,
        }
    }

    fn issue(&mut self) -> (Ticket, CancellationToken) {
        self.next_ticket += 1;
        (self.next_ticket, CancellationToken::new())
    }

    /// Fetch one page; supersedes any page request still in flight.
    pub fn fetch_page(&mut self, page: u32) -> Ticket {
        if let Some(prev) = self.page_request.take() {
            prev.cancel.cancel();
        }
        let (ticket, cancel) = self.issue();
        self.page_request = Some(InFlight { ticket, cancel: cancel.clone() });

        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        debug!(ticket, page, "fetching page");
        self.runtime.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(ticket, page, "page request superseded");
                    return;
                }
                r = service.list_page(page) => r,
            };
            let event = match result {
                Ok(loaded) => AppEvent::PageLoaded { ticket, page: loaded },
                Err(error) => {
                    warn!(ticket, page, %error, "page request failed");
                    AppEvent::PageFailed { ticket, page, error }
                }
            };
            let _ = events.send(event);
        });
        ticket
    }

    /// Debounced catalog fetch for search; supersedes any earlier search.
    pub fn search(&mut self) -> Ticket {
        self.cancel_search();
        let (ticket, cancel) = self.issue();
        self.search_request = Some(InFlight { ticket, cancel: cancel.clone() });

        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let ControllerOptions { debounce, fetch_concurrency } = self.options;
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(ticket, "catalog fetch superseded");
                    return;
                }
                r = fetch_catalog(service.as_ref(), fetch_concurrency) => r,
            };
            let event = match result {
                Ok(users) => {
                    info!(ticket, count = users.len(), "catalog loaded");
                    AppEvent::CatalogLoaded { ticket, users }
                }
                Err(error) => {
                    warn!(ticket, %error, "catalog fetch failed");
                    AppEvent::CatalogFailed { ticket, error }
                }
            };
            let _ = events.send(event);
        });
        ticket
    }

    /// Cancel the in-flight search, if any. Returns its ticket.
    pub fn cancel_search(&mut self) -> Option<Ticket> {
        self.search_request.take().map(|prev| {
            prev.cancel.cancel();
            prev.ticket
        })
    }

    pub fn update_user(&self, id: UserId, patch: UserPatch, session: &Session) {
        let token = match session.bearer() {
            Ok(t) => t.to_string(),
            Err(error) => {
                let _ = self.events.send(AppEvent::UpdateFailed { id, error });
                return;
            }
        };
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let event = match service.update_user(id, &patch, &token).await {
                Ok(()) => {
                    info!(id, "user updated");
                    AppEvent::UserUpdated { id, patch }
                }
                Err(error) => {
                    warn!(id, %error, "update failed");
                    AppEvent::UpdateFailed { id, error }
                }
            };
            let _ = events.send(event);
        });
    }

    pub fn delete_user(&self, user: User, session: &Session) {
        let token = match session.bearer() {
            Ok(t) => t.to_string(),
            Err(error) => {
                let _ = self.events.send(AppEvent::DeleteFailed { user, error });
                return;
            }
        };
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let event = match service.delete_user(user.id, &token).await {
                Ok(()) => {
                    info!(id = user.id, "user deleted");
                    AppEvent::UserDeleted { user }
                }
                Err(error) => {
                    warn!(id = user.id, %error, "delete failed");
                    AppEvent::DeleteFailed { user, error }
                }
            };
            let _ = events.send(event);
        });
    }
}

/// Fetch every page: page 1 first to learn `total_pages`, then the rest with
/// at most `concurrency` requests in flight. Results keep page order; any
/// failing page fails the whole fetch.
pub async fn fetch_catalog(service: &dyn UserService, concurrency: usize) -> Result<Vec<User>, ApiError> {
    let first = service.list_page(1).await?;
    let total_pages = first.total_pages;
    let mut users = first.data;

    let rest: Vec<Vec<User>> = stream::iter(2..=total_pages)
        .map(|page| async move { service.list_page(page).await.map(|p| p.data) })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    for batch in rest {
        users.extend(batch);
    }
    Ok(users)
}
