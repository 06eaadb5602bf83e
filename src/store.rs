//! Normalized local cache of user records.
//!
//! Every known record lives once in `records`. The current page and the full
//! catalog (loaded lazily for search) are ordered id lists over that map, so
//! a mutation touches one record and every view sees it.

use std::collections::{HashMap, HashSet};

use crate::api::{User, UserId, UserPage, UserPatch};

#[derive(Clone, Debug, Default)]
pub struct UserStore {
    records: HashMap<UserId, User>,
    page_ids: Vec<UserId>,
    catalog_ids: Option<Vec<UserId>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current page with `page.data`, in server order. Fresh
    /// records overwrite stored ones, local edits included.
    pub fn replace_page(&mut self, page: &UserPage) {
        self.page_ids = page.data.iter().map(|u| u.id).collect();
        for user in &page.data {
            self.records.insert(user.id, user.clone());
        }
        self.prune();
    }

    /// Replace the catalog with every user across all pages.
    pub fn replace_catalog(&mut self, users: Vec<User>) {
        let mut ids = Vec::with_capacity(users.len());
        for user in users {
            ids.push(user.id);
            self.records.insert(user.id, user);
        }
        self.catalog_ids = Some(ids);
        self.prune();
    }

    /// Forget the catalog; the next search fetches it again.
    pub fn invalidate_catalog(&mut self) {
        self.catalog_ids = None;
        self.prune();
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog_ids.is_some()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn page_users(&self) -> Vec<&User> {
        self.resolve(&self.page_ids)
    }

    /// Catalog view; empty when the catalog has not been loaded.
    pub fn catalog_users(&self) -> Vec<&User> {
        match &self.catalog_ids {
            Some(ids) => self.resolve(ids),
            None => Vec::new(),
        }
    }

    /// Merge `patch` into the stored record. Returns false when `id` is unknown.
    pub fn apply_patch(&mut self, id: UserId, patch: &UserPatch) -> bool {
        match self.records.get_mut(&id) {
            Some(user) => {
                patch.apply_to(user);
                true
            }
            None => false,
        }
    }

    /// Drop a record from every view.
    pub fn remove(&mut self, id: UserId) -> Option<User> {
        self.page_ids.retain(|x| *x != id);
        if let Some(ids) = self.catalog_ids.as_mut() {
            ids.retain(|x| *x != id);
        }
        self.records.remove(&id)
    }

    fn resolve(&self, ids: &[UserId]) -> Vec<&User> {
        ids.iter().filter_map(|id| self.records.get(id)).collect()
    }

    fn prune(&mut self) {
        let mut live: HashSet<UserId> = self.page_ids.iter().copied().collect();
        if let Some(ids) = &self.catalog_ids {
            live.extend(ids.iter().copied());
        }
        self.records.retain(|id, _| live.contains(id));
    }
}
