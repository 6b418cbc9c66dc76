use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// What the backend is asked to do with an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl FavoriteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteAction::Add => "add",
            FavoriteAction::Remove => "remove",
        }
    }
}

/// Record of one optimistic toggle, used to confirm or roll it back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteToggle {
    url: String,
    was_favorite: bool,
    ticket: u64,
}

impl FavoriteToggle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Presence of the URL captured before the toggle was applied
    pub fn was_favorite(&self) -> bool {
        self.was_favorite
    }

    /// The request to sync to the backend
    pub fn action(&self) -> FavoriteAction {
        if self.was_favorite {
            FavoriteAction::Remove
        } else {
            FavoriteAction::Add
        }
    }
}

/// Image URLs the user marked as favorite
///
/// Toggles apply locally first. Each toggle snapshots the prior presence
/// before mutating, so a failed sync restores exactly that. A rollback is
/// dropped when a newer toggle of the same URL happened in between.
#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
    urls: BTreeSet<String>,
    latest_ticket: HashMap<String, u64>,
    next_ticket: u64,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set, e.g. with the list loaded from the backend
    pub fn replace_all<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self.latest_ticket.clear();
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Flip the URL's presence immediately and return the undo record
    pub fn toggle(&mut self, url: &str) -> FavoriteToggle {
        let was_favorite = self.urls.contains(url);

        if was_favorite {
            self.urls.remove(url);
        } else {
            self.urls.insert(url.to_string());
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.latest_ticket.insert(url.to_string(), ticket);

        FavoriteToggle {
            url: url.to_string(),
            was_favorite,
            ticket,
        }
    }

    /// Mark a toggle as synced; returns whether it was still the latest one
    pub fn confirm(&mut self, toggle: &FavoriteToggle) -> bool {
        if self.is_latest(toggle) {
            self.latest_ticket.remove(&toggle.url);
            true
        } else {
            false
        }
    }

    /// Restore the pre-toggle presence; returns whether anything was applied
    pub fn rollback(&mut self, toggle: &FavoriteToggle) -> bool {
        if !self.is_latest(toggle) {
            return false;
        }

        if toggle.was_favorite {
            self.urls.insert(toggle.url.clone());
        } else {
            self.urls.remove(&toggle.url);
        }
        self.latest_ticket.remove(&toggle.url);
        true
    }

    /// Whether a toggle of this URL is awaiting sync
    pub fn is_pending(&self, url: &str) -> bool {
        self.latest_ticket.contains_key(url)
    }

    fn is_latest(&self, toggle: &FavoriteToggle) -> bool {
        self.latest_ticket.get(&toggle.url) == Some(&toggle.ticket)
    }
}

/// Two sets are equal when they hold the same URLs
impl PartialEq for FavoriteSet {
    fn eq(&self, other: &Self) -> bool {
        self.urls == other.urls
    }
}

impl Eq for FavoriteSet {}
