use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use lookbook_domain::calendar::{CalendarIndex, MonthStep, YearMonth};
use lookbook_domain::favorites::{FavoriteSet, FavoriteToggle};
use lookbook_domain::view::{ViewPhase, ViewState};
use lookbook_domain::{BackendGateway, CalendarFetch, DomainError};

use crate::application::dtos::{MonthView, PopupView};

/// Shown when the backend declines the calendar fetch without a message
pub const NO_DATA_MESSAGE: &str = "No data found.";

struct CalendarState {
    view: ViewState,
    index: CalendarIndex,
    favorites: FavoriteSet,
    fetching: bool,
}

/// Drives the calendar screen: fetch, month navigation, the day popup and
/// favorites with optimistic updates.
///
/// State is only touched under the lock, and the lock is never held across a
/// backend call.
pub struct CalendarController {
    gateway: Arc<dyn BackendGateway>,
    asset_base: String,
    state: Mutex<CalendarState>,
}

impl CalendarController {
    pub fn new(gateway: Arc<dyn BackendGateway>, asset_base: impl Into<String>, month: YearMonth) -> Self {
        Self {
            gateway,
            asset_base: asset_base.into(),
            state: Mutex::new(CalendarState {
                view: ViewState::new(month),
                index: CalendarIndex::default(),
                favorites: FavoriteSet::new(),
                fetching: false,
            }),
        }
    }

    /// Open on the current local month
    pub fn for_today(gateway: Arc<dyn BackendGateway>, asset_base: impl Into<String>) -> Self {
        Self::new(gateway, asset_base, YearMonth::of(Local::now().date_naive()))
    }

    pub async fn view_state(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn index(&self) -> CalendarIndex {
        self.state.lock().await.index.clone()
    }

    pub async fn favorites(&self) -> FavoriteSet {
        self.state.lock().await.favorites.clone()
    }

    /// Run the fetch the screen is waiting for
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<ViewPhase, DomainError> {
        {
            let mut state = self.state.lock().await;
            if !state.view.is_loading() {
                return Err(DomainError::InvalidState(format!(
                    "Cannot load while {:?}",
                    state.view.phase()
                )));
            }
            if state.fetching {
                return Err(DomainError::InvalidState(
                    "A calendar fetch is already in progress".to_string(),
                ));
            }
            state.fetching = true;
        }

        let fetched = self.fetch().await;

        let mut state = self.state.lock().await;
        state.fetching = false;
        match fetched {
            Ok((index, favorites)) => {
                info!(
                    days = index.len(),
                    skipped = index.skipped_items(),
                    "Calendar loaded"
                );
                state.index = index;
                if let Some(urls) = favorites {
                    state.favorites.replace_all(urls);
                }
                state.view.load_succeeded()?;
            }
            Err(message) => {
                warn!("Calendar load failed: {}", message);
                state.view.load_failed(message)?;
            }
        }
        Ok(state.view.phase().clone())
    }

    /// Leave the error state and fetch again
    pub async fn retry(&self) -> Result<ViewPhase, DomainError> {
        self.state.lock().await.view.retry()?;
        self.load().await
    }

    async fn fetch(&self) -> Result<(CalendarIndex, Option<Vec<String>>), String> {
        let items = match self.gateway.fetch_calendar().await {
            Ok(CalendarFetch::Items(items)) => items,
            Ok(CalendarFetch::Rejected { message }) => {
                return Err(message.unwrap_or_else(|| NO_DATA_MESSAGE.to_string()));
            }
            Err(e) => return Err(format!("Error fetching data: {}", e.user_message())),
        };

        let index = CalendarIndex::ingest(&items, &self.asset_base);

        // Favorites are optional; the calendar is usable without them
        let favorites = match self.gateway.list_favorites().await {
            Ok(urls) => Some(urls),
            Err(e) => {
                warn!("Could not load favorites: {}", e);
                None
            }
        };

        Ok((index, favorites))
    }

    pub async fn select_date(&self, date: NaiveDate) -> Result<PopupView, DomainError> {
        let mut state = self.state.lock().await;
        state.view.select_date(date)?;
        Ok(PopupView::build(date, &state.index, &state.favorites))
    }

    pub async fn close_popup(&self) {
        self.state.lock().await.view.close_popup();
    }

    pub async fn previous_month(&self) -> Result<YearMonth, DomainError> {
        self.navigate(MonthStep::Previous).await
    }

    pub async fn next_month(&self) -> Result<YearMonth, DomainError> {
        self.navigate(MonthStep::Next).await
    }

    pub async fn navigate(&self, step: MonthStep) -> Result<YearMonth, DomainError> {
        let month = self.state.lock().await.view.navigate(step)?;
        debug!("Showing {}", month);
        Ok(month)
    }

    pub async fn month_view(&self) -> MonthView {
        let state = self.state.lock().await;
        MonthView::build(&state.view, &state.index)
    }

    /// The open popup, if any
    pub async fn popup(&self) -> Option<PopupView> {
        let state = self.state.lock().await;
        if !state.view.is_popup_open() {
            return None;
        }
        let date = state.view.selected_date()?;
        Some(PopupView::build(date, &state.index, &state.favorites))
    }

    /// Apply a favorite toggle locally, before any sync
    pub async fn begin_toggle(&self, url: &str) -> Result<FavoriteToggle, DomainError> {
        let mut state = self.state.lock().await;
        if !state.index.contains_image(url) {
            return Err(DomainError::Validation(format!("Unknown image: {url}")));
        }
        Ok(state.favorites.toggle(url))
    }

    /// Settle a toggle with the sync outcome; returns whether the local state changed
    pub async fn complete_toggle(&self, toggle: &FavoriteToggle, synced: Result<(), DomainError>) -> bool {
        let mut state = self.state.lock().await;
        match synced {
            Ok(()) => {
                state.favorites.confirm(toggle);
                false
            }
            Err(e) => {
                let reverted = state.favorites.rollback(toggle);
                if reverted {
                    warn!("Favorite sync failed for {}, reverted: {}", toggle.url(), e);
                } else {
                    debug!("Stale favorite rollback for {} ignored", toggle.url());
                }
                reverted
            }
        }
    }

    /// Optimistically toggle a favorite and sync it.
    ///
    /// Returns the new presence of `url`. On sync failure the toggle is rolled
    /// back and the error returned.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&self, url: &str) -> Result<bool, DomainError> {
        let toggle = self.begin_toggle(url).await?;

        let synced = self.gateway.sync_favorite(url, toggle.action()).await;
        let failure = synced.as_ref().err().cloned();
        self.complete_toggle(&toggle, synced).await;

        match failure {
            Some(e) => Err(e),
            None => Ok(!toggle.was_favorite()),
        }
    }
}
