//! The dashboard application context and the user actions it handles.
//!
//! Every lookup, whatever triggered it, goes through the same fetch flow:
//! [`Dashboard::begin_fetch`] prepares the page and hands out a
//! [`FetchTicket`]; [`Dashboard::complete_fetch`] applies the outcome unless a
//! newer fetch has started in the meantime.

use chrono::{DateTime, Local};
use std::fmt;
use tracing::{debug, info, warn};

use crate::{
    client::{FetchResult, WeatherClient},
    config::Config,
    geolocation::{GeoState, LocationSource, locate},
    render::{IconSet, Page},
    store::HistoryStore,
};

pub const LOCATION_DENIED_MESSAGE: &str =
    "Location access denied. Please search for a city manually.";
pub const LOCATION_UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported on this system.";

type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Proof that a fetch was started; stale tickets are ignored on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket {
    generation: u64,
}

pub struct Dashboard {
    client: Box<dyn WeatherClient>,
    history: HistoryStore,
    icons: IconSet,
    default_city: String,
    page: Page,
    generation: u64,
    clock: Clock,
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("client", &self.client)
            .field("history", &self.history)
            .field("icons", &self.icons)
            .field("default_city", &self.default_city)
            .field("page", &self.page)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(config: &Config, client: Box<dyn WeatherClient>, history: HistoryStore) -> Self {
        Self {
            client,
            history,
            icons: config.icon_set(),
            default_city: config.default_city.clone(),
            page: Page::new(),
            generation: 0,
            clock: Box::new(Local::now),
        }
    }

    /// Replace the wall clock used for the current-weather date.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn history(&self) -> Vec<String> {
        self.history.load()
    }

    /// Re-render the history list from storage.
    pub fn refresh_history(&mut self) {
        let entries = self.history.load();
        self.page.render_history(&entries);
    }

    /// Type text into the search box without submitting.
    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.page.search_input = text.into();
    }

    /// Submit the search form with `input`. Blank input does nothing and
    /// returns `false`.
    pub async fn submit(&mut self, input: &str) -> bool {
        let city = input.trim();
        if city.is_empty() {
            return false;
        }

        self.page.search_input.clear();
        self.fetch_city(city).await;
        true
    }

    /// Click on the history list. Indices past the end are not buttons.
    pub async fn select_history(&mut self, index: usize) -> bool {
        let Some(button) = self.page.history.get(index) else {
            debug!(index, "history click outside any button");
            return false;
        };

        let city = button.city.clone();
        self.fetch_city(&city).await;
        true
    }

    pub fn clear_history(&mut self) {
        if let Err(err) = self.history.clear() {
            warn!(%err, "failed to clear history");
        }
        self.refresh_history();
    }

    pub async fn fetch_city(&mut self, city: &str) -> bool {
        let ticket = self.begin_fetch();
        let result = self.client.fetch_by_city(city).await;
        self.complete_fetch(ticket, result)
    }

    pub async fn fetch_coordinates(&mut self, lat: f64, lon: f64) -> bool {
        let ticket = self.begin_fetch();
        let result = self.client.fetch_by_coordinates(lat, lon).await;
        self.complete_fetch(ticket, result)
    }

    /// Hide the error, clear the forecast, show the loader.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;

        self.page.clear_error();
        self.page.clear_forecast();
        self.page.set_loading(true);

        FetchTicket {
            generation: self.generation,
        }
    }

    /// Apply a finished lookup. Returns `true` only when the page now shows
    /// fresh weather.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: FetchResult) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                latest = self.generation,
                "discarding stale weather response"
            );
            return false;
        }

        self.page.set_loading(false);

        match result {
            Ok(report) => {
                let now = (self.clock)();
                self.page.render_current_weather(&report.current, &now, &self.icons);
                self.page.render_forecast(&report.forecast, &self.icons);

                if let Err(err) = self.history.record(&report.current.city) {
                    warn!(%err, city = %report.current.city, "failed to save city to history");
                }
                self.refresh_history();

                info!(city = %report.current.city, "weather displayed");
                true
            }
            Err(err) => {
                self.page.render_error(err.to_string());
                false
            }
        }
    }

    /// Locate the user and show their weather, falling back to the default
    /// city when location fails and nothing has been searched yet.
    pub async fn bootstrap(&mut self, source: &dyn LocationSource) -> GeoState {
        let state = locate(source).await;

        match &state {
            GeoState::Resolved(coords) => {
                let shown = self
                    .fetch_coordinates(coords.latitude, coords.longitude)
                    .await;
                if !shown {
                    self.fall_back_to_default_city().await;
                }
            }
            GeoState::Denied(_) => {
                self.page.render_error(LOCATION_DENIED_MESSAGE);
                self.fall_back_to_default_city().await;
            }
            GeoState::Unsupported => {
                self.page.render_error(LOCATION_UNSUPPORTED_MESSAGE);
            }
            GeoState::Idle | GeoState::Requesting => {}
        }

        state
    }

    async fn fall_back_to_default_city(&mut self) {
        if !self.history.is_empty() {
            return;
        }

        let city = self.default_city.clone();
        info!(%city, "no history yet, showing default city");
        self.fetch_city(&city).await;
    }
}
