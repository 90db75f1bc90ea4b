//! Two-page navigation for the dashboard front end.
//!
//! All UI state lives in an [`AppState`] value. [`ViewController::handle`]
//! takes the state and an [`Event`] and returns the next state; [`render`]
//! turns a state into what should be on screen. Nothing here draws anything.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;

use crate::{
    config::DEFAULT_NOTIFICATION_SECS,
    error::WeatherError,
    model::{City, WeatherSnapshot},
    provider::WeatherProvider,
};

pub const EMPTY_SEARCH: &str = "Please enter a city name.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Landing,
    Details,
}

/// One row of the city table.
#[derive(Debug, Clone, PartialEq)]
pub struct CityEntry {
    pub city: City,
    /// Shown on the landing page.
    pub featured: bool,
    /// Last successful fetch. Never expires on its own.
    pub snapshot: Option<WeatherSnapshot>,
}

/// A transient message that disappears once `ttl` has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub raised_at: Instant,
    pub ttl: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= self.ttl
    }
}

/// Entries are only ever appended, so an index stays valid for the lifetime
/// of the state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    page: Page,
    cities: Vec<CityEntry>,
    selected: Option<usize>,
    notification: Option<Notification>,
}

impl AppState {
    /// Landing page with an empty table of the given featured cities.
    pub fn new(featured: impl IntoIterator<Item = City>) -> Self {
        let mut state = Self::default();
        for city in featured {
            if state.position(&city.name).is_none() {
                state.cities.push(CityEntry {
                    city,
                    featured: true,
                    snapshot: None,
                });
            }
        }
        state
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn cities(&self) -> &[CityEntry] {
        &self.cities
    }

    pub fn featured(&self) -> impl Iterator<Item = &CityEntry> {
        self.cities.iter().filter(|entry| entry.featured)
    }

    /// First entry with this name, ignoring ASCII case.
    pub fn entry(&self, name: &str) -> Option<&CityEntry> {
        self.position(name).map(|i| &self.cities[i])
    }

    pub fn selected(&self) -> Option<&CityEntry> {
        self.selected.and_then(|i| self.cities.get(i))
    }

    /// The current notification, unless it has already expired.
    pub fn notification(&self, now: Instant) -> Option<&Notification> {
        self.notification.as_ref().filter(|n| !n.is_expired(now))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.cities
            .iter()
            .position(|entry| entry.city.name.eq_ignore_ascii_case(name))
    }

    fn place_position(&self, city: &City) -> Option<usize> {
        self.cities
            .iter()
            .position(|entry| entry.city.is_same_place(city))
    }

    /// Store a snapshot on the entry for the same place as `city`, adding a
    /// non-featured entry if there is none. Returns the entry's index.
    fn store(&mut self, city: City, snapshot: Option<WeatherSnapshot>) -> usize {
        match self.place_position(&city) {
            Some(i) => {
                self.cities[i].snapshot = snapshot;
                i
            }
            None => {
                self.cities.push(CityEntry {
                    city,
                    featured: false,
                    snapshot,
                });
                self.cities.len() - 1
            }
        }
    }

    fn show_details(&mut self, index: usize) {
        self.selected = Some(index);
        self.page = Page::Details;
    }

    fn show_landing(&mut self) {
        self.page = Page::Landing;
        self.selected = None;
    }

    fn notify(&mut self, message: String, ttl: Duration) {
        self.notification = Some(Notification {
            message,
            raised_at: Instant::now(),
            ttl,
        });
    }

    fn dismiss_expired(&mut self, now: Instant) {
        self.notification = self.notification.take().filter(|n| !n.is_expired(now));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Page load: fetch every featured city and show the landing page.
    LoadLanding,
    /// A city card was clicked.
    SelectCity(String),
    /// The search form was submitted.
    Search(String),
    Back,
    /// Timer tick; drops an expired notification.
    Tick(Instant),
}

#[derive(Debug, Clone)]
pub struct ViewController<P> {
    provider: P,
    notification_ttl: Duration,
}

impl<P: WeatherProvider> ViewController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_SECS),
        }
    }

    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn handle(&self, mut state: AppState, event: Event) -> AppState {
        match event {
            Event::LoadLanding => self.load_landing(state).await,
            Event::SelectCity(name) => self.select_city(state, &name).await,
            Event::Search(query) => self.search(state, &query).await,
            Event::Back => {
                state.show_landing();
                state
            }
            Event::Tick(now) => {
                state.dismiss_expired(now);
                state
            }
        }
    }

    /// Fetch all featured cities at once and wait for every one of them.
    /// A failed city keeps a placeholder card; the others are unaffected.
    async fn load_landing(&self, mut state: AppState) -> AppState {
        let featured: Vec<City> = state.featured().map(|entry| entry.city.clone()).collect();

        let fetches = featured
            .iter()
            .map(|city| self.provider.snapshot(&city.name, city.coordinate()));
        let results = join_all(fetches).await;

        let mut failed = 0;
        for (city, result) in featured.into_iter().zip(results) {
            let snapshot = match result {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    log_failure(&city.name, &e);
                    failed += 1;
                    None
                }
            };
            state.store(city, snapshot);
        }

        let cities = state.featured().count();
        tracing::info!(cities, failed, "landing page loaded");
        state.show_landing();
        state
    }

    async fn select_city(&self, mut state: AppState, name: &str) -> AppState {
        let Some(i) = state.position(name) else {
            tracing::warn!(city = name, "selected city is not in the table");
            state.notify(fetch_failed(name), self.notification_ttl);
            return state;
        };

        if state.cities[i].snapshot.is_some() {
            state.show_details(i);
            return state;
        }

        let city = state.cities[i].city.clone();
        self.fetch_and_show(state, city).await
    }

    async fn search(&self, mut state: AppState, query: &str) -> AppState {
        let query = query.trim();
        if query.is_empty() {
            state.notify(EMPTY_SEARCH.to_string(), self.notification_ttl);
            return state;
        }

        let city = match self.provider.geocode(query).await {
            Ok(Some(city)) => city,
            Ok(None) => {
                tracing::info!(query, "no geocoding match");
                state.notify(fetch_failed(query), self.notification_ttl);
                return state;
            }
            Err(e) => {
                log_failure(query, &e);
                state.notify(fetch_failed(query), self.notification_ttl);
                return state;
            }
        };

        // A namesake elsewhere is a different entry, not a refresh of this one.
        let held = state
            .place_position(&city)
            .filter(|&i| state.cities[i].snapshot.is_some());
        if let Some(i) = held {
            state.show_details(i);
            return state;
        }

        self.fetch_and_show(state, city).await
    }

    async fn fetch_and_show(&self, mut state: AppState, city: City) -> AppState {
        let at = city.coordinate();
        match self.provider.snapshot(&city.name, at).await {
            Ok(snapshot) => {
                let i = state.store(city, Some(snapshot));
                state.show_details(i);
            }
            Err(e) => {
                log_failure(&city.name, &e);
                state.notify(fetch_failed(&city.name), self.notification_ttl);
            }
        }
        state
    }
}

fn fetch_failed(what: &str) -> String {
    format!("Could not fetch weather for {what}.")
}

fn log_failure(city: &str, err: &WeatherError) {
    match err {
        WeatherError::Transport(e) => {
            tracing::warn!(city, kind = err.kind(), error = %e, "weather fetch failed")
        }
        WeatherError::Domain(e) => {
            tracing::warn!(city, kind = err.kind(), error = %e, "provider response rejected")
        }
    }
}

/// A landing-page card.
#[derive(Debug, Clone, PartialEq)]
pub enum CityCard<'a> {
    Ready {
        city: &'a City,
        snapshot: &'a WeatherSnapshot,
    },
    /// No data: the last fetch failed or never ran.
    Placeholder { city: &'a City },
}

impl CityCard<'_> {
    pub fn city(&self) -> &City {
        match self {
            CityCard::Ready { city, .. } | CityCard::Placeholder { city } => *city,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, CityCard::Placeholder { .. })
    }
}

/// Everything a front end needs to draw the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Landing {
        cards: Vec<CityCard<'a>>,
        notification: Option<&'a str>,
    },
    Details {
        city: &'a City,
        snapshot: &'a WeatherSnapshot,
        notification: Option<&'a str>,
    },
}

impl View<'_> {
    pub fn notification(&self) -> Option<&str> {
        match self {
            View::Landing { notification, .. } => *notification,
            View::Details { notification, .. } => *notification,
        }
    }
}

pub fn render(state: &AppState, now: Instant) -> View<'_> {
    let notification = state.notification(now).map(|n| n.message.as_str());

    if let Some((city, snapshot)) = details(state) {
        return View::Details {
            city,
            snapshot,
            notification,
        };
    }

    let cards = state
        .featured()
        .map(|entry| match &entry.snapshot {
            Some(snapshot) => CityCard::Ready {
                city: &entry.city,
                snapshot,
            },
            None => CityCard::Placeholder { city: &entry.city },
        })
        .collect();

    View::Landing {
        cards,
        notification,
    }
}

/// The selected city, if the details page is showing and it has data.
fn details(state: &AppState) -> Option<(&City, &WeatherSnapshot)> {
    if state.page != Page::Details {
        return None;
    }
    let entry = state.selected()?;
    Some((&entry.city, entry.snapshot.as_ref()?))
}
