//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - A resilient JSON fetch client (bounded retries, exponential backoff)
//! - Normalization of provider responses into weather snapshots
//! - The weather-code catalog and pluggable alert sources
//! - View state and navigation for the dashboard front end
//! - The credential-hiding proxy to the upstream weather API
//! - Configuration handling
//!
//! It is used by `dashboard-cli`, but can also be reused by other binaries or services.

pub mod alert;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod proxy;
pub mod view;

pub use alert::{AlertSource, FixedAlert, NoAlerts, RandomAlerts};
pub use config::Config;
pub use error::{FetchError, NormalizationError, TransportError, WeatherError};
pub use fetch::{FetchClient, HttpTransport, RetryPolicy, Transport, TransportResponse};
pub use model::{City, Coordinate, DailyForecast, WeatherSnapshot};
pub use normalize::WeatherNormalizer;
pub use provider::{WeatherProvider, open_meteo::OpenMeteoProvider, provider_from_config};
pub use proxy::{ProxyReply, WeatherProxy};
pub use view::{AppState, CityCard, Event, Page, View, ViewController, render};
