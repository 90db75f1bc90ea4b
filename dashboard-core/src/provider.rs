use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    Config, WeatherError,
    alert::RandomAlerts,
    fetch::FetchClient,
    model::{City, Coordinate, WeatherSnapshot},
    normalize::WeatherNormalizer,
    provider::open_meteo::OpenMeteoProvider,
};

pub mod open_meteo;

/// Where the dashboard gets its data from.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch and normalize current conditions plus the daily forecast.
    async fn snapshot(&self, city: &str, at: Coordinate) -> Result<WeatherSnapshot, WeatherError>;

    /// Resolve a free-text place name. `Ok(None)` means "no such place".
    async fn geocode(&self, query: &str) -> Result<Option<City>, WeatherError>;
}

/// Build the Open-Meteo provider described by `config`.
pub fn provider_from_config(config: &Config) -> OpenMeteoProvider {
    let alerts = Arc::new(RandomAlerts::new(config.dashboard.alert_probability));
    let normalizer = WeatherNormalizer::new(config.dashboard.forecast_days, alerts);

    let fetch = FetchClient::http(config.retry.policy());
    let endpoints = &config.provider;

    OpenMeteoProvider::new(fetch, normalizer)
        .with_endpoints(&endpoints.forecast_url, &endpoints.geocoding_url)
}
