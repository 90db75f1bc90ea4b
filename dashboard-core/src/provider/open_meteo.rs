use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{NormalizationError, WeatherError},
    fetch::{FetchClient, HttpTransport, RetryPolicy, Transport},
    model::{City, Coordinate, WeatherSnapshot},
    normalize::{WeatherNormalizer, provider_reason},
};

use super::WeatherProvider;

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset";

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Option<Vec<GeoResult>>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider<T = HttpTransport> {
    fetch: FetchClient<T>,
    normalizer: WeatherNormalizer,
    forecast_url: String,
    geocoding_url: String,
}

impl<T: Transport> OpenMeteoProvider<T> {
    pub fn new(fetch: FetchClient<T>, normalizer: WeatherNormalizer) -> Self {
        Self {
            fetch,
            normalizer,
            forecast_url: FORECAST_URL.to_string(),
            geocoding_url: GEOCODING_URL.to_string(),
        }
    }

    /// Point the provider at other endpoints (self-hosted instance, mock server).
    pub fn with_endpoints(mut self, forecast_url: &str, geocoding_url: &str) -> Self {
        self.forecast_url = forecast_url.to_string();
        self.geocoding_url = geocoding_url.to_string();
        self
    }

    pub fn forecast_days(&self) -> usize {
        self.normalizer.forecast_days()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.fetch.policy()
    }

    pub fn forecast_url(&self) -> &str {
        &self.forecast_url
    }

    fn forecast_params(&self, at: Coordinate) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", self.normalizer.forecast_days().to_string()),
        ]
    }
}

#[async_trait]
impl<T: Transport> WeatherProvider for OpenMeteoProvider<T> {
    async fn snapshot(
        &self,
        city: &str,
        at: Coordinate,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!(
            city,
            latitude = at.latitude,
            longitude = at.longitude,
            "fetching forecast"
        );

        let params = self.forecast_params(at);
        let raw = self
            .fetch
            .fetch_json_with_params(&self.forecast_url, &params)
            .await?;

        Ok(self.normalizer.normalize(city, &raw)?)
    }

    async fn geocode(&self, query: &str) -> Result<Option<City>, WeatherError> {
        tracing::debug!(query, "geocoding");

        let params = [
            ("name", query.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];
        let raw = self
            .fetch
            .fetch_json_with_params(&self.geocoding_url, &params)
            .await?;

        Ok(first_place(&raw)?)
    }
}

fn first_place(raw: &Value) -> Result<Option<City>, NormalizationError> {
    if let Some(reason) = provider_reason(raw) {
        return Err(NormalizationError::Provider(reason));
    }

    let parsed = GeoResponse::deserialize(raw)
        .map_err(|e| NormalizationError::Malformed(format!("geocoding: {e}")))?;

    let Some(hit) = parsed.results.unwrap_or_default().into_iter().next() else {
        return Ok(None);
    };

    Ok(Some(City {
        name: hit.name,
        country: hit.country.unwrap_or_default(),
        latitude: hit.latitude,
        longitude: hit.longitude,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alert::NoAlerts, error::FetchError, normalize::fixtures::forecast_body};
    use serde_json::json;
    use std::{sync::Arc, time::Duration};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenMeteoProvider {
        let fetch = FetchClient::http(RetryPolicy::new(2, Duration::from_millis(1), None));
        let normalizer = WeatherNormalizer::new(7, Arc::new(NoAlerts));
        let forecast = format!("{}/v1/forecast", server.uri());
        let search = format!("{}/v1/search", server.uri());

        OpenMeteoProvider::new(fetch, normalizer).with_endpoints(&forecast, &search)
    }

    #[tokio::test]
    async fn snapshot_requests_current_and_daily_fields() {
        let mock_server = MockServer::start().await;
        let body = forecast_body(7, 2);

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "48.8566"))
            .and(query_param("longitude", "2.3522"))
            .and(query_param("current", CURRENT_FIELDS))
            .and(query_param("daily", DAILY_FIELDS))
            .and(query_param("forecast_days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let snapshot = provider_for(&mock_server)
            .snapshot("Paris", Coordinate::new(48.8566, 2.3522))
            .await
            .unwrap();

        assert_eq!(snapshot.city, "Paris");
        assert_eq!(snapshot.condition_description, "Partly cloudy");
        assert_eq!(snapshot.daily_forecast.len(), 7);
    }

    #[tokio::test]
    async fn provider_reason_is_a_domain_failure_and_not_retried() {
        let mock_server = MockServer::start().await;
        let body = json!({"error": true, "reason": "Latitude must be in range"});

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server)
            .snapshot("Nowhere", Coordinate::new(123.0, 0.0))
            .await
            .unwrap_err();

        assert!(err.is_domain());
        assert!(err.to_string().contains("Latitude must be in range"));
    }

    #[tokio::test]
    async fn unreachable_forecast_is_a_transport_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&mock_server)
            .await;

        let err = provider_for(&mock_server)
            .snapshot("London", Coordinate::new(51.5, -0.12))
            .await
            .unwrap_err();

        let WeatherError::Transport(FetchError::MaxRetriesExceeded { attempts, .. }) = &err else {
            panic!("expected a transport failure, got {err:?}");
        };
        assert_eq!(*attempts, 2);
    }

    #[tokio::test]
    async fn geocode_returns_first_result() {
        let mock_server = MockServer::start().await;
        let body = json!({
            "results": [
                {
                    "name": "Berlin",
                    "country": "Germany",
                    "latitude": 52.52,
                    "longitude": 13.41
                },
                {
                    "name": "Berlin",
                    "country": "United States",
                    "latitude": 44.47,
                    "longitude": -71.18
                }
            ]
        });

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Berlin"))
            .and(query_param("count", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server);
        let place = provider.geocode("Berlin").await.unwrap().unwrap();

        assert_eq!(place.label(), "Berlin, Germany");
        assert_eq!(place.coordinate(), Coordinate::new(52.52, 13.41));
    }

    #[tokio::test]
    async fn geocode_without_results_is_none() {
        let mock_server = MockServer::start().await;
        let body = json!({"generationtime_ms": 0.4});

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = provider_for(&mock_server);
        assert_eq!(provider.geocode("Qwxzzy").await.unwrap(), None);
    }

    #[test]
    fn empty_results_and_missing_country() {
        assert_eq!(first_place(&json!({"results": []})).unwrap(), None);

        let body = json!({
            "results": [{"name": "Null Island", "latitude": 0.0, "longitude": 0.0}]
        });
        let place = first_place(&body).unwrap().unwrap();
        assert_eq!(place.country, "");
    }

    #[test]
    fn geocoding_reason_is_reported() {
        let body = json!({"error": true, "reason": "Parameter count must be between 1 and 100"});
        let err = first_place(&body).unwrap_err();
        assert!(matches!(err, NormalizationError::Provider(_)));
    }
}
