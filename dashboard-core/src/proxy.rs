//! Server-side pass-through to the keyed upstream weather API.
//!
//! The browser never sees the secret: it asks `/api/weather?location=...`
//! and gets the upstream JSON back, or an `{ "error": ... }` body.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use crate::Config;

pub const MISSING_LOCATION: &str = "Location query parameter is required.";
pub const NOT_CONFIGURED: &str = "Weather service is not configured.";
pub const UPSTREAM_FAILED: &str = "Failed to fetch weather data.";

const FORECAST_DAYS: &str = "7";

/// Status plus JSON body, ready to be written to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ProxyReply {
    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProxy {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherProxy {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.upstream.base_url.clone(),
            config.api_key().map(str::to_owned),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Forward one request. Never fails: every outcome is a reply.
    pub async fn forward(&self, location: Option<&str>) -> ProxyReply {
        let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) else {
            return ProxyReply::error(StatusCode::BAD_REQUEST, MISSING_LOCATION);
        };

        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("upstream API key is not configured");
            return ProxyReply::error(StatusCode::SERVICE_UNAVAILABLE, NOT_CONFIGURED);
        };

        let url = format!("{}/forecast.json", self.base_url.trim_end_matches('/'));
        let query = [("key", api_key), ("q", location), ("days", FORECAST_DAYS)];

        let res = match self.http.get(&url).query(&query).send().await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(location, error = %log_safe(e), "upstream request failed");
                return ProxyReply::error(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILED);
            }
        };

        let status = res.status();
        let body = match res.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(location, error = %log_safe(e), "failed to read upstream body");
                return ProxyReply::error(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILED);
            }
        };
        let parsed = serde_json::from_str::<Value>(&body).ok();

        if !status.is_success() {
            let message = parsed.as_ref().and_then(upstream_message);
            tracing::warn!(location, %status, reason = message, "upstream returned an error");
            return ProxyReply::error(status, message.unwrap_or(UPSTREAM_FAILED));
        }

        match parsed {
            Some(value) => ProxyReply {
                status: StatusCode::OK,
                body: value,
            },
            None => {
                tracing::warn!(
                    location,
                    body = truncate_body(&body),
                    "upstream sent non-JSON body"
                );
                ProxyReply::error(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILED)
            }
        }
    }
}

/// Error text without the request URL: the URL's query carries the key.
fn log_safe(e: reqwest::Error) -> String {
    e.without_url().to_string()
}

/// Best-effort error text from an upstream error body.
fn upstream_message(body: &Value) -> Option<&str> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .or_else(|| body.get("message").and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Nothing listens on port 9 (discard) on a test machine.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    #[tokio::test]
    async fn missing_location_is_bad_request() {
        let proxy = WeatherProxy::new("http://unused", Some("KEY".into()));

        for location in [None, Some(""), Some("   ")] {
            let reply = proxy.forward(location).await;
            assert_eq!(reply.status, StatusCode::BAD_REQUEST);
            assert_eq!(
                reply.body,
                json!({"error": "Location query parameter is required."})
            );
        }
    }

    #[tokio::test]
    async fn missing_credentials_is_service_unavailable() {
        let proxy = WeatherProxy::new("http://unused", None);
        assert!(!proxy.is_configured());

        let reply = proxy.forward(Some("London")).await;

        assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(reply.body["error"], NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn success_forwards_upstream_body_verbatim() {
        let mock_server = MockServer::start().await;
        let upstream = json!({"location": {"name": "London"}, "current": {"temp_c": 14.2}});

        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .and(query_param("key", "SECRET"))
            .and(query_param("q", "London"))
            .and(query_param("days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
            .mount(&mock_server)
            .await;

        let base = format!("{}/v1/", mock_server.uri());
        let proxy = WeatherProxy::new(base, Some("SECRET".into()));
        let reply = proxy.forward(Some(" London ")).await;

        let expected = ProxyReply {
            status: StatusCode::OK,
            body: upstream,
        };
        assert_eq!(reply, expected);
    }

    #[tokio::test]
    async fn upstream_error_status_and_message_are_forwarded() {
        let mock_server = MockServer::start().await;
        let body = json!({"error": {"code": 1006, "message": "No matching location found."}});

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(body))
            .mount(&mock_server)
            .await;

        let proxy = WeatherProxy::new(mock_server.uri(), Some("SECRET".into()));
        let reply = proxy.forward(Some("Atlantis")).await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "No matching location found.");
    }

    #[tokio::test]
    async fn upstream_error_without_message_uses_default() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&mock_server)
            .await;

        let proxy = WeatherProxy::new(mock_server.uri(), Some("SECRET".into()));
        let reply = proxy.forward(Some("Paris")).await;

        assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
        assert_eq!(reply.body["error"], UPSTREAM_FAILED);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_internal_error() {
        let proxy = WeatherProxy::new(UNREACHABLE, Some("SECRET".into()));
        let reply = proxy.forward(Some("Paris")).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body["error"], UPSTREAM_FAILED);
    }

    #[tokio::test]
    async fn logged_send_error_does_not_contain_the_key() {
        let url = format!("{UNREACHABLE}/forecast.json");
        let query = [("key", "TOPSECRET"), ("q", "Paris"), ("days", "7")];

        let err = Client::new()
            .get(&url)
            .query(&query)
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TOPSECRET"), "{err}");

        let logged = log_safe(err);
        assert!(!logged.contains("TOPSECRET"), "{logged}");
        assert!(!logged.is_empty());
    }

    #[test]
    fn message_extraction_prefers_nested_message() {
        let nested = json!({"error": {"message": "nested"}, "message": "flat"});
        assert_eq!(upstream_message(&nested), Some("nested"));

        let plain = json!({"error": "plain"});
        assert_eq!(upstream_message(&plain), Some("plain"));

        let flat = json!({"message": "flat"});
        assert_eq!(upstream_message(&flat), Some("flat"));

        let code_only = json!({"error": {"code": 1}});
        assert_eq!(upstream_message(&code_only), None);

        let blank = json!({"message": ""});
        assert_eq!(upstream_message(&blank), None);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
