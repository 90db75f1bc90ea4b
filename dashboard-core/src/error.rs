use thiserror::Error;

/// A single failed transport attempt: the request never produced a usable
/// 2xx JSON body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Terminal failure of the resilient fetch client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("max retries exceeded")]
    MaxRetriesExceeded {
        attempts: u32,
        last_error: Option<TransportError>,
    },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// A well-formed response that is semantically an error or incomplete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("provider reported an error: {0}")]
    Provider(String),

    #[error("response is missing the `{0}` section")]
    MissingSection(&'static str),

    #[error("daily series has {found} entries, expected {expected}")]
    IncompleteSeries { expected: usize, found: usize },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Everything that can go wrong while producing a snapshot or a geocoding hit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("transport failure: {0}")]
    Transport(#[from] FetchError),

    #[error("domain failure: {0}")]
    Domain(#[from] NormalizationError),
}

impl WeatherError {
    pub fn is_transport(&self) -> bool {
        matches!(self, WeatherError::Transport(_))
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, WeatherError::Domain(_))
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::Transport(_) => "transport",
            WeatherError::Domain(_) => "domain",
        }
    }
}
