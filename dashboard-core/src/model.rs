use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Geocoders and hand-written configs disagree in the second decimal place.
const SAME_PLACE_DEGREES: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A named place the dashboard can show weather for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(name: impl Into<String>, country: impl Into<String>, at: Coordinate) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            latitude: at.latitude,
            longitude: at.longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Same name, ignoring ASCII case, and coordinates within about 10 km.
    pub fn is_same_place(&self, other: &City) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && (self.latitude - other.latitude).abs() <= SAME_PLACE_DEGREES
            && (self.longitude - other.longitude).abs() <= SAME_PLACE_DEGREES
    }

    /// "Name, Country", or just the name when the country is unknown.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// The cities shown on the landing page when nothing else is configured.
pub fn default_featured_cities() -> Vec<City> {
    vec![
        City::new("London", "United Kingdom", Coordinate::new(51.5074, -0.1278)),
        City::new(
            "New York",
            "United States",
            Coordinate::new(40.7128, -74.0060),
        ),
        City::new("Tokyo", "Japan", Coordinate::new(35.6762, 139.6503)),
        City::new("Sydney", "Australia", Coordinate::new(-33.8688, 151.2093)),
        City::new("Paris", "France", Coordinate::new(48.8566, 2.3522)),
    ]
}

/// One day of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub condition_code: i32,
}

/// Normalized point-in-time weather for one location.
///
/// Values are kept exactly as the provider sent them; rounding belongs to
/// whoever renders the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub condition_description: String,
    pub condition_icon: String,
    /// ISO 8601 local time, as returned by the provider.
    pub sunrise: String,
    pub sunset: String,
    pub daily_forecast: Vec<DailyForecast>,
    pub alert: Option<String>,
}
