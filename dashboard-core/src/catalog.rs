//! Lookup from WMO weather codes to a human description and an icon glyph.
//!
//! See the "WMO Weather interpretation codes" table at
//! <https://open-meteo.com/en/docs#weathervariables>.

use serde::Serialize;

/// Human-facing rendering of a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub description: &'static str,
    pub icon: &'static str,
}

impl Condition {
    const fn new(description: &'static str, icon: &'static str) -> Self {
        Self { description, icon }
    }
}

/// Returned for any code outside the known set.
pub const UNKNOWN: Condition = Condition::new("Unknown", "");

const KNOWN: &[(i32, Condition)] = &[
    (0, Condition::new("Clear sky", "☀️")),
    (1, Condition::new("Mainly clear", "🌤️")),
    (2, Condition::new("Partly cloudy", "⛅")),
    (3, Condition::new("Overcast", "☁️")),
    (45, Condition::new("Fog", "🌫️")),
    (48, Condition::new("Depositing rime fog", "🌫️")),
    (51, Condition::new("Light drizzle", "🌦️")),
    (53, Condition::new("Moderate drizzle", "🌦️")),
    (55, Condition::new("Dense drizzle", "🌧️")),
    (56, Condition::new("Light freezing drizzle", "🌧️")),
    (57, Condition::new("Dense freezing drizzle", "🌧️")),
    (61, Condition::new("Slight rain", "🌦️")),
    (63, Condition::new("Moderate rain", "🌧️")),
    (65, Condition::new("Heavy rain", "🌧️")),
    (66, Condition::new("Light freezing rain", "🌨️")),
    (67, Condition::new("Heavy freezing rain", "🌨️")),
    (71, Condition::new("Slight snow fall", "🌨️")),
    (73, Condition::new("Moderate snow fall", "❄️")),
    (75, Condition::new("Heavy snow fall", "❄️")),
    (77, Condition::new("Snow grains", "🌨️")),
    (80, Condition::new("Slight rain showers", "🌦️")),
    (81, Condition::new("Moderate rain showers", "🌧️")),
    (82, Condition::new("Violent rain showers", "⛈️")),
    (85, Condition::new("Slight snow showers", "🌨️")),
    (86, Condition::new("Heavy snow showers", "❄️")),
    (95, Condition::new("Thunderstorm", "⛈️")),
    (96, Condition::new("Thunderstorm with slight hail", "⛈️")),
    (99, Condition::new("Thunderstorm with heavy hail", "⛈️")),
];

/// Resolve a weather code. Never fails: unknown codes map to [`UNKNOWN`].
pub fn describe(code: i32) -> Condition {
    KNOWN
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, condition)| *condition)
        .unwrap_or(UNKNOWN)
}

/// Every code the catalog knows about, in ascending order.
pub fn known_codes() -> impl Iterator<Item = i32> {
    KNOWN.iter().map(|(code, _)| *code)
}
