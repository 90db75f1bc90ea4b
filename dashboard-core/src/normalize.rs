//! Turns a raw Open-Meteo forecast body into a [`WeatherSnapshot`].

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    alert::AlertSource,
    catalog,
    error::NormalizationError,
    model::{DailyForecast, WeatherSnapshot},
};

pub const DEFAULT_FORECAST_DAYS: usize = 7;

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: i32,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    weather_code: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
}

impl OmDaily {
    /// Number of days for which every parallel array has a value.
    fn complete_days(&self) -> usize {
        [
            self.time.len(),
            self.weather_code.len(),
            self.temperature_2m_max.len(),
            self.temperature_2m_min.len(),
            self.sunrise.len(),
            self.sunset.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }
}

/// Pure mapping from provider JSON to the canonical snapshot. The only input
/// besides the body is the injected alert source.
#[derive(Debug, Clone)]
pub struct WeatherNormalizer {
    forecast_days: usize,
    alerts: Arc<dyn AlertSource>,
}

impl WeatherNormalizer {
    /// `forecast_days` is raised to 1 if zero: today's sunrise and sunset
    /// come from the first daily entry.
    pub fn new(forecast_days: usize, alerts: Arc<dyn AlertSource>) -> Self {
        Self {
            forecast_days: forecast_days.max(1),
            alerts,
        }
    }

    pub fn forecast_days(&self) -> usize {
        self.forecast_days
    }

    pub fn normalize(
        &self,
        city: &str,
        raw: &Value,
    ) -> Result<WeatherSnapshot, NormalizationError> {
        if let Some(reason) = provider_reason(raw) {
            return Err(NormalizationError::Provider(reason));
        }

        let current = section(raw, "current")?;
        let daily = section(raw, "daily")?;

        let current = OmCurrent::deserialize(current)
            .map_err(|e| NormalizationError::Malformed(format!("current: {e}")))?;
        let daily = OmDaily::deserialize(daily)
            .map_err(|e| NormalizationError::Malformed(format!("daily: {e}")))?;

        let found = daily.complete_days();
        if found < self.forecast_days {
            return Err(NormalizationError::IncompleteSeries {
                expected: self.forecast_days,
                found,
            });
        }

        let daily_forecast = (0..self.forecast_days)
            .map(|i| {
                Ok(DailyForecast {
                    date: parse_date(&daily.time[i], i)?,
                    max_temp_c: daily.temperature_2m_max[i],
                    min_temp_c: daily.temperature_2m_min[i],
                    condition_code: daily.weather_code[i],
                })
            })
            .collect::<Result<Vec<_>, NormalizationError>>()?;

        let condition = catalog::describe(current.weather_code);

        Ok(WeatherSnapshot {
            city: city.to_string(),
            temperature_c: current.temperature_2m,
            humidity_pct: current.relative_humidity_2m,
            wind_speed_kmh: current.wind_speed_10m,
            condition_description: condition.description.to_string(),
            condition_icon: condition.icon.to_string(),
            sunrise: daily.sunrise[0].clone(),
            sunset: daily.sunset[0].clone(),
            daily_forecast,
            alert: self.alerts.draw(city),
        })
    }
}

/// The `reason` an Open-Meteo error body carries, if any.
pub(crate) fn provider_reason(raw: &Value) -> Option<String> {
    let reason = raw.get("reason")?;
    Some(match reason.as_str() {
        Some(text) => text.to_string(),
        None => reason.to_string(),
    })
}

fn section<'a>(raw: &'a Value, name: &'static str) -> Result<&'a Value, NormalizationError> {
    raw.get(name).ok_or(NormalizationError::MissingSection(name))
}

fn parse_date(raw: &str, index: usize) -> Result<NaiveDate, NormalizationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        NormalizationError::Malformed(format!("daily.time[{index}] = {raw:?}: {e}"))
    })
}
