//! Sources for the snapshot's severe-weather alert.
//!
//! No real alert feed is wired in yet. [`RandomAlerts`] stands in for one.

use std::fmt::Debug;

use rand::Rng;

pub const DEFAULT_ALERT_PROBABILITY: f64 = 0.2;

pub trait AlertSource: Send + Sync + Debug {
    /// Alert text for `city`, if one is active.
    fn draw(&self, city: &str) -> Option<String>;
}

/// Raises an alert with a fixed probability, independent of the weather.
#[derive(Debug, Clone, Copy)]
pub struct RandomAlerts {
    probability: f64,
}

impl RandomAlerts {
    /// `probability` is clamped to `0.0..=1.0`; NaN disables alerts.
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for RandomAlerts {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_PROBABILITY)
    }
}

impl AlertSource for RandomAlerts {
    fn draw(&self, city: &str) -> Option<String> {
        rand::thread_rng()
            .gen_bool(self.probability)
            .then(|| severe_weather_message(city))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlerts;

impl AlertSource for NoAlerts {
    fn draw(&self, _city: &str) -> Option<String> {
        None
    }
}

/// Always returns the same alert. Handy for tests and demos.
#[derive(Debug, Clone)]
pub struct FixedAlert(pub String);

impl AlertSource for FixedAlert {
    fn draw(&self, _city: &str) -> Option<String> {
        Some(self.0.clone())
    }
}

pub fn severe_weather_message(city: &str) -> String {
    format!("Severe weather warning in effect for {city}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_bounds_are_deterministic() {
        let never = RandomAlerts::new(0.0);
        let always = RandomAlerts::new(1.0);

        for _ in 0..100 {
            assert_eq!(never.draw("Oslo"), None);
            assert_eq!(
                always.draw("Oslo").as_deref(),
                Some("Severe weather warning in effect for Oslo.")
            );
        }
    }

    #[test]
    fn out_of_range_probability_is_clamped() {
        assert_eq!(RandomAlerts::new(7.5).probability(), 1.0);
        assert_eq!(RandomAlerts::new(-1.0).probability(), 0.0);
        assert_eq!(RandomAlerts::new(f64::NAN).probability(), 0.0);
        assert_eq!(RandomAlerts::default().probability(), 0.2);
    }

    #[test]
    fn fixed_and_none_sources() {
        assert_eq!(NoAlerts.draw("Lima"), None);

        let fixed = FixedAlert("Flooding".into());
        assert_eq!(fixed.draw("Lima").as_deref(), Some("Flooding"));
    }
}
