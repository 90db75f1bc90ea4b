//! Terminal front end for the dashboard view state.

use std::fmt::{self, Write as _};

use anyhow::{Context, anyhow};
use dashboard_core::{
    AppState, City, CityCard, Config, Event, View, ViewController, WeatherSnapshot, catalog,
    provider_from_config, render,
};
use inquire::{Select, Text};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Open(String),
    Search,
    Refresh,
    Back,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Open(name) => write!(f, "{name}"),
            Action::Search => f.write_str("Search for a city..."),
            Action::Refresh => f.write_str("Refresh"),
            Action::Back => f.write_str("Back"),
            Action::Quit => f.write_str("Quit"),
        }
    }
}

fn actions_for(view: &View<'_>) -> Vec<Action> {
    match view {
        View::Landing { cards, .. } => cards
            .iter()
            .map(|card| Action::Open(card.city().name.clone()))
            .chain([Action::Search, Action::Refresh, Action::Quit])
            .collect(),
        View::Details { .. } => vec![Action::Back, Action::Search, Action::Quit],
    }
}

pub async fn run_interactive(config: &Config) -> anyhow::Result<()> {
    let controller = ViewController::new(provider_from_config(config))
        .with_notification_ttl(config.dashboard.notification_ttl());
    let mut state = AppState::new(config.dashboard.featured_cities.clone());

    println!("Loading weather for {} cities...", state.cities().len());
    state = controller.handle(state, Event::LoadLanding).await;

    loop {
        state = controller.handle(state, Event::Tick(Instant::now())).await;
        let view = render(&state, Instant::now());
        println!("{}", format_view(&view));

        let choice = Select::new("What next?", actions_for(&view))
            .prompt()
            .context("Failed to read selection")?;

        let event = match choice {
            Action::Open(name) => Event::SelectCity(name),
            Action::Search => {
                let query = Text::new("City:")
                    .prompt()
                    .context("Failed to read city name")?;
                Event::Search(query)
            }
            Action::Refresh => Event::LoadLanding,
            Action::Back => Event::Back,
            Action::Quit => break,
        };

        state = controller.handle(state, event).await;
    }

    Ok(())
}

/// Search for `place` and print its details, or fail with the notification text.
pub async fn show(config: &Config, place: &str) -> anyhow::Result<()> {
    let controller = ViewController::new(provider_from_config(config));
    let state = AppState::new(config.dashboard.featured_cities.clone());

    let state = controller.handle(state, Event::Search(place.to_string())).await;

    match render(&state, Instant::now()) {
        view @ View::Details { .. } => {
            println!("{}", format_view(&view));
            Ok(())
        }
        view => {
            let message = view.notification().unwrap_or("Could not fetch weather.");
            Err(anyhow!("{message}"))
        }
    }
}

fn format_view(view: &View<'_>) -> String {
    let mut out = match view {
        View::Landing { cards, .. } => format_landing(cards),
        View::Details { city, snapshot, .. } => format_details(city, snapshot),
    };

    if let Some(message) = view.notification() {
        let _ = write!(out, "\n  ! {message}\n");
    }

    out
}

fn format_landing(cards: &[CityCard<'_>]) -> String {
    let mut out = String::from("\n  Featured cities\n\n");

    for card in cards {
        let _ = match card {
            CityCard::Ready { city, snapshot } => {
                let flag = snapshot.alert.as_ref().map_or("", |_| "  [alert]");
                writeln!(
                    out,
                    "  {:<18} {:>5}  {} {}{flag}",
                    city.name,
                    format_temp(snapshot.temperature_c),
                    snapshot.condition_icon,
                    snapshot.condition_description
                )
            }
            CityCard::Placeholder { city } => {
                writeln!(out, "  {:<18} {:>5}  no data", city.name, "--")
            }
        };
    }

    out
}

fn format_details(city: &City, snapshot: &WeatherSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n  {}", city.label());
    let _ = writeln!(
        out,
        "  {}  {} {}",
        format_temp(snapshot.temperature_c),
        snapshot.condition_icon,
        snapshot.condition_description
    );
    let _ = writeln!(
        out,
        "  Humidity {}%   Wind {} km/h",
        snapshot.humidity_pct.round() as i64,
        snapshot.wind_speed_kmh.round() as i64
    );
    let _ = writeln!(
        out,
        "  Sunrise {}   Sunset {}",
        clock_time(&snapshot.sunrise),
        clock_time(&snapshot.sunset)
    );

    if let Some(alert) = &snapshot.alert {
        let _ = writeln!(out, "  ! {alert}");
    }

    let _ = writeln!(out, "\n  {}-day forecast", snapshot.daily_forecast.len());
    for day in &snapshot.daily_forecast {
        let condition = catalog::describe(day.condition_code);
        let _ = writeln!(
            out,
            "  {}  {:>5} / {:<5} {} {}",
            day.date.format("%a %d %b"),
            format_temp(day.max_temp_c),
            format_temp(day.min_temp_c),
            condition.icon,
            condition.description
        );
    }

    out
}

fn format_temp(celsius: f64) -> String {
    // as i64 so -0.1 doesn't show up as -0
    format!("{}°C", celsius.round() as i64)
}

/// "2024-06-01T05:07" -> "05:07". Anything else is shown unchanged.
fn clock_time(iso: &str) -> &str {
    iso.split_once('T').map_or(iso, |(_, time)| time)
}
