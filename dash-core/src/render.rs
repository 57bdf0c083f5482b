//! View model for the dashboard and the functions that fill it.
//!
//! [`Page`] holds everything the presenter draws: the current-weather panel,
//! the forecast row, the history list, the error banner and the loader. The
//! render functions only ever write into a page; they keep nothing between
//! calls.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::model::{CurrentWeather, ForecastEntry};

/// Forecast entries per day at 3-hour granularity.
pub const FORECAST_STRIDE: usize = 8;

/// How icon codes map to image URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
    pub base_url: String,
    pub extension: String,
}

impl IconSet {
    pub fn new(base_url: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            extension: extension.into(),
        }
    }

    pub fn url(&self, code: &str) -> String {
        format!("{}/{}@2x.{}", self.base_url, code, self.extension)
    }
}

impl Default for IconSet {
    fn default() -> Self {
        Self::new("https://openweathermap.org/img/wn", "png")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Icon {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentPanel {
    pub city: String,
    pub date: String,
    pub temperature: i64,
    pub humidity: u8,
    pub wind_kmh: i64,
    pub conditions: String,
    pub icon: Icon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastCard {
    pub day: String,
    pub icon: Icon,
    pub temperature: String,
    pub conditions: String,
}

/// One clickable history entry. `city` is the value the click handler reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryButton {
    pub label: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub search_input: String,
    pub current: Option<CurrentPanel>,
    pub forecast: Vec<ForecastCard>,
    pub history: Vec<HistoryButton>,
    pub error: Option<String>,
    pub loading: bool,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_current_weather<Tz: TimeZone>(
        &mut self,
        record: &CurrentWeather,
        now: &DateTime<Tz>,
        icons: &IconSet,
    ) where
        Tz::Offset: std::fmt::Display,
    {
        self.current = Some(CurrentPanel {
            city: record.city.clone(),
            date: long_date(now),
            temperature: round(record.temperature_c),
            humidity: record.humidity_pct,
            wind_kmh: mps_to_kmh(record.wind_speed_mps),
            conditions: record.condition.label.clone(),
            icon: Icon {
                src: icons.url(&record.condition.icon),
                alt: record.condition.description.clone(),
            },
        });
    }

    /// Replaces the forecast row with one card per day, taking every
    /// [`FORECAST_STRIDE`]th entry from the start of the list.
    pub fn render_forecast(&mut self, entries: &[ForecastEntry], icons: &IconSet) {
        self.forecast = entries
            .iter()
            .step_by(FORECAST_STRIDE)
            .map(|entry| ForecastCard {
                day: short_weekday(entry),
                icon: Icon {
                    src: icons.url(&entry.condition.icon),
                    alt: entry.condition.description.clone(),
                },
                temperature: format!("{}°", round(entry.temperature_c)),
                conditions: entry.condition.label.clone(),
            })
            .collect();
    }

    pub fn clear_forecast(&mut self) {
        self.forecast.clear();
    }

    pub fn render_history(&mut self, entries: &[String]) {
        self.history = entries
            .iter()
            .map(|city| HistoryButton {
                label: city.clone(),
                city: city.clone(),
            })
            .collect();
    }

    pub fn render_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

// Halves go toward +inf, so -2.5 shows as -2.
fn round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn mps_to_kmh(speed: f64) -> i64 {
    round(speed * 3.6)
}

/// e.g. `Friday, October 16, 2026`
fn long_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%A, %B %-d, %Y").to_string()
}

fn short_weekday(entry: &ForecastEntry) -> String {
    if let Ok(dt) = NaiveDateTime::parse_from_str(&entry.label, "%Y-%m-%d %H:%M:%S") {
        return dt.format("%a").to_string();
    }

    match entry.time {
        Some(time) => time.with_timezone(&Local).format("%a").to_string(),
        None => entry.label.clone(),
    }
}
