use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition as reported by the provider behind the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Primary label, e.g. "Clouds".
    pub label: String,
    /// Longer description, e.g. "broken clouds".
    pub description: String,
    /// Provider icon code, e.g. "04d".
    pub icon: String,
}

impl Condition {
    fn unknown() -> Self {
        Self {
            label: "Unknown".to_string(),
            description: "Unknown".to_string(),
            icon: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Provider timestamp label, `YYYY-MM-DD HH:MM:SS`.
    pub label: String,
    pub time: Option<DateTime<Utc>>,
    pub temperature_c: f64,
    pub condition: Condition,
}

/// Successful proxy answer: current conditions plus the 3-hourly forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastEntry>,
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

// Proxy wire shapes. The proxy forwards the provider's JSON mostly untouched.

#[derive(Debug, Deserialize)]
pub(crate) struct ProxyPayload {
    #[serde(rename = "currentWeather")]
    current_weather: WireCurrent,
    forecast: WireForecast,
}

#[derive(Debug, Deserialize)]
struct WireCondition {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WireMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct WireForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WireWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct WireCurrent {
    name: String,
    main: WireMain,
    wind: WireWind,
    #[serde(default)]
    weather: Vec<WireCondition>,
}

#[derive(Debug, Deserialize)]
struct WireForecastEntry {
    dt: Option<i64>,
    #[serde(default)]
    dt_txt: String,
    main: WireForecastMain,
    #[serde(default)]
    weather: Vec<WireCondition>,
}

#[derive(Debug, Deserialize)]
struct WireForecast {
    #[serde(default)]
    list: Vec<WireForecastEntry>,
}

/// Error body returned by the proxy on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ProxyErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ProxyErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

fn first_condition(weather: Vec<WireCondition>) -> Condition {
    weather
        .into_iter()
        .next()
        .map(|w| Condition {
            label: w.main,
            description: w.description,
            icon: w.icon,
        })
        .unwrap_or_else(Condition::unknown)
}

impl From<ProxyPayload> for WeatherReport {
    fn from(payload: ProxyPayload) -> Self {
        let cw = payload.current_weather;

        let current = CurrentWeather {
            city: cw.name,
            temperature_c: cw.main.temp,
            humidity_pct: cw.main.humidity,
            wind_speed_mps: cw.wind.speed,
            condition: first_condition(cw.weather),
        };

        let forecast = payload
            .forecast
            .list
            .into_iter()
            .map(|e| ForecastEntry {
                label: e.dt_txt,
                time: e.dt.and_then(|ts| DateTime::from_timestamp(ts, 0)),
                temperature_c: e.main.temp,
                condition: first_condition(e.weather),
            })
            .collect();

        Self { current, forecast }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_converts_into_report() {
        let json = serde_json::json!({
            "currentWeather": {
                "name": "Paris",
                "main": { "temp": 15.6, "humidity": 72 },
                "wind": { "speed": 5.0 },
                "weather": [{ "main": "Rain", "description": "light rain", "icon": "10d" }]
            },
            "forecast": {
                "list": [{
                    "dt": 1_700_000_000,
                    "dt_txt": "2023-11-14 21:00:00",
                    "main": { "temp": 9.2, "humidity": 80 },
                    "weather": [{ "main": "Clouds", "description": "overcast clouds", "icon": "04n" }]
                }]
            }
        });

        let payload: ProxyPayload = serde_json::from_value(json).unwrap();
        let report = WeatherReport::from(payload);

        assert_eq!(report.current.city, "Paris");
        assert_eq!(report.current.humidity_pct, 72);
        assert_eq!(report.current.condition.icon, "10d");
        assert_eq!(report.forecast.len(), 1);
        assert_eq!(report.forecast[0].label, "2023-11-14 21:00:00");
        assert_eq!(report.forecast[0].condition.label, "Clouds");
        assert!(report.forecast[0].time.is_some());
    }

    #[test]
    fn missing_weather_array_yields_unknown_condition() {
        let json = serde_json::json!({
            "currentWeather": {
                "name": "Oslo",
                "main": { "temp": -3.0, "humidity": 90 },
                "wind": { "speed": 1.2 }
            },
            "forecast": { "list": [] }
        });

        let payload: ProxyPayload = serde_json::from_value(json).unwrap();
        let report = WeatherReport::from(payload);

        assert_eq!(report.current.condition.label, "Unknown");
        assert!(report.current.condition.icon.is_empty());
        assert!(report.forecast.is_empty());
    }

    #[test]
    fn current_weather_without_humidity_is_rejected() {
        let json = serde_json::json!({
            "currentWeather": {
                "name": "Oslo",
                "main": { "temp": -3.0 },
                "wind": { "speed": 1.2 }
            },
            "forecast": {
                "list": [{ "dt_txt": "2023-11-14 21:00:00", "main": { "temp": 1.0 } }]
            }
        });

        assert!(serde_json::from_value::<ProxyPayload>(json).is_err());
    }

    #[test]
    fn forecast_entries_do_not_need_humidity() {
        let json = serde_json::json!({
            "currentWeather": {
                "name": "Oslo",
                "main": { "temp": -3.0, "humidity": 90 },
                "wind": { "speed": 1.2 }
            },
            "forecast": {
                "list": [{ "dt_txt": "2023-11-14 21:00:00", "main": { "temp": 1.0 } }]
            }
        });

        let report = WeatherReport::from(serde_json::from_value::<ProxyPayload>(json).unwrap());
        assert_eq!(report.forecast.len(), 1);
    }

    #[test]
    fn error_body_prefers_message_over_error() {
        let body: ProxyErrorBody =
            serde_json::from_str(r#"{"message":"bad coords","error":"Bad Request"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad coords"));

        let body: ProxyErrorBody = serde_json::from_str(r#"{"error":"city not found"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("city not found"));

        let body: ProxyErrorBody = serde_json::from_str(r#"{"error":"  "}"#).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
