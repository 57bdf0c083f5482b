//! Plain-text drawing of the dashboard page.

use std::fmt::Write;

use weather_dash_core::render::{CurrentPanel, ForecastCard, HistoryButton, Page};

const RULE: &str = "────────────────────────────────────────";

pub fn render_page(page: &Page) -> String {
    let mut out = String::new();

    if let Some(message) = &page.error {
        let _ = writeln!(out, "! {message}");
    }
    if page.loading {
        out.push_str("Loading...\n");
    }

    if let Some(current) = &page.current {
        out.push_str(&render_current(current));
    }

    if !page.forecast.is_empty() {
        let _ = writeln!(out, "{RULE}\n5-Day Forecast");
        out.push_str(&render_forecast(&page.forecast));
    }

    let _ = writeln!(out, "{RULE}");
    out.push_str(&render_history(&page.history));
    out
}

fn render_current(current: &CurrentPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{} ({})", current.city, current.date);
    let _ = writeln!(out, "  Temperature: {}°C", current.temperature);
    let _ = writeln!(out, "  Humidity:    {}%", current.humidity);
    let _ = writeln!(out, "  Wind:        {} km/h", current.wind_kmh);
    let _ = writeln!(out, "  Conditions:  {} ({})", current.conditions, current.icon.alt);
    let _ = writeln!(out, "  Icon:        {}", current.icon.src);
    out
}

fn render_forecast(cards: &[ForecastCard]) -> String {
    let mut out = String::new();
    for card in cards {
        let _ = writeln!(
            out,
            "  {:<4} {:>5}  {}",
            card.day, card.temperature, card.conditions
        );
    }
    out
}

pub fn render_history(buttons: &[HistoryButton]) -> String {
    if buttons.is_empty() {
        return "No search history yet.\n".to_string();
    }

    let mut out = String::from("Recent searches:\n");
    for (i, button) in buttons.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, button.label);
    }
    out
}
