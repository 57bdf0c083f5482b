//! Core library for the `weather-dash` terminal dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The backend proxy client and its wire/domain models
//! - Persistent search history over a pluggable key-value store
//! - The page view model and the render functions that fill it
//! - Geolocation sources and the startup bootstrap
//! - The `Dashboard` context that ties user actions to all of the above
//!
//! It is used by `weather-dash`, but holds no terminal I/O of its own.

pub mod client;
pub mod config;
pub mod controller;
pub mod geolocation;
pub mod model;
pub mod render;
pub mod store;

pub use client::{FetchError, FetchResult, ProxyClient, WeatherClient};
pub use config::Config;
pub use controller::{Dashboard, FetchTicket};
pub use geolocation::{GeoState, LocationSource};
pub use model::{Condition, Coordinates, CurrentWeather, ForecastEntry, WeatherReport};
pub use render::{IconSet, Page};
pub use store::{FileStore, HistoryStore, KeyValueStore, MemoryStore};
