use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::{
    geolocation::{FixedLocation, IpLocation, LocationSource, NoLocation},
    model::Coordinates,
    render::IconSet,
};

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
pub const DEFAULT_ICON_EXT: &str = "png";

/// How the dashboard finds the user's position on startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// IP geolocation endpoint returning JSON with `lat`/`lon`.
    pub ip_endpoint: Option<String>,

    /// Fixed coordinates; take precedence over `ip_endpoint`.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// proxy_url = "http://localhost:3000/api"
/// default_city = "London"
///
/// [geolocation]
/// ip_endpoint = "http://ip-api.com/json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy_url: String,
    /// City shown when location lookup fails and there is no history yet.
    pub default_city: String,
    pub icon_base_url: String,
    pub icon_ext: String,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            icon_ext: DEFAULT_ICON_EXT.to_string(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// `WEATHER_DASH_PROXY_URL` and `WEATHER_DASH_DEFAULT_CITY` win over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_var("WEATHER_DASH_PROXY_URL") {
            self.proxy_url = url;
        }
        if let Some(city) = non_empty_var("WEATHER_DASH_DEFAULT_CITY") {
            self.default_city = city;
        }
        self
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-dash", "weather-dash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the key-value storage file holding search history.
    pub fn storage_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("storage.json"))
    }

    pub fn icon_set(&self) -> IconSet {
        IconSet::new(&self.icon_base_url, &self.icon_ext)
    }

    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        match (self.geolocation.latitude, self.geolocation.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    /// Picks fixed coordinates, then the IP endpoint, else reports no support.
    pub fn location_source(&self) -> Box<dyn LocationSource> {
        if let Some(coords) = self.fixed_coordinates() {
            return Box::new(FixedLocation(coords));
        }

        match &self.geolocation.ip_endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                Box::new(IpLocation::new(endpoint.clone()))
            }
            _ => Box::new(NoLocation),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.default_city, "London");
        assert_eq!(cfg.proxy_url, DEFAULT_PROXY_URL);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            proxy_url = "http://proxy.internal:8080/api"

            [geolocation]
            ip_endpoint = "http://ip-api.com/json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.proxy_url, "http://proxy.internal:8080/api");
        assert_eq!(cfg.icon_ext, "png");
        assert_eq!(
            cfg.geolocation.ip_endpoint.as_deref(),
            Some("http://ip-api.com/json")
        );
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml("proxy_url = [").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.default_city = "Berlin".to_string();
        cfg.geolocation.latitude = Some(1.5);
        cfg.geolocation.longitude = Some(-2.5);

        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn icon_set_uses_configured_extension() {
        let mut cfg = Config::default();
        cfg.icon_ext = "webp".to_string();

        assert_eq!(
            cfg.icon_set().url("01d"),
            "https://openweathermap.org/img/wn/01d@2x.webp"
        );
    }

    #[test]
    fn fixed_coordinates_need_both_halves() {
        let mut cfg = Config::default();
        cfg.geolocation.latitude = Some(10.0);
        assert_eq!(cfg.fixed_coordinates(), None);

        cfg.geolocation.longitude = Some(20.0);
        assert_eq!(cfg.fixed_coordinates(), Some(Coordinates::new(10.0, 20.0)));
    }

    #[test]
    fn location_source_defaults_to_unsupported() {
        let cfg = Config::default();
        assert!(!cfg.location_source().is_supported());

        let mut cfg = Config::default();
        cfg.geolocation.ip_endpoint = Some("http://ip-api.com/json".to_string());
        assert!(cfg.location_source().is_supported());
    }
}
