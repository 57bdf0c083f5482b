use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Select, Text};
use std::{fmt, path::PathBuf};
use tracing::debug;
use weather_dash_core::{
    Config, Coordinates, Dashboard, FileStore, HistoryStore, ProxyClient,
    geolocation::{FixedLocation, LocationSource},
};

use crate::present;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Terminal weather dashboard")]
pub struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Storage file holding search history (defaults to the platform data dir).
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Backend proxy base URL, overriding the config file.
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for a city.
    Show {
        /// City name.
        city: String,
    },

    /// Show weather for the current location.
    Here {
        /// Latitude in decimal degrees; skips location lookup.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// List recently searched cities.
    History,

    /// Forget all recently searched cities.
    ClearHistory,

    /// Set the proxy URL, default city and location endpoint.
    Configure,

    /// Run the dashboard with a search/history menu.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?.with_env_overrides();
        if let Some(proxy) = &self.proxy {
            config.proxy_url = proxy.clone();
        }

        let command = self.command.unwrap_or(Command::Interactive);

        let storage = match self.storage {
            Some(path) => path,
            None => Config::storage_file_path()?,
        };
        debug!(storage = %storage.display(), proxy = %config.proxy_url, "starting dashboard");

        let history = HistoryStore::new(Box::new(FileStore::open(storage)));
        let client = ProxyClient::new(config.proxy_url.clone());
        let mut dash = Dashboard::new(&config, Box::new(client), history);
        dash.refresh_history();

        match command {
            Command::Show { city } => {
                let shown = dash.submit(&city).await;
                println!("{}", present::render_page(dash.page()));
                if !shown || dash.page().error.is_some() {
                    bail!("weather lookup for '{}' failed", city.trim());
                }
            }
            Command::Here { lat, lon } => {
                let source: Box<dyn LocationSource> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Box::new(FixedLocation(Coordinates::new(lat, lon))),
                    _ => config.location_source(),
                };
                dash.bootstrap(source.as_ref()).await;
                println!("{}", present::render_page(dash.page()));
            }
            Command::History => {
                println!("{}", present::render_history(&dash.page().history));
            }
            Command::ClearHistory => {
                dash.clear_history();
                println!("Search history cleared.");
            }
            Command::Interactive => interactive(&config, &mut dash).await?,
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

enum MenuItem {
    Search,
    History { index: usize, city: String },
    ClearHistory,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::Search => f.write_str("Search for a city"),
            MenuItem::History { city, .. } => write!(f, "↻ {city}"),
            MenuItem::ClearHistory => f.write_str("Clear history"),
            MenuItem::Quit => f.write_str("Quit"),
        }
    }
}

fn menu(dash: &Dashboard) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::Search];
    items.extend(
        dash.page()
            .history
            .iter()
            .enumerate()
            .map(|(index, button)| MenuItem::History {
                index,
                city: button.city.clone(),
            }),
    );
    if !dash.page().history.is_empty() {
        items.push(MenuItem::ClearHistory);
    }
    items.push(MenuItem::Quit);
    items
}

/// `Ok(None)` when the user backs out of the prompt.
fn cancellable<T>(result: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}

async fn interactive(config: &Config, dash: &mut Dashboard) -> anyhow::Result<()> {
    dash.bootstrap(config.location_source().as_ref()).await;
    println!("{}", present::render_page(dash.page()));

    loop {
        let Some(choice) = cancellable(Select::new("What next?", menu(dash)).prompt())? else {
            break;
        };

        match choice {
            MenuItem::Search => {
                let Some(input) = cancellable(Text::new("City:").prompt())? else {
                    continue;
                };
                dash.set_search_input(input.clone());
                if !dash.submit(&input).await {
                    continue;
                }
            }
            MenuItem::History { index, city } => {
                debug!(index, %city, "history entry selected");
                dash.select_history(index).await;
            }
            MenuItem::ClearHistory => dash.clear_history(),
            MenuItem::Quit => break,
        }

        println!("{}", present::render_page(dash.page()));
    }

    Ok(())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let proxy_url = Text::new("Proxy URL:")
        .with_default(&config.proxy_url)
        .prompt()?;

    let default_city = Text::new("Default city:")
        .with_help_message("Shown when location lookup fails and there is no history")
        .with_default(&config.default_city)
        .prompt()?;

    let current_endpoint = config.geolocation.ip_endpoint.clone().unwrap_or_default();
    let endpoint = Text::new("IP geolocation endpoint (empty to disable):")
        .with_default(&current_endpoint)
        .prompt()?;

    config.proxy_url = proxy_url;
    config.default_city = default_city;
    config.geolocation.ip_endpoint = Some(endpoint.trim().to_string()).filter(|e| !e.is_empty());

    config.save()?;
    println!(
        "Configuration saved to {}",
        Config::config_file_path()?.display()
    );

    Ok(())
}
