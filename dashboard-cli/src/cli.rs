use std::net::SocketAddr;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dashboard_core::{Config, ForecastParams, WeatherService};
use serde::Serialize;

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key and default city.
    Configure,

    /// Print current conditions as JSON.
    Current {
        /// City name; defaults to the configured city.
        #[arg(long)]
        city: Option<String>,

        /// Fan the reading out into jittered demo sensors.
        #[arg(long)]
        simulate_sensors: bool,
    },

    /// Print a daily forecast, or history for a date range, as JSON.
    Forecast {
        #[arg(long)]
        city: Option<String>,

        /// Number of days including today.
        #[arg(long)]
        days: Option<u32>,

        /// First day of a historical range (yyyy-mm-dd).
        #[arg(long, requires = "end_date")]
        start_date: Option<NaiveDate>,

        /// Last day of a historical range (yyyy-mm-dd), inclusive.
        #[arg(long, requires = "start_date")]
        end_date: Option<NaiveDate>,
    },

    /// Serve `/api/current` and `/api/forecast` for the browser dashboard.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city, simulate_sensors } => {
                let mut config = load_config()?;
                config.simulate_sensors |= simulate_sensors;

                let service = WeatherService::from_config(&config)?;
                let records = service.get_current(city.as_deref()).await?;
                print_json(&records)
            }
            Command::Forecast { city, days, start_date, end_date } => {
                let service = WeatherService::from_config(&load_config()?)?;
                let params = ForecastParams { city, days, start_date, end_date };

                let records = service.get_forecast(&params).await?;
                print_json(&records)
            }
            Command::Serve { addr } => {
                let service = WeatherService::from_config(&load_config()?)?;
                server::serve(service, addr).await
            }
        }
    }
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env_overrides();
    Ok(config)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let city = inquire::Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()
        .context("Failed to read default city")?;
    if !city.trim().is_empty() {
        config.default_city = city.trim().to_string();
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
