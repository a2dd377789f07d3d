use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Raw caller input for a forecast lookup, before precedence rules are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ForecastParams {
    pub city: Option<String>,
    pub days: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Which temporal slice of the provider data a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Current,
    /// `None` means "use the provider default day count".
    ForecastDays(Option<u32>),
    HistoricalRange { start: NaiveDate, end: NaiveDate },
}

/// A validated query: exactly one mode, and a historical range never runs backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    pub city: String,
    pub mode: QueryMode,
}

pub const DEFAULT_CITY: &str = "London";

impl CityQuery {
    pub fn current(city: Option<&str>) -> Self {
        Self { city: city_or_default(city), mode: QueryMode::Current }
    }

    /// Apply the mode precedence: an explicit date range wins over a day count,
    /// which wins over the provider default.
    pub fn from_params(params: &ForecastParams) -> Result<Self, WeatherError> {
        let city = city_or_default(params.city.as_deref());

        let mode = match (params.start_date, params.end_date) {
            (Some(start), Some(end)) => {
                if end < start {
                    return Err(WeatherError::invalid_range(format!(
                        "end_date {end} precedes start_date {start}"
                    )));
                }
                QueryMode::HistoricalRange { start, end }
            }
            (Some(_), None) => {
                return Err(WeatherError::invalid_range("start_date given without end_date"));
            }
            (None, Some(_)) => {
                return Err(WeatherError::invalid_range("end_date given without start_date"));
            }
            (None, None) => match params.days {
                Some(0) => {
                    return Err(WeatherError::invalid_range("days must be at least 1"));
                }
                days => QueryMode::ForecastDays(days),
            },
        };

        Ok(Self { city, mode })
    }
}

fn city_or_default(city: Option<&str>) -> String {
    match city.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CITY.to_string(),
    }
}

/// One normalized day, identical regardless of whether it came from a forecast
/// or a history lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeatherRecord {
    pub date: NaiveDate,
    pub temperature: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub humidity: f64,
    pub precipitation_chance: f64,
    pub pressure: f64,
    pub condition: String,
    pub condition_icon_url: String,
    pub hourly: Vec<HourlyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyRecord {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub chance_of_rain: f64,
}

/// A single "sensor" reading shown on the dashboard's current-conditions card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherRecord {
    pub sensor_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}
