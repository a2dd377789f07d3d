//! Response normalization.
//!
//! WeatherAPI answers forecast and history lookups with differently-keyed envelopes and
//! occasionally leaves out daily aggregates. Everything here funnels those payloads into
//! one [`DailyWeatherRecord`] schema, failing loudly instead of guessing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::{DailyWeatherRecord, HourlyRecord},
    planner::Endpoint,
};

const HOUR_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Per-day entries of a provider response, tagged by the envelope they arrived in.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Forecast(Vec<Value>),
    History(Vec<Value>),
}

impl UpstreamPayload {
    /// Locate `forecast.forecastday` or `history.forecastday`.
    ///
    /// `history.json` itself replies under a `forecast` key, so the envelope
    /// key is checked independently of which endpoint was called.
    pub fn from_value(mut value: Value) -> Result<Self, WeatherError> {
        if let Some(days) = take_day_sequence(&mut value, "forecast")? {
            return Ok(UpstreamPayload::Forecast(days));
        }
        if let Some(days) = take_day_sequence(&mut value, "history")? {
            return Ok(UpstreamPayload::History(days));
        }

        Err(WeatherError::upstream_shape(
            "expected a `forecast.forecastday` or `history.forecastday` sequence",
        ))
    }

    pub fn days(&self) -> &[Value] {
        match self {
            UpstreamPayload::Forecast(days) | UpstreamPayload::History(days) => days,
        }
    }

    fn into_days(self) -> Vec<Value> {
        match self {
            UpstreamPayload::Forecast(days) | UpstreamPayload::History(days) => days,
        }
    }
}

fn take_day_sequence(value: &mut Value, key: &str) -> Result<Option<Vec<Value>>, WeatherError> {
    let Some(envelope) = value.get_mut(key) else {
        return Ok(None);
    };

    match envelope.get_mut("forecastday").map(Value::take) {
        Some(Value::Array(days)) => Ok(Some(days)),
        Some(_) => Err(WeatherError::upstream_shape(format!("`{key}.forecastday` is not a sequence"))),
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    hour: Option<Vec<WaHour>>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    maxtemp_c: f64,
    mintemp_c: f64,
    avghumidity: f64,
    daily_chance_of_rain: f64,
    avgpressure_mb: Option<f64>,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    time: String,
    #[serde(alias = "temp")]
    temp_c: f64,
    wind_kph: f64,
    pressure_mb: f64,
    chance_of_rain: f64,
}

/// Normalize a forecast or history payload into daily records, in upstream order.
///
/// All-or-nothing: the first malformed day fails the whole call. Only forecast and
/// history lookups carry a day sequence; a current-weather payload is rejected.
pub fn normalize_days(payload: Value, endpoint: Endpoint) -> Result<Vec<DailyWeatherRecord>, WeatherError> {
    if endpoint == Endpoint::Current {
        return Err(WeatherError::upstream_shape(
            "current-weather payloads carry no daily sequence",
        ));
    }

    let payload = UpstreamPayload::from_value(payload)?;

    if matches!((&payload, endpoint), (UpstreamPayload::History(_), Endpoint::Forecast)) {
        debug!(%endpoint, "forecast lookup answered with a history envelope");
    }

    payload
        .into_days()
        .into_iter()
        .enumerate()
        .map(|(index, day)| normalize_day(index, day))
        .collect()
}

fn normalize_day(index: usize, raw: Value) -> Result<DailyWeatherRecord, WeatherError> {
    let entry: WaForecastDay = serde_json::from_value(raw)
        .map_err(|e| WeatherError::upstream_shape(format!("day {index}: {e}")))?;

    let hourly = entry
        .hour
        .unwrap_or_default()
        .into_iter()
        .map(|h| normalize_hour(index, h))
        .collect::<Result<Vec<_>, _>>()?;

    let pressure = resolve_pressure(entry.day.avgpressure_mb, &hourly).map_err(|e| {
        warn!(day = index, date = %entry.date, "no pressure data for day");
        match e {
            WeatherError::UpstreamShape(msg) => {
                WeatherError::upstream_shape(format!("day {index} ({}): {msg}", entry.date))
            }
            other => other,
        }
    })?;

    Ok(DailyWeatherRecord {
        date: entry.date,
        temperature: entry.day.avgtemp_c,
        max_temp: entry.day.maxtemp_c,
        min_temp: entry.day.mintemp_c,
        humidity: entry.day.avghumidity,
        precipitation_chance: entry.day.daily_chance_of_rain,
        pressure,
        condition: entry.day.condition.text,
        condition_icon_url: absolute_icon_url(&entry.day.condition.icon),
        hourly,
    })
}

fn normalize_hour(day_index: usize, hour: WaHour) -> Result<HourlyRecord, WeatherError> {
    let time = NaiveDateTime::parse_from_str(&hour.time, HOUR_FORMAT).map_err(|e| {
        WeatherError::upstream_shape(format!("day {day_index}: invalid hour time '{}': {e}", hour.time))
    })?;

    Ok(HourlyRecord {
        time,
        temperature: hour.temp_c,
        wind_speed: hour.wind_kph,
        pressure: hour.pressure_mb,
        chance_of_rain: hour.chance_of_rain,
    })
}

/// Daily pressure: the provider's aggregate when present, otherwise the mean of
/// the hourly readings. An absent aggregate with no hours is an error, never 0 or NaN.
pub fn resolve_pressure(aggregate: Option<f64>, hourly: &[HourlyRecord]) -> Result<f64, WeatherError> {
    if let Some(pressure) = aggregate {
        return Ok(pressure);
    }

    if hourly.is_empty() {
        return Err(WeatherError::upstream_shape(
            "no average pressure and no hourly pressure values",
        ));
    }

    let sum: f64 = hourly.iter().map(|h| h.pressure).sum();
    Ok(sum / hourly.len() as f64)
}

/// WeatherAPI icon links are protocol-relative (`//cdn.weatherapi.com/...`).
fn absolute_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

/// The single reading behind the current-conditions card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: f64,
    pressure_mb: f64,
}

pub fn parse_current(mut payload: Value) -> Result<CurrentReading, WeatherError> {
    let current = payload
        .get_mut("current")
        .map(Value::take)
        .ok_or_else(|| WeatherError::upstream_shape("missing `current` object"))?;

    let parsed: WaCurrent = serde_json::from_value(current)
        .map_err(|e| WeatherError::upstream_shape(format!("current: {e}")))?;

    Ok(CurrentReading {
        temperature: parsed.temp_c,
        humidity: parsed.humidity,
        pressure: parsed.pressure_mb,
    })
}
