//! Turns a validated [`CityQuery`] into the single upstream request that answers it.

use std::fmt;

use tracing::debug;

use crate::{
    error::WeatherError,
    model::{CityQuery, QueryMode},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// WeatherAPI.com endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
    History,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Current => "current.json",
            Endpoint::Forecast => "forecast.json",
            Endpoint::History => "history.json",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Current => "current",
            Endpoint::Forecast => "forecast",
            Endpoint::History => "history",
        };
        f.write_str(name)
    }
}

/// Fully-built upstream call. Immutable once planned.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    endpoint: Endpoint,
    url: String,
    query: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

// Hand-written so the API key never lands in logs.
impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(k, v)| if k == "key" { (k.as_str(), "***") } else { (k.as_str(), v.as_str()) })
            .collect();

        f.debug_struct("UpstreamRequest")
            .field("endpoint", &self.endpoint)
            .field("url", &self.url)
            .field("query", &query)
            .finish()
    }
}

#[derive(Clone)]
pub struct RequestPlanner {
    base_url: String,
    api_key: String,
    default_days: u32,
    max_range_days: Option<u32>,
}

impl fmt::Debug for RequestPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPlanner")
            .field("base_url", &self.base_url)
            .field("default_days", &self.default_days)
            .field("max_range_days", &self.max_range_days)
            .finish_non_exhaustive()
    }
}

impl RequestPlanner {
    pub const DEFAULT_DAYS: u32 = 3;

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_days: Self::DEFAULT_DAYS,
            max_range_days: None,
        }
    }

    /// Day count used when a query names none. Zero is not corrected here;
    /// planning such a query fails with `InvalidRange`.
    pub fn with_default_days(mut self, days: u32) -> Self {
        self.default_days = days;
        self
    }

    /// Reject historical ranges longer than `max` days (inclusive). `None` disables the check.
    pub fn with_max_range_days(mut self, max: Option<u32>) -> Self {
        self.max_range_days = max;
        self
    }

    pub fn plan(&self, query: &CityQuery) -> Result<UpstreamRequest, WeatherError> {
        let mut params = vec![("q", query.city.clone())];

        let endpoint = match query.mode {
            QueryMode::Current => {
                params.push(("aqi", "no".into()));
                Endpoint::Current
            }
            QueryMode::ForecastDays(days) => {
                let days = days.unwrap_or(self.default_days);
                if days == 0 {
                    return Err(WeatherError::invalid_range("days must be at least 1"));
                }
                params.push(("days", days.to_string()));
                params.push(("aqi", "no".into()));
                params.push(("alerts", "no".into()));
                Endpoint::Forecast
            }
            QueryMode::HistoricalRange { start, end } => {
                if end < start {
                    return Err(WeatherError::invalid_range(format!(
                        "end_date {end} precedes start_date {start}"
                    )));
                }
                let span = (end - start).num_days() + 1;
                if let Some(max) = self.max_range_days.filter(|max| span > i64::from(*max)) {
                    return Err(WeatherError::invalid_range(format!(
                        "range of {span} days exceeds the maximum of {max}"
                    )));
                }
                params.push(("dt", start.format(DATE_FORMAT).to_string()));
                params.push(("end_dt", end.format(DATE_FORMAT).to_string()));
                Endpoint::History
            }
        };

        let mut query_params = vec![("key".to_string(), self.api_key.clone())];
        query_params.extend(params.into_iter().map(|(k, v)| (k.to_string(), v)));

        let request = UpstreamRequest {
            endpoint,
            url: format!("{}/{}", self.base_url, endpoint.path()),
            query: query_params,
        };
        debug!(city = %query.city, %endpoint, ?request, "planned upstream request");

        Ok(request)
    }
}
