use std::{sync::Arc, time::Duration};

use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    error::WeatherError,
    model::{CityQuery, CurrentWeatherRecord, DailyWeatherRecord, ForecastParams},
    normalize::{normalize_days, parse_current},
    planner::RequestPlanner,
    sensors::SensorMode,
    upstream::{HttpFetcher, JsonFetcher},
};

/// Entry points consumed by the HTTP routing layer.
///
/// Stateless between calls: each invocation plans one request, fetches it once,
/// and normalizes the result. Cheap to clone and share across handlers.
#[derive(Debug, Clone)]
pub struct WeatherService {
    planner: RequestPlanner,
    fetcher: Arc<dyn JsonFetcher>,
    sensors: SensorMode,
    default_city: Option<String>,
}

impl WeatherService {
    pub fn new(planner: RequestPlanner, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { planner, fetcher, sensors: SensorMode::default(), default_city: None }
    }

    pub fn with_sensor_mode(mut self, sensors: SensorMode) -> Self {
        self.sensors = sensors;
        self
    }

    /// City used when a caller names none. Without one, London is used.
    pub fn with_default_city(mut self, city: impl Into<String>) -> Self {
        self.default_city = Some(city.into());
        self
    }

    /// Build the production service over HTTP.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let api_key = config.require_api_key()?;

        let planner = RequestPlanner::new(&config.base_url, api_key)
            .with_default_days(config.default_days)
            .with_max_range_days(config.range_limit());

        let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;

        let sensors = if config.simulate_sensors { SensorMode::simulated() } else { SensorMode::Single };

        Ok(Self::new(planner, Arc::new(fetcher))
            .with_sensor_mode(sensors)
            .with_default_city(&config.default_city))
    }

    pub fn sensor_mode(&self) -> &SensorMode {
        &self.sensors
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_current(&self, city: Option<&str>) -> Result<Vec<CurrentWeatherRecord>, WeatherError> {
        let city = city.filter(|c| !c.trim().is_empty()).or(self.default_city.as_deref());
        let query = CityQuery::current(city);
        let request = self.planner.plan(&query)?;

        let payload = self.fetcher.fetch_json(&request).await?;
        let reading = parse_current(payload).inspect_err(|e| warn!(error = %e, "current payload rejected"))?;

        let records = self.sensors.expand(reading);
        info!(city = %query.city, sensors = records.len(), "current weather served");

        Ok(records)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_forecast(&self, params: &ForecastParams) -> Result<Vec<DailyWeatherRecord>, WeatherError> {
        let mut params = params.clone();
        if params.city.as_deref().is_none_or(|c| c.trim().is_empty()) {
            params.city = self.default_city.clone();
        }

        let query = CityQuery::from_params(&params)?;
        let request = self.planner.plan(&query)?;

        let payload = self.fetcher.fetch_json(&request).await?;
        let records = normalize_days(payload, request.endpoint())
            .inspect_err(|e| warn!(error = %e, "forecast payload rejected"))?;

        info!(city = %query.city, endpoint = %request.endpoint(), days = records.len(), "forecast served");

        Ok(records)
    }
}
