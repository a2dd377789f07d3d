//! Core library for the weather dashboard backend.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Request planning for the WeatherAPI.com current/forecast/history endpoints
//! - Normalization of provider payloads into one daily record schema
//! - The `WeatherService` entry points consumed by the HTTP layer
//!
//! It is used by `dashboard-cli`, but can also be embedded in other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod planner;
pub mod sensors;
pub mod service;
pub mod upstream;

pub use config::Config;
pub use error::WeatherError;
pub use model::{CityQuery, CurrentWeatherRecord, DailyWeatherRecord, ForecastParams, HourlyRecord, QueryMode};
pub use planner::{Endpoint, RequestPlanner, UpstreamRequest};
pub use sensors::SensorMode;
pub use service::WeatherService;
pub use upstream::{HttpFetcher, JsonFetcher};
