//! HTTP routes consumed by the browser dashboard.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use dashboard_core::{CurrentWeatherRecord, DailyWeatherRecord, ForecastParams, WeatherError, WeatherService};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: WeatherService,
}

/// Create the router with all dashboard routes.
pub fn create_router(service: WeatherService) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/current", get(current))
        .route("/api/forecast", get(forecast))
        .with_state(AppState { service })
}

pub async fn serve(service: WeatherService, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "dashboard API listening");
    axum::serve(listener, create_router(service)).await.context("HTTP server failed")
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            WeatherError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            WeatherError::UpstreamShape(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WeatherError::Transport { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.0.kind(), error = %self.0, "request failed");
        }

        let body = ErrorResponse { error: self.0.to_string(), code: self.0.kind().to_string() };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), version: env!("CARGO_PKG_VERSION").to_string() })
}

#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
    pub city: Option<String>,
}

async fn current(
    State(state): State<AppState>,
    Query(query): Query<CurrentQuery>,
) -> Result<Json<Vec<CurrentWeatherRecord>>, ApiError> {
    let records = state.service.get_current(query.city.as_deref()).await?;
    Ok(Json(records))
}

/// Raw query string; kept as text so malformed values become `invalid_range`
/// errors instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub city: Option<String>,
    pub days: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ForecastQuery {
    pub fn into_params(self) -> Result<ForecastParams, WeatherError> {
        let days = match non_empty(self.days) {
            Some(d) => Some(
                d.parse::<u32>()
                    .map_err(|_| WeatherError::invalid_range(format!("days must be a positive integer, got '{d}'")))?,
            ),
            None => None,
        };

        Ok(ForecastParams {
            city: non_empty(self.city),
            days,
            start_date: parse_date("start_date", non_empty(self.start_date))?,
            end_date: parse_date("end_date", non_empty(self.end_date))?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, WeatherError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|_| WeatherError::invalid_range(format!("{field} must be yyyy-mm-dd, got '{v}'")))
        })
        .transpose()
}

async fn forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Vec<DailyWeatherRecord>>, ApiError> {
    let params = query.into_params()?;
    let records = state.service.get_forecast(&params).await?;
    Ok(Json(records))
}
