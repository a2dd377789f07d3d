use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{error::WeatherError, planner::UpstreamRequest};

/// "Fetch a JSON document" capability the core depends on.
#[async_trait]
pub trait JsonFetcher: Send + Sync + Debug {
    async fn fetch_json(&self, request: &UpstreamRequest) -> Result<Value, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| WeatherError::Transport {
            status: None,
            message: format!("Failed to build HTTP client: {e}"),
        })?;

        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::with_client(Client::new())
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    message: String,
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(endpoint = %request.endpoint()))]
    async fn fetch_json(&self, request: &UpstreamRequest) -> Result<Value, WeatherError> {
        let res = self
            .http
            .get(request.url())
            .query(request.query())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "upstream request could not be sent");
                WeatherError::Transport {
                    status: e.status().map(|s| s.as_u16()),
                    message: format!("Failed to send request to WeatherAPI.com ({}): {e}", request.endpoint()),
                }
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::Transport {
            status: Some(status.as_u16()),
            message: format!("Failed to read WeatherAPI {} response body: {e}", request.endpoint()),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "upstream returned an error status");
            return Err(WeatherError::Transport {
                status: Some(status.as_u16()),
                message: provider_message(&body),
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "upstream response received");

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::upstream_shape(format!(
                "WeatherAPI {} response is not valid JSON: {e}",
                request.endpoint()
            ))
        })
    }
}

/// WeatherAPI wraps failures as `{"error": {"code": .., "message": ..}}`.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<WaErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_message_prefers_error_object() {
        let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        assert_eq!(provider_message(body), "No matching location found.");
    }

    #[test]
    fn provider_message_falls_back_to_raw_body() {
        assert_eq!(provider_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let out = truncate_body(&body);

        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);

        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
