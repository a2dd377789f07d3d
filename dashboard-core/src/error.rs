use thiserror::Error;

/// Failures surfaced by the dashboard core.
///
/// Each variant is raised close to its source and passed to the caller unchanged:
/// the planner raises `InvalidRange`, the normalizer raises `UpstreamShape`,
/// and the fetch capability raises `Transport`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// Caller-supplied date range or day count is malformed.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Upstream payload did not match any recognized shape.
    #[error("Invalid data structure: {0}")]
    UpstreamShape(String),

    /// The request to the weather provider failed.
    #[error("Upstream request failed{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },
}

impl WeatherError {
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        WeatherError::InvalidRange(msg.into())
    }

    pub fn upstream_shape(msg: impl Into<String>) -> Self {
        WeatherError::UpstreamShape(msg.into())
    }

    /// Machine-readable error kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::InvalidRange(_) => "invalid_range",
            WeatherError::UpstreamShape(_) => "upstream_shape",
            WeatherError::Transport { .. } => "transport",
        }
    }

    /// True when the caller is at fault and should not retry with the same input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, WeatherError::InvalidRange(_))
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            WeatherError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}
