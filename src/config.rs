use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(120_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        Self {
            api_url: env::var("CALLPILOT_API_URL")
                .or_else(|_| env::var("NEXT_PUBLIC_API_URL"))
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_token: env::var("CALLPILOT_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            poll_interval: env::var("CALLPILOT_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            poll_timeout: env::var("CALLPILOT_POLL_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_TIMEOUT),
            request_timeout: env::var("CALLPILOT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
