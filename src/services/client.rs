use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::auth::{StaticToken, TokenProvider};
use crate::config::ClientConfig;
use crate::errors::{BookingError, Result};
use crate::models::{BookingConfirmation, BookingRequest, BookingStatus, HealthStatus};

/// HTTP client for the booking backend.
///
/// Holds only immutable configuration, so it is cheap to clone and share
/// between tasks.
#[derive(Clone)]
pub struct BookingClient {
    base_url: Url,
    client: reqwest::Client,
    token_provider: Option<Arc<dyn TokenProvider>>,
    pub(crate) poll_interval: Duration,
    pub(crate) poll_timeout: Duration,
}

impl BookingClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| BookingError::Config(format!("invalid API URL {:?}: {e}", config.api_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BookingError::Config(format!(
                "API URL {:?} cannot be used as a base",
                config.api_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BookingError::Config(format!("failed to build HTTP client: {e}")))?;

        let token_provider = config
            .api_token
            .clone()
            .map(|t| Arc::new(StaticToken::new(t)) as Arc<dyn TokenProvider>);

        Ok(Self {
            base_url,
            client,
            token_provider,
            poll_interval: config.poll_interval,
            poll_timeout: config.poll_timeout,
        })
    }

    /// Replaces any token configured through `ClientConfig::api_token`.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        let req = self.client.get(self.endpoint(&["health"]));
        self.execute(req, "Health check failed").await
    }

    /// Starts a booking. Validation failures are reported without contacting
    /// the backend.
    pub async fn create_booking_request(&self, request: &BookingRequest) -> Result<BookingStatus> {
        request.validate()?;

        let req = self
            .client
            .post(self.endpoint(&["api", "booking", "request"]))
            .json(request);
        let status: BookingStatus = self
            .send(req, "Failed to create booking request")
            .await?;

        tracing::info!(
            booking_id = %status.booking_id,
            status = %status.status,
            service_type = %request.service_type,
            "created booking request"
        );
        Ok(status)
    }

    pub async fn get_booking_status(&self, booking_id: &str) -> Result<BookingStatus> {
        let req = self.client.get(self.endpoint(&["api", "booking", booking_id]));
        let status: BookingStatus = self.send(req, "Failed to get booking status").await?;

        tracing::debug!(
            booking_id,
            status = %status.status,
            results = status.results.len(),
            "fetched booking status"
        );
        Ok(status)
    }

    /// Commits to one of the ranked results. The provider id is checked by
    /// the backend only.
    pub async fn confirm_booking(
        &self,
        booking_id: &str,
        provider_id: &str,
    ) -> Result<BookingConfirmation> {
        let req = self
            .client
            .post(self.endpoint(&["api", "booking", booking_id, "confirm"]))
            .json(&json!({ "provider_id": provider_id }));
        let confirmation: BookingConfirmation = self
            .send(req, "Failed to confirm booking")
            .await
            .map_err(BookingError::into_confirm_error)?;

        tracing::info!(
            booking_id,
            provider_id,
            calendar_event_id = confirmation.calendar_event_id.as_deref().unwrap_or("-"),
            "booking confirmed"
        );
        Ok(confirmation)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, fallback: &str) -> Result<T> {
        let req = self.authorize(req).await?;
        self.execute(req, fallback).await
    }

    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let Some(provider) = &self.token_provider else {
            return Ok(req);
        };

        let token = provider
            .token()
            .await
            .map_err(|e| BookingError::TokenProvider(format!("{e:#}")))?;

        Ok(match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder, fallback: &str) -> Result<T> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, "booking backend unreachable");
            BookingError::Network(e)
        })?;

        let status = resp.status();
        let url = resp.url().clone();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let err = BookingError::from_response(status, &body, fallback);
            tracing::warn!(%url, %status, error = %err, "booking backend returned error");
            return Err(err);
        }

        serde_json::from_slice(&body).map_err(|e| BookingError::Unknown {
            status,
            message: format!("failed to parse response from {url}: {e}"),
        })
    }
}

impl std::fmt::Debug for BookingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token_provider.is_some())
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}
