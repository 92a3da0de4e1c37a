use async_trait::async_trait;

/// Source of the bearer token attached to backend requests.
///
/// Called once per request. Returning `Ok(None)` sends the request
/// unauthenticated; an `Err` aborts the request before anything is sent.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> anyhow::Result<Option<String>>;
}

/// A token fixed at startup, e.g. from `CALLPILOT_API_TOKEN`.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}

/// Synchronous getters, e.g. a closure reading a session cache.
#[async_trait]
impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(self())
    }
}
