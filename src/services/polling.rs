use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::stream;
use tokio::time::{sleep_until, Instant};
use tokio_stream::{Stream, StreamExt};

use super::client::BookingClient;
use crate::errors::{BookingError, Result};
use crate::models::BookingStatus;

/// Lazy, finite sequence of status snapshots for one booking.
///
/// Yields every fetched status and ends right after the first terminal one.
/// A fetch error or the deadline passing is yielded once as `Err`, then the
/// stream ends. Dropping it aborts the in-flight request and any pending
/// sleep.
pub type StatusPoller = Pin<Box<dyn Stream<Item = Result<BookingStatus>> + Send>>;

// Roughly 30 years; used when the poll interval overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct PollState {
    client: BookingClient,
    booking_id: String,
    interval: Duration,
    timeout: Duration,
    // Fixed at the first poll of the stream, not at construction. `None`
    // after that means the timeout is too large to represent.
    deadline: Option<Instant>,
    started: bool,
    next_fetch: Option<Instant>,
    finished: bool,
}

impl PollState {
    fn timed_out(&mut self) -> BookingError {
        self.finished = true;
        tracing::warn!(
            booking_id = %self.booking_id,
            timeout = ?self.timeout,
            "booking polling timed out"
        );
        BookingError::Timeout {
            booking_id: self.booking_id.clone(),
            timeout: self.timeout,
        }
    }
}

pub fn status_stream(
    client: BookingClient,
    booking_id: impl Into<String>,
    interval: Duration,
    timeout: Duration,
) -> StatusPoller {
    let state = PollState {
        client,
        booking_id: booking_id.into(),
        interval,
        timeout,
        deadline: None,
        started: false,
        next_fetch: None,
        finished: false,
    };
    Box::pin(stream::unfold(state, next_status))
}

async fn next_status(mut state: PollState) -> Option<(Result<BookingStatus>, PollState)> {
    if state.finished {
        return None;
    }

    if !state.started {
        state.started = true;
        state.deadline = Instant::now().checked_add(state.timeout);
    }
    let deadline = state.deadline;

    if let Some(next) = state.next_fetch {
        match deadline {
            Some(deadline) if next >= deadline => {
                sleep_until(deadline).await;
                let err = state.timed_out();
                return Some((Err(err), state));
            }
            _ => sleep_until(next).await,
        }
    }

    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        let err = state.timed_out();
        return Some((Err(err), state));
    }

    let fetch_started = Instant::now();
    match state.client.get_booking_status(&state.booking_id).await {
        Ok(status) => {
            if status.is_terminal() {
                tracing::info!(
                    booking_id = %state.booking_id,
                    status = %status.status,
                    results = status.results.len(),
                    "booking reached terminal status"
                );
                state.finished = true;
            } else {
                state.next_fetch = Some(
                    fetch_started
                        .checked_add(state.interval)
                        .unwrap_or_else(|| fetch_started + FAR_FUTURE),
                );
            }
            Some((Ok(status), state))
        }
        Err(e) => {
            // No retry: one failed fetch ends the poll.
            tracing::warn!(booking_id = %state.booking_id, error = %e, "booking poll failed");
            state.finished = true;
            Some((Err(e), state))
        }
    }
}

impl BookingClient {
    /// Stream form of [`BookingClient::poll_booking_status`], using the
    /// configured poll interval.
    pub fn poll_status_stream(&self, booking_id: &str, timeout: Duration) -> StatusPoller {
        status_stream(self.clone(), booking_id, self.poll_interval, timeout)
    }

    /// Polls until the booking reaches a terminal status, calling `on_update`
    /// with every fetched status, the terminal one included.
    pub async fn poll_booking_status<F>(
        &self,
        booking_id: &str,
        mut on_update: F,
        timeout: Duration,
    ) -> Result<BookingStatus>
    where
        F: FnMut(&BookingStatus),
    {
        let mut poller = self.poll_status_stream(booking_id, timeout);

        while let Some(item) = poller.next().await {
            let status = item?;
            on_update(&status);
            if status.is_terminal() {
                return Ok(status);
            }
        }

        Err(BookingError::Timeout {
            booking_id: booking_id.to_string(),
            timeout,
        })
    }

    /// Like [`BookingClient::poll_booking_status`], but gives up with
    /// `Cancelled` as soon as `cancel` completes.
    pub async fn poll_booking_status_until<F, C>(
        &self,
        booking_id: &str,
        on_update: F,
        timeout: Duration,
        cancel: C,
    ) -> Result<BookingStatus>
    where
        F: FnMut(&BookingStatus),
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.poll_booking_status(booking_id, on_update, timeout) => result,
            _ = cancel => {
                tracing::info!(booking_id, "booking polling cancelled");
                Err(BookingError::Cancelled {
                    booking_id: booking_id.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn test_zero_timeout_never_fetches() {
        // Nothing listens on port 9; a fetch would surface as a network error.
        let client = BookingClient::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let mut poller = client.poll_status_stream("b-1", Duration::ZERO);

        let first = poller.next().await.unwrap();
        assert!(matches!(first, Err(BookingError::Timeout { .. })));
        assert!(poller.next().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_ends_stream() {
        let client = BookingClient::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let mut poller = client.poll_status_stream("b-1", Duration::from_secs(5));

        let first = poller.next().await.unwrap();
        assert!(matches!(first, Err(BookingError::Network(_))));
        assert!(poller.next().await.is_none());
    }
}
