//! Event publication

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use devsvc_core::{CollaboratorError, Event, EventSink};

/// Hand an event to the sink without waiting for it
pub(crate) fn publish(sink: &Arc<dyn EventSink>, event: Event) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        if let Err(e) = sink.submit_event(&event).await {
            warn!(device = %event.device, error = %e, "Event submission failed");
        }
    });
}

/// Wraps a sink and retries failed submissions with exponential backoff
pub struct RetryingEventSink<S> {
    inner: S,
    max_retries: u32,
    retry_delay: Duration,
}

impl<S: EventSink> RetryingEventSink<S> {
    /// `max_retries` additional attempts, first retry after `retry_delay`,
    /// doubling each time
    pub fn new(inner: S, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            retry_delay,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: EventSink> EventSink for RetryingEventSink<S> {
    async fn submit_event(&self, event: &Event) -> Result<(), CollaboratorError> {
        let mut delay = self.retry_delay;
        let mut attempt = 0;
        loop {
            match self.inner.submit_event(event).await {
                Ok(()) => return Ok(()),
                Err(CollaboratorError::Rejected(reason)) => {
                    return Err(CollaboratorError::Rejected(reason));
                }
                Err(e) if attempt >= self.max_retries => {
                    warn!(device = %event.device, attempts = attempt + 1, error = %e, "Giving up on event");
                    return Err(e);
                }
                Err(e) => {
                    debug!(device = %event.device, attempt, error = %e, "Retrying event submission");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}
