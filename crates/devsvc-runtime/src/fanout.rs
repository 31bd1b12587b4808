//! "All devices" commands

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use devsvc_cache::EntityCaches;
use devsvc_core::{Direction, Event, ServiceError, ServiceResult};

use crate::dispatcher::{CommandDispatcher, CommandOutcome};

/// Runs one command on every operational device with bounded concurrency
#[derive(Clone)]
pub struct FanoutExecutor {
    caches: Arc<EntityCaches>,
    dispatcher: CommandDispatcher,
    permits: Arc<Semaphore>,
}

impl FanoutExecutor {
    pub(crate) fn new(
        caches: Arc<EntityCaches>,
        dispatcher: CommandDispatcher,
        max_concurrent_devices: usize,
    ) -> Self {
        Self {
            caches,
            dispatcher,
            permits: Arc::new(Semaphore::new(max_concurrent_devices.max(1))),
        }
    }

    /// Run `command` on every device that is neither locked nor disabled.
    ///
    /// Succeeds if at least one device succeeded, returning the events of
    /// successful reads in completion order. Fails with the last observed
    /// error only when every device failed.
    pub async fn run(
        &self,
        command: &str,
        direction: Direction,
        body: &str,
    ) -> ServiceResult<Vec<Event>> {
        let devices = self.caches.devices.operational();
        let count = devices.len();
        debug!(command, %direction, devices = count, "Executing command on all operational devices");
        if count == 0 {
            return Ok(Vec::new());
        }

        let (tx, mut rx) = mpsc::channel::<ServiceResult<Option<CommandOutcome>>>(count);
        let tasks = devices.into_iter().map(|device| {
            let dispatcher = self.dispatcher.clone();
            let permits = Arc::clone(&self.permits);
            let tx = tx.clone();
            let command = command.to_string();
            let body = body.to_string();
            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => dispatcher.execute(&device, &command, direction, &body).await,
                    Err(_) => Err(ServiceError::ServerError("fan-out limiter closed".into())),
                };
                // capacity equals task count, so this never waits
                let _ = tx.send(result).await;
            })
        });
        let joined = join_all(tasks).await;
        drop(tx);

        let mut failed = 0;
        let mut last_error = None;
        for join in joined {
            if let Err(e) = join {
                failed += 1;
                error!(error = %e, "Device task aborted");
                last_error = Some(ServiceError::ServerError(e.to_string()));
            }
        }

        let mut events = Vec::with_capacity(count);
        while let Some(result) = rx.recv().await {
            match result {
                Ok(Some(outcome)) => {
                    if let Some(failure) = &outcome.failure {
                        warn!(device = %outcome.event.device, error = %failure, "Partial read");
                    }
                    events.push(outcome.event);
                }
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "CommandAll");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failed >= count => Err(e),
            _ => {
                if failed > 0 {
                    info!(failed, total = count, "Part of commands executed successfully");
                }
                Ok(events)
            }
        }
    }
}
