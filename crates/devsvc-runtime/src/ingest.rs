//! Consumer loop for driver-pushed values

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use devsvc_cache::EntityCaches;
use devsvc_core::{AsyncValues, Direction, Event, EventSink};

use crate::pipeline::ValuePipeline;
use crate::sink::publish;

/// Turns [`AsyncValues`] batches into events until stopped
pub struct AsyncIngestor {
    caches: Arc<EntityCaches>,
    pipeline: ValuePipeline,
    sink: Arc<dyn EventSink>,
    rx: mpsc::Receiver<AsyncValues>,
    stop: watch::Receiver<bool>,
}

impl AsyncIngestor {
    pub(crate) fn new(
        caches: Arc<EntityCaches>,
        pipeline: ValuePipeline,
        sink: Arc<dyn EventSink>,
        rx: mpsc::Receiver<AsyncValues>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            caches,
            pipeline,
            sink,
            rx,
            stop,
        }
    }

    /// Process batches until the stop flag is raised or every sender is gone.
    ///
    /// The flag is only checked between batches.
    pub async fn run(mut self) {
        info!("Async ingestor started");
        loop {
            if *self.stop.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = self.stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                batch = self.rx.recv() => match batch {
                    Some(batch) => self.process(batch),
                    None => {
                        debug!("Async channel closed");
                        break;
                    }
                },
            }
        }
        info!("Async ingestor stopped");
    }

    fn process(&self, batch: AsyncValues) {
        let device = self
            .caches
            .devices
            .for_name(&batch.device_name)
            .or_else(|| self.caches.devices.for_addressable(&batch.device_name));
        let Some(device) = device else {
            error!(device = %batch.device_name, "Received values for unknown device");
            return;
        };

        let mut readings = Vec::with_capacity(batch.command_values.len());
        for cv in batch.command_values {
            let Some(object) = self.caches.profiles.device_object(&device.profile, &cv.ro) else {
                warn!(device = %device.name, object = %cv.ro, "Device resource not found");
                continue;
            };
            let fallback = match cv.operation {
                Some(_) => None,
                None => self
                    .caches
                    .profiles
                    .resource_operation(&device.profile, &cv.ro, Direction::Get)
                    .ok(),
            };

            let processed = self.pipeline.process(&device, &object, fallback.as_ref(), cv);
            for failure in &processed.failures {
                warn!(device = %device.name, failure = %failure, "Async value processed with failure");
            }
            readings.push(processed.reading);
        }

        publish(&self.sink, Event::new(device.name, readings));
    }
}
