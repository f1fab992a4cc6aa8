mod encode;
mod line_protocol;

use crate::metrics::{MetricRegistry, NameSelector};
use crate::sender::{InfluxSender, Precision, SenderError};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Periodically snapshots a [`MetricRegistry`] and forwards the encoded
/// batch through one [`InfluxSender`].
///
/// The reporting loop runs on a dedicated thread with its own
/// current-thread runtime so a stalled InfluxDB endpoint never backs up
/// into the host process. A failed report is logged and the loop keeps
/// going; reporting must never take the plugin down.
pub struct InfluxReporter {
    task: ReportTask,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl InfluxReporter {
    pub fn new(
        registry: MetricRegistry,
        sender: InfluxSender,
        prefix: impl Into<String>,
        tags: BTreeMap<String, String>,
        selector: NameSelector,
        precision: Precision,
    ) -> Self {
        Self {
            task: ReportTask {
                registry,
                sender: Arc::new(sender),
                prefix: prefix.into(),
                tags,
                selector,
                precision,
            },
            shutdown: CancellationToken::new(),
            handle: None,
        }
    }

    /// Starts the reporting thread. The first report happens one full
    /// `period` after start. Calling `start` on a running reporter is a
    /// no-op.
    pub fn start(&mut self, period: Duration) {
        if self.handle.is_some() {
            return;
        }

        let task = self.task.clone();
        let shutdown = self.shutdown.clone();
        let spawned = std::thread::Builder::new()
            .name("influx-reporter".to_owned())
            .spawn(move || run_loop(&task, period, &shutdown));

        match spawned {
            Ok(handle) => self.handle = Some(handle),
            Err(error) => warn!("Failed to spawn InfluxDB reporter thread: {error}"),
        }
    }

    /// Stops the reporting thread and waits for it to exit. Safe to
    /// call multiple times and before `start`.
    pub fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("InfluxDB reporter thread panicked");
            }
        }
    }

    /// Runs a single report cycle on the caller's runtime.
    pub async fn report_once(&self) -> Result<(), SenderError> {
        self.task.report().await
    }
}

#[derive(Clone)]
struct ReportTask {
    registry: MetricRegistry,
    sender: Arc<InfluxSender>,
    prefix: String,
    tags: BTreeMap<String, String>,
    selector: NameSelector,
    precision: Precision,
}

impl ReportTask {
    async fn report(&self) -> Result<(), SenderError> {
        let snapshot = self.registry.snapshot(&self.selector);
        if snapshot.is_empty() {
            return Ok(());
        }

        let since_epoch = SystemTime::UNIX_EPOCH.elapsed().unwrap_or_default();
        let timestamp = self.precision.timestamp(since_epoch);
        let batch = encode::encode_batch(&snapshot, &self.prefix, &self.tags, timestamp);
        if batch.is_empty() {
            return Ok(());
        }

        self.sender.write_data(Bytes::from(batch)).await?;
        Ok(())
    }
}

fn run_loop(task: &ReportTask, period: Duration, shutdown: &CancellationToken) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            warn!("Failed to build InfluxDB reporter runtime: {error}");
            return;
        }
    };

    runtime.block_on(async {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(error) = task.report().await {
                        warn!("Failed to report metrics to InfluxDB: {error}");
                    }
                }
            }
        }
    });

    debug!("InfluxDB metric reporter stopped");
}
