//! Driver spawns and manages the telemetry pump task

use futures::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::LinkConfig;
use crate::pump::StreamPump;
use crate::source::ByteSource;
use crate::types::TelemetryRecord;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Fan-out of every decoded record. Subscribers that fall more than the
    /// channel capacity behind lose the oldest records.
    pub records: broadcast::Sender<TelemetryRecord>,
    /// Most recent record
    pub latest: watch::Receiver<Option<TelemetryRecord>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Pump task; resolves to the number of records published
    pub task: JoinHandle<u64>,
}

/// Driver spawns the pump on its own task
///
/// The task owns the source and the framer. Publishing never waits on a
/// subscriber, so a slow consumer cannot stall reads from the link.
pub struct Driver;

impl Driver {
    /// Spawn a pump over `source` using the pump settings and channel
    /// capacity from `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(source: S, config: &LinkConfig) -> DriverChannels
    where
        S: ByteSource,
    {
        let (records_tx, _) = broadcast::channel(config.channel_capacity.clamp(1, LinkConfig::MAX_CHANNEL_CAPACITY));
        let (latest_tx, latest_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let pump = StreamPump::new(source, config.pump.clone());
        let task = tokio::spawn(Self::pump_task(pump, records_tx.clone(), latest_tx, cancel.clone()));

        DriverChannels { records: records_tx, latest: latest_rx, cancel, task }
    }

    async fn pump_task<S>(
        pump: StreamPump<S>,
        records_tx: broadcast::Sender<TelemetryRecord>,
        latest_tx: watch::Sender<Option<TelemetryRecord>>,
        cancel: CancellationToken,
    ) -> u64
    where
        S: ByteSource,
    {
        info!("Pump task started");
        let mut published = 0u64;

        let stream = pump.into_stream(cancel.clone());
        let mut stream = std::pin::pin!(stream);

        while let Some(record) = stream.next().await {
            published += 1;

            // No subscribers is fine; the record still becomes the latest.
            let receivers = records_tx.send(record).unwrap_or(0);
            latest_tx.send_replace(Some(record));
            trace!(published, receivers, "Published record");

            if latest_tx.is_closed() {
                debug!("Latest-record receiver dropped, shutting down");
                cancel.cancel();
                break;
            }
        }

        info!(published, "Pump task ended");
        published
    }
}
