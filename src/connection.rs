//! Link connection: a running pump plus its subscriber fan-out

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::driver::Driver;
use crate::source::ByteSource;
use crate::stream::ThrottleExt;
use crate::types::{TelemetryRecord, UpdateRate};
use crate::{LinkError, Result};

/// Connection to a telemetry link
///
/// Owns the pump task. Dropping the connection cancels it; subscriber
/// streams end once the task has stopped.
pub struct LinkConnection {
    /// Record fan-out
    records: broadcast::Sender<TelemetryRecord>,

    /// Latest record
    latest: watch::Receiver<Option<TelemetryRecord>>,

    /// Cancellation token for stopping the pump
    cancel: CancellationToken,

    task: Option<JoinHandle<u64>>,
}

impl LinkConnection {
    /// Validate `config` and start pumping records from `source`.
    ///
    /// Must be called from within a tokio runtime. Validation runs first, so
    /// an invalid config is reported before anything is spawned.
    pub fn open<S>(source: S, config: LinkConfig) -> Result<Self>
    where
        S: ByteSource,
    {
        config.validate()?;

        let channels = Driver::spawn(source, &config);
        info!(capacity = config.channel_capacity, "Link connection opened");

        Ok(Self {
            records: channels.records,
            latest: channels.latest,
            cancel: channels.cancel,
            task: Some(channels.task),
        })
    }

    /// Subscribe to records published from now on.
    ///
    /// `UpdateRate::Max(hz)` delivers at most `hz` records per second, always
    /// the most recent one. A subscriber that falls behind skips the records
    /// it missed rather than slowing the link down.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = TelemetryRecord> + Send + 'static {
        let records = BroadcastStream::new(self.records.subscribe()).filter_map(|result| async move {
            match result {
                Ok(record) => Some(record),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Subscriber lagged, skipping records");
                    None
                }
            }
        });

        match rate.normalize().throttle_interval() {
            None => records.boxed(),
            Some(interval) => records.throttle(interval).boxed(),
        }
    }

    /// Most recent record, if any has arrived.
    pub fn latest(&self) -> Option<TelemetryRecord> {
        *self.latest.borrow()
    }

    /// Wait until a record newer than the last one seen through this
    /// connection arrives. Returns `None` once the pump has stopped.
    pub async fn next_latest(&mut self) -> Option<TelemetryRecord> {
        self.latest.changed().await.ok()?;
        *self.latest.borrow_and_update()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.records.receiver_count()
    }

    /// Whether the pump task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the pump and wait for it to finish. Returns the number of
    /// records it published.
    ///
    /// # Errors
    ///
    /// [`LinkError::Cancelled`] if the pump task was aborted, and
    /// [`LinkError::TaskFailed`] if it panicked.
    pub async fn shutdown(mut self) -> Result<u64> {
        self.cancel.cancel();

        let Some(task) = self.task.take() else {
            return Ok(0);
        };

        match task.await {
            Ok(published) => {
                info!(published, "Link connection shut down");
                Ok(published)
            }
            Err(e) => {
                let err = LinkError::from(e);
                warn!(error = %err, "Pump task failed during shutdown");
                Err(err)
            }
        }
    }
}

impl Drop for LinkConnection {
    fn drop(&mut self) {
        debug!("Dropping link connection");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SimulatedLink;
    use crate::test_utils::{ScriptedSource, sample_lines};
    use std::time::Duration;

    fn config_with_capacity(channel_capacity: usize) -> LinkConfig {
        LinkConfig { channel_capacity, ..LinkConfig::default() }
    }

    #[tokio::test(start_paused = true)]
    async fn native_subscription_sees_every_record() {
        let connection =
            LinkConnection::open(ScriptedSource::from_bytes(&sample_lines(5), 7), LinkConfig::default()).unwrap();
        let stream = connection.subscribe(UpdateRate::Native);

        let records: Vec<_> = stream.take(5).collect().await;
        let altitudes: Vec<f64> = records.iter().map(|r| r.altitude()).collect();
        assert_eq!(altitudes, vec![10_000.5, 10_001.5, 10_002.5, 10_003.5, 10_004.5]);
        assert_eq!(connection.latest().map(|r| r.altitude()), Some(10_004.5));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_subscriber_skips_oldest_without_blocking() {
        let mut connection =
            LinkConnection::open(ScriptedSource::from_bytes(&sample_lines(100), 64), config_with_capacity(4))
                .unwrap();
        let stream = connection.subscribe(UpdateRate::Native);

        // Let the pump publish everything before the subscriber reads anything.
        while connection.next_latest().await.is_some_and(|r| r.altitude() < 10_099.5) {}

        let records: Vec<_> = stream.take(4).collect().await;
        let altitudes: Vec<f64> = records.iter().map(|r| r.altitude()).collect();
        assert_eq!(altitudes, vec![10_096.5, 10_097.5, 10_098.5, 10_099.5]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_subscription_respects_rate() {
        let link = SimulatedLink::new(Duration::from_millis(10), 11);
        let connection = LinkConnection::open(link, LinkConfig::default()).unwrap();
        let mut stream = connection.subscribe(UpdateRate::Max(5));

        stream.next().await.expect("first record");
        let start = tokio::time::Instant::now();
        stream.next().await.expect("second record");
        stream.next().await.expect("third record");

        assert!(start.elapsed() >= Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_subscriptions() {
        let connection =
            LinkConnection::open(ScriptedSource::from_bytes(&sample_lines(2), 64), LinkConfig::default()).unwrap();
        let stream = connection.subscribe(UpdateRate::Native);
        assert_eq!(connection.subscriber_count(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(connection.is_running());
        assert_eq!(connection.shutdown().await.unwrap(), 2);

        let records: Vec<_> = stream.collect().await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pump() {
        let connection = LinkConnection::open(ScriptedSource::new(Vec::new()), LinkConfig::default()).unwrap();
        let stream = connection.subscribe(UpdateRate::Native);
        drop(connection);

        let records = tokio::time::timeout(Duration::from_secs(1), stream.collect::<Vec<_>>()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_fatal() {
        let config = LinkConfig { channel_capacity: 0, ..LinkConfig::default() };
        let result = LinkConnection::open(ScriptedSource::new(Vec::new()), config);
        assert!(matches!(result, Err(LinkError::Config { .. })));

        let config = LinkConfig { channel_capacity: usize::MAX, ..LinkConfig::default() };
        let result = LinkConnection::open(ScriptedSource::new(Vec::new()), config);
        assert!(matches!(result, Err(LinkError::Config { .. })));
    }
}
