use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::client::Thermostat;
use crate::error::ResultExt;
use crate::transport::HttpClient;
use crate::types::{ApiInfo, QueryInfo};
use crate::{Error, Result};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CAPACITY: usize = 1;
/// Shortest accepted poll interval; anything below is raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// One device's state as captured on a single tick.
#[derive(Debug, Clone)]
pub struct Results {
    pub timestamp: DateTime<Utc>,
    pub host: String,
    pub api_info: ApiInfo,
    pub query_info: QueryInfo,
}

/// A failed fetch, tagged with the device it came from.
#[derive(Debug)]
pub struct DeviceError {
    pub host: String,
    pub error: Error,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.host, self.error)
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct MonitorBuilder<C = reqwest::Client> {
    devices: Vec<Thermostat<C>>,
    interval: Duration,
    capacity: usize,
}

impl<C: HttpClient + 'static> MonitorBuilder<C> {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            interval: DEFAULT_INTERVAL,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn device(mut self, thermostat: Thermostat<C>) -> Self {
        self.devices.push(thermostat);
        self
    }

    pub fn devices(mut self, thermostats: impl IntoIterator<Item = Thermostat<C>>) -> Self {
        self.devices.extend(thermostats);
        self
    }

    /// Time between polls. The first poll happens one interval after start.
    /// Values below [`MIN_INTERVAL`] are raised to it.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Slots in each output queue. The poller waits when a queue is full.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Monitor<C> {
        Monitor {
            devices: self.devices,
            interval: self.interval,
            capacity: self.capacity,
        }
    }
}

impl<C: HttpClient + 'static> Default for MonitorBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls a fixed set of thermostats on an interval.
///
/// Devices are fetched one after another, in the order they were added.
/// Every device gets its own result or error per tick; a failing device
/// never stops the rest of the tick.
pub struct Monitor<C = reqwest::Client> {
    devices: Vec<Thermostat<C>>,
    interval: Duration,
    capacity: usize,
}

impl Monitor {
    /// Monitor `hosts` with default client and polling settings.
    pub fn new<I>(hosts: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let devices = hosts
            .into_iter()
            .map(Thermostat::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(MonitorBuilder::new().devices(devices).build())
    }
}

impl<C: HttpClient + 'static> Monitor<C> {
    pub fn builder() -> MonitorBuilder<C> {
        MonitorBuilder::new()
    }

    pub fn devices(&self) -> &[Thermostat<C>] {
        &self.devices
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch identity and live state from one device.
    pub async fn device_results(device: &Thermostat<C>) -> Result<Results> {
        let timestamp = Utc::now();
        let api_info = device.api_info().await.context(|| "loading api info")?;
        let query_info = device.query_info().await.context(|| "loading query info")?;
        Ok(Results {
            timestamp,
            host: device.host().to_string(),
            api_info,
            query_info,
        })
    }

    /// Spawn the polling task on the current tokio runtime.
    ///
    /// Both receivers end once the task stops, either through
    /// [`StopHandle::stop`], by dropping the handle, or because a receiver
    /// was dropped.
    pub fn start(self) -> (mpsc::Receiver<Results>, mpsc::Receiver<DeviceError>, StopHandle) {
        let (results_tx, results_rx) = mpsc::channel(self.capacity);
        let (errors_tx, errors_rx) = mpsc::channel(self.capacity);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(results_tx, errors_tx, stop_rx));
        let handle = StopHandle {
            stop: stop_tx,
            task,
        };
        (results_rx, errors_rx, handle)
    }

    async fn run(
        self,
        results: mpsc::Sender<Results>,
        errors: mpsc::Sender<DeviceError>,
        mut stop: oneshot::Receiver<()>,
    ) {
        debug!(devices = self.devices.len(), interval = ?self.interval, "monitor started");
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    if !self.poll_once(&results, &errors).await {
                        debug!("monitor output closed");
                        break;
                    }
                }
            }
        }
        debug!("monitor stopped");
    }

    /// Poll every device once. Returns false when a consumer has gone away.
    async fn poll_once(
        &self,
        results: &mpsc::Sender<Results>,
        errors: &mpsc::Sender<DeviceError>,
    ) -> bool {
        for device in &self.devices {
            let sent = match Self::device_results(device).await {
                Ok(r) => results.send(r).await.is_ok(),
                Err(error) => {
                    warn!(host = device.host(), "poll failed: {error}");
                    let err = DeviceError {
                        host: device.host().to_string(),
                        error,
                    };
                    errors.send(err).await.is_ok()
                }
            };
            if !sent {
                return false;
            }
        }
        true
    }
}

/// Stops a running [`Monitor`]. Dropping it stops the monitor as well.
pub struct StopHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl StopHandle {
    /// Signal the monitor to stop. A tick already under way finishes and
    /// publishes what it fetched, so keep draining both receivers until they
    /// end, then await the returned handle.
    pub fn stop(self) -> JoinHandle<()> {
        let _ = self.stop.send(());
        self.task
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
