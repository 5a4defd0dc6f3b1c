// ── Poller ──
//
// Drives the poll cycle for one controller: build the request, send it
// through the retrying transport, decode, publish. A background task
// repeats the cycle on a fixed interval until `stop()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::ExposeSecret;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vento_proto::codec::response_checksum_matches;
use vento_proto::{RetryingTransport, Transport, UdpTransport, build_request, parse_response};

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::model::{ParameterId, Snapshot};
use crate::store::{ListenerHandle, ListenerRegistry, PollHealth, SnapshotStore};
use crate::stream::SnapshotStream;

// ── State & events ───────────────────────────────────────────────

/// Lifecycle of a [`Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PollState {
    /// No background task.
    Stopped,
    /// Background task waiting for the next tick.
    Idle,
    /// A cycle is in flight.
    Polling,
}

/// Delivered to listeners after every completed cycle.
#[derive(Debug, Clone)]
pub enum PollEvent {
    Updated(Arc<Snapshot>),
    /// The cycle failed; the previous snapshot is still current.
    Failed(CoreError),
}

// ── Poller ───────────────────────────────────────────────────────

/// Periodic poller for one controller.
///
/// Cheaply cloneable via `Arc<PollerInner>`. At most one cycle is in
/// flight at a time: ticks that come due during a slow cycle are delayed,
/// and [`refresh()`](Self::refresh) waits for a running cycle to finish.
pub struct Poller<T: Transport = UdpTransport> {
    inner: Arc<PollerInner<T>>,
}

struct PollerInner<T> {
    config: PollerConfig,
    transport: RetryingTransport<T>,
    store: SnapshotStore,
    listeners: ListenerRegistry,
    state: watch::Sender<PollState>,
    running: AtomicBool,
    /// Serializes cycles.
    cycle_lock: Mutex<()>,
    /// Token for the current run. Cancelled by `stop()` and replaced so
    /// the poller can be started again.
    cancel: Mutex<CancellationToken>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Poller<UdpTransport> {
    /// Create a poller talking UDP to `config.host:config.port`. Does not
    /// touch the network; call [`start()`](Self::start) or
    /// [`refresh()`](Self::refresh).
    pub fn new(config: PollerConfig) -> Self {
        let transport =
            UdpTransport::new(config.host.clone(), config.port).with_timeout(config.timeout);
        Self::with_transport(config, transport)
    }

    /// One-shot: validate, run a single cycle, return the snapshot.
    ///
    /// No background task is spawned; used by the CLI.
    pub async fn oneshot(config: PollerConfig) -> Result<Arc<Snapshot>, CoreError> {
        Self::new(config).read().await
    }
}

impl<T: Transport> Poller<T> {
    pub fn with_transport(config: PollerConfig, transport: T) -> Self {
        let transport = RetryingTransport::new(transport, config.retry_policy());
        let (state, _) = watch::channel(PollState::Stopped);

        Self {
            inner: Arc::new(PollerInner {
                config,
                transport,
                store: SnapshotStore::new(),
                listeners: ListenerRegistry::new(),
                state,
                running: AtomicBool::new(false),
                cycle_lock: Mutex::new(()),
                cancel: Mutex::new(CancellationToken::new()),
                task_handle: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Validate the configuration, run the first cycle, then poll every
    /// `config.interval` in the background.
    ///
    /// A failed first cycle is returned as [`CoreError::NotReady`] and no
    /// background task is started. [`stop()`](Self::stop) during the first
    /// cycle abandons it and `start()` returns [`CoreError::Cancelled`].
    pub async fn start(&self) -> Result<(), CoreError> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::AlreadyRunning);
        }

        // No lock is held across the first cycle; stop() cancels it through
        // this token.
        let cancel = self.inner.cancel.lock().await.clone();
        if let Err(e) = self.first_cycle(&cancel).await {
            // A cancelled start was already reset by stop().
            if !cancel.is_cancelled() {
                self.inner.running.store(false, Ordering::SeqCst);
                self.inner.state.send_replace(PollState::Stopped);
            }
            return Err(e);
        }

        // stop() cancels under this lock, so the check below cannot race it.
        let mut handle = self.inner.task_handle.lock().await;
        if cancel.is_cancelled() || !self.is_running() {
            return Err(CoreError::Cancelled);
        }
        self.inner.state.send_replace(PollState::Idle);
        *handle = Some(tokio::spawn(poll_task(self.clone(), cancel)));

        info!(
            host = %self.inner.config.host,
            port = self.inner.config.port,
            interval = ?self.inner.config.interval,
            "polling started"
        );
        Ok(())
    }

    /// Cancel background polling and wait for the task to exit.
    ///
    /// A cycle in flight is abandoned at its next suspension point; the
    /// snapshot it would have produced is never published.
    pub async fn stop(&self) {
        let handle = {
            let mut handle = self.inner.task_handle.lock().await;
            let mut cancel = self.inner.cancel.lock().await;
            cancel.cancel();
            *cancel = CancellationToken::new();
            self.inner.running.store(false, Ordering::SeqCst);
            handle.take()
        };

        if let Some(handle) = handle {
            let _ = handle.await;
            info!(host = %self.inner.config.host, "polling stopped");
        }
        self.inner.state.send_replace(PollState::Stopped);
    }

    /// Validate and run one cycle without starting background polling.
    pub async fn read(&self) -> Result<Arc<Snapshot>, CoreError> {
        self.preflight().await?;
        self.refresh().await
    }

    /// Run one cycle now, waiting for any cycle already in flight.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let cancel = self.inner.cancel.lock().await.clone();
        self.run_cycle(&cancel).await
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    // ── Observation ──────────────────────────────────────────────

    /// Register a callback invoked after every completed cycle, in
    /// subscription order. Callbacks run on the polling task and must
    /// not block.
    pub fn subscribe<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&PollEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.register(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Subscribe to snapshot changes.
    pub fn watch(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    pub fn state(&self) -> PollState {
        *self.inner.state.borrow()
    }

    pub fn latest_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.latest()
    }

    pub fn health(&self) -> PollHealth {
        self.inner.store.health()
    }

    /// `true` when the last cycle succeeded and returned `id`.
    pub fn is_available(&self, id: ParameterId) -> bool {
        self.inner.store.is_available(id)
    }

    // ── Cycle ────────────────────────────────────────────────────

    async fn first_cycle(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = self.preflight() => result?,
        }
        match self.run_cycle(cancel).await {
            Ok(_) => Ok(()),
            Err(CoreError::Cancelled) => Err(CoreError::Cancelled),
            Err(e) => Err(CoreError::NotReady {
                source: Box::new(e),
            }),
        }
    }

    async fn preflight(&self) -> Result<(), CoreError> {
        self.inner.config.validate()?;
        self.inner.transport.transport().check().await?;
        Ok(())
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<Arc<Snapshot>, CoreError> {
        let _guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::Cancelled),
            guard = self.inner.cycle_lock.lock() => guard,
        };

        self.inner.state.send_replace(PollState::Polling);
        let result = self.poll_once(cancel).await;

        match &result {
            Ok(snapshot) => {
                self.inner.store.publish(Arc::clone(snapshot));
                self.inner.listeners.notify(&PollEvent::Updated(Arc::clone(snapshot)));
            }
            Err(e) if e.is_cycle_failure() => {
                warn!(host = %self.inner.config.host, error = %e, "poll cycle failed");
                self.inner.store.record_failure(e.to_string());
                self.inner.listeners.notify(&PollEvent::Failed(e.clone()));
            }
            Err(e) => debug!(error = %e, "cycle abandoned"),
        }

        let running = self.is_running();
        self.inner.state.send_if_modified(|state| {
            if *state == PollState::Polling {
                *state = if running { PollState::Idle } else { PollState::Stopped };
                true
            } else {
                false
            }
        });

        result
    }

    async fn poll_once(&self, cancel: &CancellationToken) -> Result<Arc<Snapshot>, CoreError> {
        let config = &self.inner.config;
        let frame = build_request(
            &config.device_id,
            config.password.expose_secret(),
            &config.parameters,
        );
        debug!(
            host = %config.host,
            port = config.port,
            params = config.parameters.len(),
            len = frame.len(),
            "sending read request"
        );

        let data = self.inner.transport.send(frame.as_bytes(), cancel).await?;
        if !response_checksum_matches(&data) {
            debug!(len = data.len(), "response checksum mismatch");
        }

        let values = parse_response(&data);
        if values.is_empty() {
            return Err(CoreError::MalformedResponse { len: data.len() });
        }

        debug!(params = values.len(), "snapshot decoded");
        Ok(Arc::new(Snapshot::now(values)))
    }
}

// ── Background task ──────────────────────────────────────────────

async fn poll_task<T: Transport>(poller: Poller<T>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(poller.inner.config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are logged and reported to listeners by the cycle.
                let _ = poller.run_cycle(&cancel).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::model::ParameterValue;
    use crate::testing::{Reply, StubTransport, response};

    fn config() -> PollerConfig {
        PollerConfig::new("127.0.0.1")
    }

    fn power_on() -> Vec<u8> {
        response(&[0x01, 0x01, 0x4A, 0x2C, 0x01])
    }

    fn poller(stub: &StubTransport) -> Poller<StubTransport> {
        Poller::with_transport(config(), stub.clone())
    }

    /// Records every event as a short label.
    fn recorder(
        poller: &Poller<StubTransport>,
        name: &'static str,
    ) -> (ListenerHandle, Arc<StdMutex<Vec<String>>>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let handle = poller.subscribe(move |event| {
            let label = match event {
                PollEvent::Updated(_) => format!("{name}: updated"),
                PollEvent::Failed(e) => format!("{name}: failed ({e})"),
            };
            sink.lock().unwrap().push(label);
        });
        (handle, log)
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_publishes_and_notifies_in_order() {
        let stub = StubTransport::always(power_on());
        let poller = poller(&stub);
        let order = Arc::new(StdMutex::new(Vec::new()));
        let handles: Vec<_> = ["first", "second"]
            .into_iter()
            .map(|name| {
                let order = Arc::clone(&order);
                poller.subscribe(move |_| order.lock().unwrap().push(name))
            })
            .collect();

        let snap = poller.refresh().await.unwrap();

        assert_eq!(snap.get(ParameterId::POWER), Some(&ParameterValue::Number(1)));
        assert_eq!(snap.get(ParameterId::FAN1_SPEED), Some(&ParameterValue::Number(300)));
        assert!(Arc::ptr_eq(&poller.latest_snapshot().unwrap(), &snap));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert!(poller.is_available(ParameterId::POWER));
        assert!(!poller.is_available(ParameterId::HUMIDITY));
        assert_eq!(poller.state(), PollState::Stopped);
        drop(handles);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_keeps_previous_snapshot() {
        let stub = StubTransport::new([Reply::Data(power_on())], Reply::Silent);
        let poller = poller(&stub);
        let (_handle, log) = recorder(&poller, "ui");

        let first = poller.refresh().await.unwrap();
        let err = poller.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::NoResponse { attempts: 3 }));
        assert_eq!(stub.calls(), 4);
        assert!(Arc::ptr_eq(&poller.latest_snapshot().unwrap(), &first));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "ui: updated".to_owned(),
                "ui: failed (Update failed: no response from device after 3 attempt(s))".to_owned(),
            ]
        );

        let health = poller.health();
        assert!(!health.last_update_success);
        assert_eq!(health.successes, 1);
        assert_eq!(health.failures, 1);
        assert!(!poller.is_available(ParameterId::POWER));
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_response_is_malformed() {
        let stub = StubTransport::always(vec![0xFD, 0xFD, 0x02]);
        let poller = poller(&stub);

        let err = poller.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::MalformedResponse { len: 3 }));
        // Data arrived, so the retry layer was satisfied after one attempt.
        assert_eq!(stub.calls(), 1);
        assert!(poller.latest_snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribed_listener_is_not_called() {
        let stub = StubTransport::always(power_on());
        let poller = poller(&stub);
        let (handle, log) = recorder(&poller, "gone");
        handle.unsubscribe();
        assert_eq!(poller.listener_count(), 0);

        poller.refresh().await.unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_do_not_overlap() {
        let stub = StubTransport::new([], Reply::Slow(Duration::from_secs(1), power_on()));
        let poller = poller(&stub);
        let started = Instant::now();

        let (a, b) = tokio::join!(poller.refresh(), poller.refresh());

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(stub.calls(), 2);
        // Overlapping cycles would finish after one second.
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn watch_sees_new_snapshots() {
        let stub = StubTransport::always(power_on());
        let poller = poller(&stub);
        let mut stream = poller.watch();

        let snap = poller.refresh().await.unwrap();
        let seen = stream.changed().await.unwrap();
        assert!(Arc::ptr_eq(&seen, &snap));
    }

    // ── Lifecycle ────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn start_polls_on_interval() {
        let stub = StubTransport::always(power_on());
        let poller = poller(&stub);

        poller.start().await.unwrap();
        assert_eq!(stub.calls(), 1);
        assert_eq!(poller.state(), PollState::Idle);
        assert!(poller.is_running());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(stub.calls(), 3);

        poller.stop().await;
        assert_eq!(poller.state(), PollState::Stopped);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_first_refresh_is_not_ready() {
        let stub = StubTransport::silent();
        let poller = poller(&stub);

        let err = poller.start().await.unwrap_err();

        match err {
            CoreError::NotReady { source } => {
                assert!(matches!(*source, CoreError::NoResponse { attempts: 3 }));
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
        assert!(!poller.is_running());
        assert_eq!(poller.state(), PollState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let stub = StubTransport::always(power_on());
        let poller = poller(&stub);

        poller.start().await.unwrap();
        assert!(matches!(poller.start().await, Err(CoreError::AlreadyRunning)));
        poller.stop().await;

        // A stopped poller can be started again.
        poller.start().await.unwrap();
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_abandons_hanging_cycle() {
        let stub = StubTransport::new([Reply::Data(power_on())], Reply::Hang);
        let poller = poller(&stub);
        let (_handle, log) = recorder(&poller, "ui");

        poller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(poller.state(), PollState::Polling);

        poller.stop().await;

        assert_eq!(poller.state(), PollState::Stopped);
        assert_eq!(stub.calls(), 2);
        // The abandoned cycle is neither a success nor a failure.
        assert_eq!(*log.lock().unwrap(), vec!["ui: updated".to_owned()]);
        assert_eq!(poller.health().failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_first_cycle() {
        let stub = StubTransport::new([], Reply::Hang);
        let poller = poller(&stub);
        let (_handle, log) = recorder(&poller, "ui");

        let starting = tokio::spawn({
            let poller = poller.clone();
            async move { poller.start().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(poller.state(), PollState::Polling);
        assert!(poller.is_running());

        tokio::time::timeout(Duration::from_secs(1), poller.stop())
            .await
            .unwrap();

        let err = starting.await.unwrap().unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
        assert!(!poller.is_running());
        assert_eq!(poller.state(), PollState::Stopped);
        assert!(poller.latest_snapshot().is_none());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_fails_before_network() {
        let stub = StubTransport::always(power_on());
        let mut config = config();
        config.retries = 0;
        let poller = Poller::with_transport(config, stub.clone());

        let err = poller.start().await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidConfig { ref field, .. } if field == "retries"));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn read_validates_then_polls_once() {
        let stub = StubTransport::always(power_on());
        let poller = poller(&stub);

        let snap = poller.read().await.unwrap();

        assert_eq!(snap.len(), 2);
        assert_eq!(stub.calls(), 1);
        assert!(!poller.is_running());
    }

    #[test]
    fn state_display() {
        assert_eq!(PollState::Polling.to_string(), "polling");
    }
}
