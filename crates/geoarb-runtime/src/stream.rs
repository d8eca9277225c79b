//! Arbitration stream - the public entry point
//!
//! A single processing task owns both source states, the lifecycle manager
//! and the observer list. Everything reaches it as a [`Command`] on one
//! unbounded queue: sensor updates, subscriptions, timers. Observers therefore
//! see emissions in exactly the order the underlying updates were queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use geoarb_arbiter::{Arbiter, BootstrapResolver, SourcePair};
use geoarb_core::{
    ArbitrationResult, GeoArbError, GeoArbResult, LocationFix, PositionSample, Provenance,
    SourceId,
};
use geoarb_time::{Clock, MonotonicClock};

use crate::{
    ActivationGate, EmissionPolicy, GateTransition, LocationService, SensorLifecycleManager,
    StreamConfig, UpdateSink,
};

/// Observer identity, unique per stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub updates_received: u64,
    /// Updates that arrived for an inactive or superseded activation
    pub updates_ignored: u64,
    pub emissions: u64,
    /// Selections suppressed because the winning sample was already emitted
    pub duplicates_suppressed: u64,
    pub activations: u64,
    pub deactivations: u64,
}

/// Messages handled by the processing task
#[derive(Debug)]
pub(crate) enum Command {
    Subscribe {
        id: ObserverId,
        observer: mpsc::UnboundedSender<ArbitrationResult>,
    },
    Unsubscribe(ObserverId),
    Update {
        source: SourceId,
        activation: u64,
        fix: LocationFix,
    },
    StopDelayElapsed {
        generation: u64,
    },
    Latest(oneshot::Sender<Option<ArbitrationResult>>),
    Stats(oneshot::Sender<StreamStats>),
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to a running arbitration stream
///
/// Cheap to clone; every clone talks to the same processing task. One stream
/// per process is enough, observers compose freely on top of it.
#[derive(Clone)]
pub struct ArbitrationStream {
    commands: mpsc::UnboundedSender<Command>,
    next_observer: Arc<AtomicU64>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ArbitrationStream {
    /// Spawn a stream on the current tokio runtime using the OS monotonic clock
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(service: Arc<dyn LocationService>, config: StreamConfig) -> GeoArbResult<Self> {
        Self::spawn_with_clock(service, Arc::new(MonotonicClock::new()), config)
    }

    /// Spawn a stream reading arrival times from `clock`
    pub fn spawn_with_clock(
        service: Arc<dyn LocationService>,
        clock: Arc<dyn Clock>,
        config: StreamConfig,
    ) -> GeoArbResult<Self> {
        config.validate()?;

        let (commands, queue) = mpsc::unbounded_channel();
        let processor = Processor::new(service, clock, config, commands.downgrade());
        let task = tokio::spawn(processor.run(queue));

        Ok(ArbitrationStream {
            commands,
            next_observer: Arc::new(AtomicU64::new(1)),
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Register a new observer
    ///
    /// The first observer activates the sensors and receives the bootstrap
    /// sample first. Later observers first receive the latest emitted result.
    pub fn subscribe(&self) -> GeoArbResult<Subscription> {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        let (observer, results) = mpsc::unbounded_channel();

        self.send(Command::Subscribe { id, observer })?;

        Ok(Subscription {
            id,
            results,
            commands: self.commands.clone(),
        })
    }

    /// Most recent emitted result, if any
    pub async fn latest(&self) -> GeoArbResult<Option<ArbitrationResult>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Latest(tx))?;
        rx.await.map_err(|_| GeoArbError::StreamClosed)
    }

    pub async fn stats(&self) -> GeoArbResult<StreamStats> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stats(tx))?;
        rx.await.map_err(|_| GeoArbError::StreamClosed)
    }

    /// Resolves once every command queued before it has been processed
    pub async fn barrier(&self) -> GeoArbResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Barrier(tx))?;
        rx.await.map_err(|_| GeoArbError::StreamClosed)
    }

    /// Stop the sensors, close every subscription and end the processing task
    pub async fn shutdown(&self) -> GeoArbResult<()> {
        self.send(Command::Shutdown)?;

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Arbitration task terminated abnormally");
            }
        }
        Ok(())
    }

    /// True until the processing task has ended
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: Command) -> GeoArbResult<()> {
        self.commands
            .send(command)
            .map_err(|_| GeoArbError::StreamClosed)
    }
}

/// One observer's ordered view of the stream
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    id: ObserverId,
    results: mpsc::UnboundedReceiver<ArbitrationResult>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Next result, `None` once the stream has shut down
    pub async fn recv(&mut self) -> Option<ArbitrationResult> {
        self.results.recv().await
    }

    /// Next already-delivered result without waiting
    pub fn try_recv(&mut self) -> Option<ArbitrationResult> {
        self.results.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Unsubscribe(self.id));
    }
}

/// State owned by the processing task
struct Processor {
    service: Arc<dyn LocationService>,
    clock: Arc<dyn Clock>,
    config: StreamConfig,
    arbiter: Arbiter,
    sources: SourcePair,
    lifecycle: SensorLifecycleManager,
    gate: ActivationGate,
    observers: Vec<(ObserverId, mpsc::UnboundedSender<ArbitrationResult>)>,
    last_emitted: Option<ArbitrationResult>,
    /// Generation of the stop timer currently armed
    pending_stop: Option<u64>,
    stop_generation: u64,
    /// Weak so that the task can end once every handle and sink is gone
    commands: mpsc::WeakUnboundedSender<Command>,
    stats: StreamStats,
}

impl Processor {
    fn new(
        service: Arc<dyn LocationService>,
        clock: Arc<dyn Clock>,
        config: StreamConfig,
        commands: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        Processor {
            service,
            clock,
            arbiter: Arbiter::new(config.recency_window),
            config,
            sources: SourcePair::new(),
            lifecycle: SensorLifecycleManager::new(),
            gate: ActivationGate::new(),
            observers: Vec::new(),
            last_emitted: None,
            pending_stop: None,
            stop_generation: 0,
            commands,
            stats: StreamStats::default(),
        }
    }

    async fn run(mut self, mut queue: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = queue.recv().await {
            match command {
                Command::Subscribe { id, observer } => self.on_subscribe(id, observer),
                Command::Unsubscribe(id) => self.on_unsubscribe(id),
                Command::Update {
                    source,
                    activation,
                    fix,
                } => self.on_update(source, activation, fix),
                Command::StopDelayElapsed { generation } => self.on_stop_delay_elapsed(generation),
                Command::Latest(reply) => {
                    let _ = reply.send(self.last_emitted);
                }
                Command::Stats(reply) => {
                    let _ = reply.send(self.stats.clone());
                }
                Command::Barrier(reply) => {
                    let _ = reply.send(());
                }
                Command::Shutdown => break,
            }
        }

        self.deactivate();
        self.observers.clear();
        tracing::debug!("Arbitration stream stopped");
    }

    fn on_subscribe(&mut self, id: ObserverId, observer: mpsc::UnboundedSender<ArbitrationResult>) {
        self.observers.push((id, observer.clone()));

        if self.gate.acquire() == GateTransition::Opened && self.pending_stop.take().is_some() {
            tracing::debug!("Observer returned during stop delay, keeping listeners running");
        }

        if self.lifecycle.is_active() {
            if let Some(latest) = self.last_emitted {
                let _ = observer.send(latest);
            }
        } else {
            self.activate();
        }
    }

    fn on_unsubscribe(&mut self, id: ObserverId) {
        let Some(index) = self.observers.iter().position(|(observer, _)| *observer == id) else {
            return;
        };
        self.observers.remove(index);

        if self.gate.release() != GateTransition::Closed {
            return;
        }

        if self.config.stop_delay.is_zero() {
            self.deactivate();
        } else {
            self.arm_stop_timer();
        }
    }

    fn on_update(&mut self, source: SourceId, activation: u64, fix: LocationFix) {
        self.stats.updates_received += 1;

        if !self.lifecycle.is_active() || activation != self.lifecycle.activation() {
            self.stats.updates_ignored += 1;
            tracing::trace!(source = %source, activation, "Ignoring update from inactive listener");
            return;
        }

        let now = self.clock.now();
        self.sources
            .get_mut(source)
            .update(PositionSample::live(source, &fix), now);

        let Some(winner) = self
            .arbiter
            .select_pair(&self.sources, now)
            .and_then(|selection| selection.sample().copied())
        else {
            return;
        };

        if self.config.emission == EmissionPolicy::DistinctSample
            && self.last_emitted.map(|last| last.as_of) == Some(winner.id())
        {
            self.stats.duplicates_suppressed += 1;
            return;
        }

        if let Provenance::Live(winner_source) = winner.provenance() {
            let age_ms = self
                .sources
                .get(winner_source)
                .age(now)
                .map(|age| age.as_millis() as u64)
                .unwrap_or_default();
            tracing::trace!(
                source = %source,
                winner = %winner_source,
                age_ms,
                lat = winner.latitude(),
                lon = winner.longitude(),
                "Selected position"
            );
        }
        self.emit(ArbitrationResult::new(winner));
    }

    fn on_stop_delay_elapsed(&mut self, generation: u64) {
        if self.pending_stop != Some(generation) || self.gate.is_open() {
            return;
        }
        self.pending_stop = None;
        self.deactivate();
    }

    /// Emit the bootstrap sample, then start the sensors
    fn activate(&mut self) {
        let Some(commands) = self.commands.upgrade() else {
            tracing::debug!("Arbitration stream is shutting down, not starting listeners");
            return;
        };

        let initial = BootstrapResolver::new()
            .resolve_with(|source| self.service.last_known_location(source));
        self.emit(ArbitrationResult::new(initial));

        self.lifecycle
            .activate(self.service.as_ref(), |source, activation| {
                UpdateSink::new(source, activation, commands.clone())
            });
        self.stats.activations += 1;
    }

    fn deactivate(&mut self) {
        self.pending_stop = None;
        if self.lifecycle.deactivate(self.service.as_ref()) {
            self.stats.deactivations += 1;
        }
    }

    fn arm_stop_timer(&mut self) {
        let Some(commands) = self.commands.upgrade() else {
            self.deactivate();
            return;
        };

        self.stop_generation += 1;
        let generation = self.stop_generation;
        self.pending_stop = Some(generation);

        let delay = self.config.stop_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = commands.send(Command::StopDelayElapsed { generation });
        });
    }

    fn emit(&mut self, result: ArbitrationResult) {
        self.last_emitted = Some(result);
        self.stats.emissions += 1;
        for (_, observer) in &self.observers {
            let _ = observer.send(result);
        }
    }
}
