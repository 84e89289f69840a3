//! Fixed-cadence display refresh.
//!
//! A [`PeriodicDisplayController`] owns one timer task. Every tick it samples
//! its [`TimeSource`] and hands the sample to the `on_tick` callback given to
//! [`PeriodicDisplayController::start`], then to any subscribers registered
//! with [`PeriodicDisplayController::subscribe`].
//!
//! Ticks are anchored to the start instant: tick `n` is due at
//! `start + n * interval`. A late tick does not push back the ones after it,
//! and ticks missed entirely are skipped rather than replayed.
//!
//! ```text
//! Idle --start--> Running --stop / handle drop / runtime shutdown--> Stopped
//! ```

use super::{
    sample::ClockSample,
    source::{SystemTimeSource, TimeSource},
    subscriber::Subscriber,
};
use chrono::{DateTime, Utc};
use log::*;
use parking_lot::Mutex;
use std::{
    cell::Cell,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use thiserror::Error;
use tokio::{
    runtime,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Controller whose subscribers are running on this thread, if any.
    static DELIVERING: Cell<Option<u64>> = const { Cell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Stopped,
}

impl ControllerState {
    fn as_u8(self) -> u8 {
        match self {
            ControllerState::Idle => 0,
            ControllerState::Running => 1,
            ControllerState::Stopped => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ControllerState::Idle,
            1 => ControllerState::Running,
            _ => ControllerState::Stopped,
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "idle",
            ControllerState::Running => "running",
            ControllerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    /// `start` on a controller that already left `Idle`.
    #[error("controller is {0}, expected idle")]
    InvalidState(ControllerState),

    /// Zero tick interval.
    #[error("tick interval must be greater than zero")]
    InvalidArgument,

    /// `start` called outside a tokio runtime.
    #[error("no tokio runtime is available to drive the timer")]
    NoRuntime,
}

/// State shared between the controller, its handle and the timer task.
struct Shared {
    id: u64,
    state: AtomicU8,
    /// Held for the whole of each delivery; `stop` takes it to wait out an in-flight tick.
    delivery: Mutex<()>,
    task: Mutex<Option<JoinHandle<()>>>,
    released: AtomicBool,
    subscribers: Mutex<Vec<Weak<dyn Subscriber>>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            id: NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed),
            state: AtomicU8::new(ControllerState::Idle.as_u8()),
            delivery: Mutex::new(()),
            task: Mutex::new(None),
            released: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn state(&self) -> ControllerState {
        ControllerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Delivers one sample. Returns false once the controller is no longer running.
    fn deliver(&self, sample: ClockSample, on_tick: &dyn Subscriber) -> bool {
        let _gate = self.delivery.lock();
        if self.state() != ControllerState::Running {
            return false;
        }
        let _scope = DeliveryScope::enter(self.id);
        on_tick.on_tick(sample);
        for subscriber in self.live_subscribers() {
            // Any of them may have stopped the controller from inside this tick.
            if self.state() != ControllerState::Running {
                return false;
            }
            subscriber.on_tick(sample);
        }
        self.state() == ControllerState::Running
    }

    fn live_subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        let mut subscribers = self.subscribers.lock();
        let mut live = Vec::with_capacity(subscribers.len());
        subscribers.retain(|weak| match weak.upgrade() {
            Some(subscriber) => {
                live.push(subscriber);
                true
            }
            None => false,
        });
        live
    }

    fn stop(&self) {
        let previous = ControllerState::from_u8(
            self.state
                .swap(ControllerState::Stopped.as_u8(), Ordering::AcqRel),
        );
        if previous == ControllerState::Stopped {
            return;
        }
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        // Wait out a delivery running on another thread. A stop issued from
        // inside this controller's own delivery must not wait on itself.
        if !DeliveryScope::is_delivering(self.id) {
            drop(self.delivery.lock());
        }
        debug!("Controller {} stopped (was {previous})", self.id);
    }

    fn release(&self) {
        self.state
            .store(ControllerState::Stopped.as_u8(), Ordering::Release);
        if !self.released.swap(true, Ordering::AcqRel) {
            debug!("Controller {}: timer released", self.id);
        }
    }
}

/// Marks the current thread as delivering for one controller.
struct DeliveryScope {
    previous: Option<u64>,
}

impl DeliveryScope {
    fn enter(id: u64) -> Self {
        let previous = DELIVERING.with(|current| current.replace(Some(id)));
        Self { previous }
    }

    fn is_delivering(id: u64) -> bool {
        DELIVERING.with(|current| current.get() == Some(id))
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERING.with(|current| current.set(self.previous));
    }
}

/// Owned by the timer task; its drop is the single point where the timer is
/// released, whether the task ended, was aborted or its runtime shut down.
struct TimerGuard(Arc<Shared>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Drives a display surface from a periodic wall-clock sample.
pub struct PeriodicDisplayController<S: TimeSource = SystemTimeSource> {
    shared: Arc<Shared>,
    source: Mutex<Option<S>>,
}

impl PeriodicDisplayController<SystemTimeSource> {
    /// Controller sampling the host wall clock.
    pub fn with_system_clock() -> Self {
        Self::new(SystemTimeSource)
    }
}

impl Default for PeriodicDisplayController<SystemTimeSource> {
    fn default() -> Self {
        Self::with_system_clock()
    }
}

impl<S: TimeSource> PeriodicDisplayController<S> {
    pub fn new(source: S) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            source: Mutex::new(Some(source)),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.shared.state()
    }

    /// Registers an additional subscriber. The controller keeps only a weak
    /// reference; once the caller drops its `Arc` the subscriber is skipped.
    pub fn subscribe(&self, subscriber: &Arc<dyn Subscriber>) {
        self.shared
            .subscribers
            .lock()
            .push(Arc::downgrade(subscriber));
    }

    /// Starts ticking every `interval` on the current tokio runtime.
    ///
    /// The first tick is due one full `interval` after this call. Dropping
    /// the returned [`Handle`] stops the controller.
    pub fn start<F>(&self, interval: Duration, on_tick: F) -> Result<Handle, ControllerError>
    where
        F: Subscriber + 'static,
    {
        if interval.is_zero() {
            return Err(ControllerError::InvalidArgument);
        }
        let runtime = runtime::Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;
        self.shared
            .state
            .compare_exchange(
                ControllerState::Idle.as_u8(),
                ControllerState::Running.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|current| {
                let current = ControllerState::from_u8(current);
                warn!("Controller {}: ignoring start while {current}", self.shared.id);
                ControllerError::InvalidState(current)
            })?;
        let mut source = self
            .source
            .lock()
            .take()
            .ok_or(ControllerError::InvalidState(ControllerState::Stopped))?;

        let started = Instant::now();
        let started_at = source.now();
        let task = runtime.spawn(run_timer(
            TimerGuard(Arc::clone(&self.shared)),
            source,
            started,
            started_at,
            interval,
            on_tick,
        ));
        *self.shared.task.lock() = Some(task);
        // A stop racing with start may have missed the task handle.
        if self.shared.state() == ControllerState::Stopped {
            if let Some(task) = self.shared.task.lock().take() {
                task.abort();
            }
        }
        debug!(
            "Controller {} started with a {interval:?} interval",
            self.shared.id
        );

        Ok(Handle {
            shared: Arc::clone(&self.shared),
            started_at,
        })
    }
}

/// Timer task body. The guard is an argument so that it is dropped with the
/// future even if the task is cancelled before its first poll.
async fn run_timer<S: TimeSource, F: Subscriber>(
    guard: TimerGuard,
    mut source: S,
    started: Instant,
    started_at: DateTime<Utc>,
    interval: Duration,
    on_tick: F,
) {
    let shared = &guard.0;
    let mut ticker = time::interval_at(started + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut sequence = 0;
    let mut last = started_at;
    loop {
        ticker.tick().await;
        sequence += 1;
        // Wall clocks can step backwards; delivered samples never do.
        let timestamp = source.now().max(last);
        last = timestamp;
        if !shared.deliver(ClockSample::new(sequence, timestamp), &on_tick) {
            break;
        }
    }
}

/// Cancellation capability for a started controller.
///
/// Dropping the handle has the same effect as calling [`Handle::stop`].
pub struct Handle {
    shared: Arc<Shared>,
    started_at: DateTime<Utc>,
}

impl Handle {
    /// Stops the controller. Once this returns no subscriber observes another
    /// tick. Repeated calls do nothing.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn state(&self) -> ControllerState {
        self.shared.state()
    }

    /// Time source reading taken when the controller started. Tick `n` is
    /// due `n` intervals after it.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True once the timer task has been torn down.
    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::Acquire)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("controller", &self.shared.id)
            .field("state", &self.shared.state())
            .finish()
    }
}
