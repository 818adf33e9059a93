//! Periodic playback: a tokio driver that advances the clock once per tick
//! period and recomputes the scene for every hour change.
//!
//! All mutation goes through one lock. Every driver task carries the
//! generation it was spawned with and exits as soon as that no longer
//! matches, so replacing the period or scrubbing can never leave two drivers
//! advancing the same clock.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, Weak,
};

use serde::Serialize;
use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::broadcast,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};

use crate::{
    clock::{self, ClockError, SimulationClock, TickPeriod, HOURS_PER_DAY},
    engine::{Engine, Scene},
};

const FRAME_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error("playback needs a tokio runtime to drive ticks")]
    NoRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameCause {
    Refresh,
    Tick,
    Step,
    Scrub,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneFrame {
    pub sequence: u64,
    pub cause: FrameCause,
    pub scene: Scene,
}

struct PlaybackState {
    clock: SimulationClock,
    generation: u64,
    sequence: u64,
    driver: Option<JoinHandle<()>>,
    latest: Option<SceneFrame>,
}

struct Inner {
    engine: Engine,
    state: Mutex<PlaybackState>,
    in_flight: AtomicBool,
    broadcaster: broadcast::Sender<SceneFrame>,
}

/// Clears the in-flight flag when the tick body returns or unwinds.
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Driver tick. Returns false once the driver that called it is stale.
    fn drive(&self, generation: u64) -> bool {
        let Some(_guard) = TickGuard::acquire(&self.in_flight) else {
            log::debug!("tick skipped, previous tick still in flight");
            return true;
        };
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        match state.clock.advance() {
            Some(hour) => {
                self.publish(&mut state, FrameCause::Tick, hour);
                true
            }
            None => false,
        }
    }

    fn publish(&self, state: &mut PlaybackState, cause: FrameCause, hour: u8) -> SceneFrame {
        let report = self.engine.compute(hour);
        state.sequence += 1;
        let frame = SceneFrame {
            sequence: state.sequence,
            cause,
            scene: report.scene,
        };
        log::info!("{}", frame.scene.narrative);
        state.latest = Some(frame.clone());
        // an error only means nobody is listening
        let _ = self.broadcaster.send(frame.clone());
        frame
    }

    /// Stops the clock and retires the current driver.
    fn halt(state: &mut PlaybackState) -> bool {
        state.generation += 1;
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        state.clock.stop()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
    }
}

/// Handle to a playback session. Clones share the same clock and driver.
#[derive(Clone)]
pub struct Playback {
    inner: Arc<Inner>,
}

impl Playback {
    /// Takes ownership of the clock. A clock handed over in the running
    /// state is stopped; call [`Playback::start`] to begin ticking.
    pub fn new(engine: Engine, mut clock: SimulationClock) -> Self {
        clock.stop();
        let (broadcaster, _) = broadcast::channel(FRAME_BUFFER);
        Self {
            inner: Arc::new(Inner {
                engine,
                state: Mutex::new(PlaybackState {
                    clock,
                    generation: 0,
                    sequence: 0,
                    driver: None,
                    latest: None,
                }),
                in_flight: AtomicBool::new(false),
                broadcaster,
            }),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.inner.engine
    }

    pub fn current_hour(&self) -> u8 {
        self.inner.lock().clock.current_hour()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().clock.is_running()
    }

    pub fn tick_period(&self) -> TickPeriod {
        self.inner.lock().clock.tick_period()
    }

    pub fn latest(&self) -> Option<SceneFrame> {
        self.inner.lock().latest.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneFrame> {
        self.inner.broadcaster.subscribe()
    }

    /// Frames as a stream. A lagging subscriber drops the frames it missed
    /// and carries on with the newest ones.
    pub fn frames(&self) -> impl Stream<Item = SceneFrame> {
        BroadcastStream::new(self.subscribe()).filter_map(|msg| match msg {
            Ok(frame) => Some(frame),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                log::warn!("frame subscriber lagged, skipped {missed} frames");
                None
            }
        })
    }

    /// Starts periodic advancement. Returns `Ok(false)` if already running.
    pub fn start(&self) -> Result<bool, PlaybackError> {
        let handle = Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?;
        let mut state = self.inner.lock();
        if !state.clock.start() {
            return Ok(false);
        }
        self.spawn_driver(&handle, &mut state);
        log::info!(
            "playback started at {} ({})",
            clock::format_hour(state.clock.current_hour()),
            state.clock.tick_period().label()
        );
        Ok(true)
    }

    /// Stops periodic advancement. Returns false if already stopped.
    pub fn stop(&self) -> bool {
        let mut state = self.inner.lock();
        let stopped = Inner::halt(&mut state);
        if stopped {
            log::info!(
                "playback paused at {}",
                clock::format_hour(state.clock.current_hour())
            );
        }
        stopped
    }

    /// Changes the tick period. A running driver is replaced; the new one
    /// first fires one full period from now.
    /// Fails without touching the clock when a replacement driver is needed
    /// but no runtime is available.
    pub fn set_tick_period(&self, period: TickPeriod) -> Result<(), PlaybackError> {
        let mut state = self.inner.lock();
        let handle = if state.clock.is_running() {
            Some(Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?)
        } else {
            None
        };
        state.clock.set_tick_period(period);
        if let Some(handle) = handle {
            self.spawn_driver(&handle, &mut state);
        }
        log::debug!("tick period set to {}", period.label());
        Ok(())
    }

    pub fn set_tick_period_ms(&self, ms: u64) -> Result<(), PlaybackError> {
        self.set_tick_period(TickPeriod::from_millis(ms)?)
    }

    /// Scrubs to `hour`. Playback stops first and stays stopped. An invalid
    /// hour is rejected before anything changes.
    pub fn set_hour(&self, hour: i64) -> Result<SceneFrame, ClockError> {
        let hour = clock::validate_hour(hour)?;
        let mut state = self.inner.lock();
        Inner::halt(&mut state);
        state.clock.set_hour(i64::from(hour))?;
        Ok(self.inner.publish(&mut state, FrameCause::Scrub, hour))
    }

    /// Moves one hour forward on demand, running or not. Returns `None`
    /// when a tick is already in flight; the request is dropped, not queued.
    pub fn step(&self) -> Option<SceneFrame> {
        let _guard = TickGuard::acquire(&self.inner.in_flight)?;
        let mut state = self.inner.lock();
        let next = (state.clock.current_hour() + 1) % HOURS_PER_DAY;
        state.clock.set_hour(i64::from(next)).ok()?;
        Some(self.inner.publish(&mut state, FrameCause::Step, next))
    }

    /// Recomputes and publishes the scene for the current hour.
    pub fn refresh(&self) -> Option<SceneFrame> {
        let _guard = TickGuard::acquire(&self.inner.in_flight)?;
        let mut state = self.inner.lock();
        let hour = state.clock.current_hour();
        Some(self.inner.publish(&mut state, FrameCause::Refresh, hour))
    }

    fn spawn_driver(&self, handle: &Handle, state: &mut PlaybackState) {
        state.generation += 1;
        if let Some(old) = state.driver.take() {
            old.abort();
        }
        let generation = state.generation;
        let period = state.clock.tick_period().as_duration();
        let first = Instant::now() + period;
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        state.driver = Some(handle.spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                if !inner.drive(generation) {
                    break;
                }
            }
            log::trace!("driver generation {generation} exited");
        }));
    }
}
