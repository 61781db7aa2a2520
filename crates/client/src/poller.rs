//! Fixed-cadence refresh primitive.
//!
//! A [`Poller`] runs a fetch on a wall-clock schedule while an activity
//! predicate holds. It serialises its own fetches: a tick that fires while
//! the previous fetch is still running is skipped rather than stacked.
//!
//! Stopping cancels the schedule only. A fetch already in flight runs to
//! completion; callers that must ignore its result guard it with a
//! [`Generation`](crate::generation::Generation).

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Repeating, restartable refresh schedule.
pub struct Poller {
    name: Arc<str>,
    schedule: Mutex<Option<Schedule>>,
}

/// One installed schedule. A restart gets a fresh in-flight flag, so a
/// fetch left over from the old schedule never holds back the new one.
struct Schedule {
    task: JoinHandle<()>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the fetch task ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Poller {
    /// Create an idle poller; `name` tags its log lines.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            schedule: Mutex::new(None),
        }
    }

    /// Fetch immediately, then every `interval` while `is_active` holds.
    ///
    /// An inactive tick is skipped without shifting the schedule. A failed
    /// fetch is logged and the schedule carries on. Starting an already
    /// running poller replaces its schedule.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<A, F, Fut, E>(&self, interval: Duration, is_active: A, fetch: F)
    where
        A: Fn() -> bool + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.schedule_from(Instant::now(), interval, true, is_active, fetch);
    }

    /// Like [`start`](Self::start), but the first tick comes one `interval`
    /// from now. For callers that have just fetched by hand.
    pub fn resume<A, F, Fut, E>(&self, interval: Duration, is_active: A, fetch: F)
    where
        A: Fn() -> bool + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.schedule_from(Instant::now() + interval, interval, false, is_active, fetch);
    }

    /// Cancel the schedule. Idempotent; in-flight fetches are not aborted.
    pub fn stop(&self) {
        let previous = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(schedule) = previous {
            schedule.task.abort();
            debug!(poller = %self.name, "Poller stopped");
        }
    }

    /// Whether a schedule is currently installed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|schedule| !schedule.task.is_finished())
    }

    /// Whether a fetch started by the current schedule is still running.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|schedule| schedule.in_flight.load(Ordering::Acquire))
    }

    fn schedule_from<A, F, Fut, E>(
        &self,
        first_tick: Instant,
        interval: Duration,
        fire_first: bool,
        is_active: A,
        fetch: F,
    ) where
        A: Fn() -> bool + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.stop();

        let name = Arc::clone(&self.name);
        let in_flight = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&in_flight);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut forced = fire_first;

            loop {
                ticker.tick().await;
                if !std::mem::take(&mut forced) && !is_active() {
                    trace!(poller = %name, "Inactive, skipping tick");
                    continue;
                }
                fire(&name, &flag, &fetch);
            }
        });

        debug!(poller = %self.name, interval_ms = interval.as_millis(), "Poller started");
        *self.schedule.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Schedule { task, in_flight });
    }
}

fn fire<F, Fut, E>(name: &Arc<str>, in_flight: &Arc<AtomicBool>, fetch: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    if in_flight.swap(true, Ordering::AcqRel) {
        debug!(poller = %name, "Previous fetch still running, skipping tick");
        return;
    }

    let guard = InFlight(Arc::clone(in_flight));
    let name = Arc::clone(name);
    let pending = fetch();
    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = pending.await {
            warn!(poller = %name, error = %e, "Background refresh failed");
        }
    });
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("fetching", &self.is_fetching())
            .finish()
    }
}
