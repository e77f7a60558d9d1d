// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared-timer reachability watching.
//
// Any number of watchers can subscribe; all of them ride one polling task
// running at the finest interval requested so far. The interval only ever
// shrinks while watchers remain: when a fast watcher leaves, the timer keeps
// its pace until the last watcher is gone and the timer is cleared.
//
// Watchers are notified only when the observed reachability flips. Ticks are
// sequential inside the timer task (probe, then wait for the next tick), so a
// slow probe delays the next tick rather than overlapping with it.
//
// Registration never waits on the network. The watcher joins and the timer
// is armed first; its first value comes from a separate probe task, which is
// dropped if a tick reaches the watcher before it does.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::probe::Reachability;

/// Polling interval used when the caller has no preference.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(5000);

/// Smallest interval the timer will arm with.
const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(1);

type WatchCallback = Arc<dyn Fn(bool) + Send + Sync>;

struct Watcher {
    id: u64,
    callback: WatchCallback,
    /// Set once the watcher has been given any value.
    notified: bool,
    /// Pending first delivery, aborted on unwatch.
    initial: Option<JoinHandle<()>>,
}

struct ArmedTimer {
    interval: Duration,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct SchedulerState {
    watchers: Vec<Watcher>,
    next_id: u64,
    armed: Option<ArmedTimer>,
    /// Bumped on every (re)arm so a replaced timer cannot deliver.
    generation: u64,
    last_observed: Option<bool>,
}

struct Inner {
    probe: Arc<dyn Reachability>,
    state: Mutex<SchedulerState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.armed.take() {
            timer.task.abort();
        }
        for watcher in &mut state.watchers {
            if let Some(task) = watcher.initial.take() {
                task.abort();
            }
        }
    }
}

/// Multiplexes reachability watchers onto one polling timer.
#[derive(Clone)]
pub struct WatchScheduler {
    inner: Arc<Inner>,
}

/// Opaque registration token returned by [`WatchScheduler::watch`].
#[must_use = "dropping the handle without calling `unwatch` keeps the watcher registered"]
pub struct WatchHandle {
    id: u64,
    inner: Arc<Inner>,
}

impl WatchHandle {
    /// Remove exactly this watcher. Clears the timer if it was the last one.
    pub fn unwatch(self) {
        self.inner.unwatch(self.id);
    }
}

impl WatchScheduler {
    pub fn new(probe: Arc<dyn Reachability>) -> Self {
        Self {
            inner: Arc::new(Inner {
                probe,
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Register `callback` to hear about reachability changes.
    ///
    /// Returns at once with the watcher registered and the shared timer
    /// (re)armed when none runs or when `interval` is finer than the armed
    /// one. The callback's first value comes from a probe made for it alone,
    /// unless a timer tick reaches it first. After that it is called on every
    /// observed flip.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch<F>(&self, callback: F, interval: Duration) -> WatchHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let interval = interval.max(MIN_WATCH_INTERVAL);

        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        let initial = tokio::spawn(deliver_initial(
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.probe),
            id,
        ));
        state.watchers.push(Watcher {
            id,
            callback: Arc::new(callback),
            notified: false,
            initial: Some(initial),
        });

        let rearm = match &state.armed {
            None => true,
            Some(timer) => interval < timer.interval,
        };
        if rearm {
            Inner::arm(&self.inner, &mut state, interval);
        }

        debug!(
            id,
            watchers = state.watchers.len(),
            interval_ms = interval.as_millis() as u64,
            "watcher registered"
        );

        WatchHandle {
            id,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Interval the shared timer currently runs at, if it runs.
    pub fn armed_interval(&self) -> Option<Duration> {
        self.inner.lock().armed.as_ref().map(|t| t.interval)
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.lock().watchers.len()
    }

    /// Last value seen by the timer (not by registration probes).
    pub fn last_observed(&self) -> Option<bool> {
        self.inner.lock().last_observed
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm(this: &Arc<Self>, state: &mut SchedulerState, interval: Duration) {
        if let Some(old) = state.armed.take() {
            old.task.abort();
        }
        state.generation += 1;

        let task = tokio::spawn(tick_loop(
            Arc::downgrade(this),
            interval,
            state.generation,
        ));
        state.armed = Some(ArmedTimer { interval, task });

        debug!(interval_ms = interval.as_millis() as u64, "watch timer armed");
    }

    fn unwatch(&self, id: u64) {
        let mut state = self.lock();
        if let Some(pos) = state.watchers.iter().position(|w| w.id == id) {
            let watcher = state.watchers.remove(pos);
            if let Some(task) = watcher.initial {
                task.abort();
            }
        }

        if state.watchers.is_empty() {
            if let Some(timer) = state.armed.take() {
                timer.task.abort();
                debug!("last watcher left, timer cleared");
            }
            state.last_observed = None;
        }
    }

    /// Hand a registration probe result to its watcher, unless the watcher
    /// is gone or a tick already told it something newer.
    fn deliver_initial(&self, id: u64, running: bool) {
        let callback = {
            let mut state = self.lock();
            let Some(watcher) = state.watchers.iter_mut().find(|w| w.id == id) else {
                return;
            };
            watcher.initial = None;
            if watcher.notified {
                debug!(id, "initial value superseded by a tick");
                return;
            }
            watcher.notified = true;
            Arc::clone(&watcher.callback)
        };
        callback(running);
    }

    /// Record a tick result and fan it out if it is a change.
    fn observe(&self, running: bool, generation: u64) {
        let targets: Vec<WatchCallback> = {
            let mut state = self.lock();
            if state.generation != generation || state.armed.is_none() {
                return;
            }
            if state.last_observed == Some(running) {
                return;
            }
            state.last_observed = Some(running);
            // Snapshot so callbacks may (un)register while being notified.
            state
                .watchers
                .iter_mut()
                .map(|w| {
                    w.notified = true;
                    Arc::clone(&w.callback)
                })
                .collect()
        };

        info!(running, watchers = targets.len(), "print service reachability changed");
        for callback in targets {
            callback(running);
        }
    }
}

async fn deliver_initial(inner: Weak<Inner>, probe: Arc<dyn Reachability>, id: u64) {
    let running = probe.probe().await;
    if let Some(inner) = inner.upgrade() {
        inner.deliver_initial(id, running);
    }
}

async fn tick_loop(inner: Weak<Inner>, period: Duration, generation: u64) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let running = inner.probe.probe().await;
        inner.observe(running, generation);
    }
}
