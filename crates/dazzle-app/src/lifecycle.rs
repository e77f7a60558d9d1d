// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Push subscription lifecycle.
//
// One handler task per channel. Arming again tears the previous set down
// first, so a re-bootstrap never leaves two handlers applying the same event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use dazzle_bridge::{Backend, EventChannel};

use crate::reconcile;
use crate::state::{self, SharedState};

/// Owns the push handlers for a store.
///
/// Dropping the lifecycle tears the handlers down.
#[derive(Default)]
pub struct SubscriptionLifecycle {
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// Bumped on every arm and teardown. A handler whose generation is no
    /// longer current discards what it receives.
    generation: Arc<AtomicU64>,
}

impl SubscriptionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down existing handlers and subscribe to every push channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&self, backend: &dyn Backend, shared: &SharedState) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        let dropped = handles.len();
        for handle in handles.drain(..) {
            handle.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        for channel in EventChannel::ALL {
            let mut stream = backend.listen(channel);
            let shared = Arc::clone(shared);
            let current = Arc::clone(&self.generation);
            handles.push(tokio::spawn(async move {
                while let Some(event) = stream.next().await {
                    let mut panel = state::lock(&shared);
                    if current.load(Ordering::SeqCst) != generation {
                        break;
                    }
                    reconcile::apply(&mut panel, event);
                }
                debug!(channel = %channel, generation, "push handler stopped");
            }));
        }

        info!(generation, replaced = dropped, "push subscriptions armed");
    }

    /// Stop every handler. Safe to call when nothing is armed.
    pub fn teardown(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.is_empty() {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        for handle in handles.drain(..) {
            handle.abort();
        }
        debug!("push subscriptions torn down");
    }

    /// True while at least one handler is still running. Handlers end on
    /// teardown or when the backend closes its event streams.
    pub fn is_armed(&self) -> bool {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|h| !h.is_finished())
    }
}

impl Drop for SubscriptionLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}
