// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dazzle Client — talks to the local print service: reachability probing,
// shared-timer status watching, and binary-safe, order-preserving payload
// submission.

pub mod client;
pub mod encoding;
pub mod probe;
pub mod watch;

pub use client::DazzleClient;
pub use encoding::Payload;
pub use probe::Reachability;
pub use watch::{DEFAULT_WATCH_INTERVAL, WatchHandle, WatchScheduler};
