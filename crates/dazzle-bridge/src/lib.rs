// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dazzle — boundary to the desktop runtime that hosts the print service.
//
// The panel never talks to the runtime directly. It issues named commands
// and listens on named push channels through the `Backend` trait, so the
// same store runs against the real host or the in-memory backend.

pub mod memory;
pub mod traits;

pub use memory::{Command, MemoryBackend};
pub use traits::{Backend, EventChannel, EventStream, PushEvent};
