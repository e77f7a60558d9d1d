// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dazzle — control panel state.
//
// The store owns the panel's view of the print server: printers, config,
// job history and running/error status. It is loaded once by `bootstrap`
// and then kept current by push-event handlers.

pub mod lifecycle;
pub mod reconcile;
pub mod state;
pub mod store;

pub use lifecycle::SubscriptionLifecycle;
pub use state::{PanelState, SharedState};
pub use store::PanelStore;
