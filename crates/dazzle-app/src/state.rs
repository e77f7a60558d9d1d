// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Panel state: the single value the store and push handlers mutate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dazzle_core::{AppConfig, PrintJob, Printer};

/// State shared between the store and its push-event handlers.
pub type SharedState = Arc<Mutex<PanelState>>;

/// Everything the panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    /// Printers known to the host spooler.
    pub printers: Vec<Printer>,
    pub config: AppConfig,
    /// Job history, newest first, at most `MAX_JOB_HISTORY` entries.
    pub print_jobs: Vec<PrintJob>,
    pub server_running: bool,
    /// Last server failure, cleared when the server is seen running again.
    pub server_error: Option<String>,
    /// True until the first bootstrap finishes (either way).
    pub loading: bool,
    /// Why bootstrap failed, if it did.
    pub init_error: Option<String>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            printers: Vec::new(),
            config: AppConfig::default(),
            print_jobs: Vec::new(),
            server_running: false,
            server_error: None,
            loading: true,
            init_error: None,
        }
    }
}

impl PanelState {
    pub fn selected_printer(&self) -> Option<&str> {
        self.config.selected_printer.as_deref()
    }
}

/// Lock shared state, recovering the value if a handler panicked.
pub fn lock(state: &SharedState) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
