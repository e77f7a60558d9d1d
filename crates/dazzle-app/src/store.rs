// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Panel store. Loads state from the backend and keeps it current.
//
// `bootstrap` runs the four initial fetches concurrently and applies them
// all or none. On success it derives a selected printer when none is
// configured and arms the push handlers.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use dazzle_bridge::Backend;
use dazzle_core::error::Result;
use dazzle_core::human_errors::humanize_error;
use dazzle_core::types::MAX_JOB_HISTORY;
use dazzle_core::{AppConfig, Printer};

use crate::lifecycle::SubscriptionLifecycle;
use crate::state::{self, PanelState, SharedState};

/// Owns the panel state and the backend it was loaded from.
pub struct PanelStore {
    backend: Arc<dyn Backend>,
    shared: SharedState,
    subscriptions: SubscriptionLifecycle,
}

impl PanelStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            shared: SharedState::default(),
            subscriptions: SubscriptionLifecycle::new(),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> PanelState {
        state::lock(&self.shared).clone()
    }

    pub fn subscriptions(&self) -> &SubscriptionLifecycle {
        &self.subscriptions
    }

    /// Load everything from the backend and start listening for pushes.
    ///
    /// If any fetch fails nothing is applied: `init_error` records the
    /// failure, `loading` goes false and the error is returned. Calling
    /// this again re-fetches and re-arms without duplicating handlers.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<PanelState> {
        let backend = self.backend.as_ref();
        let loaded = tokio::try_join!(
            backend.list_printers(),
            backend.get_config(),
            backend.get_print_jobs(),
            backend.get_server_running(),
        );

        let (printers, mut config, mut jobs, running) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(error = %e, "panel bootstrap failed");
                let mut panel = state::lock(&self.shared);
                panel.loading = false;
                panel.init_error = Some(e.to_string());
                return Err(e);
            }
        };

        if config.selected_printer.is_none() {
            if let Some(name) = default_printer(&printers) {
                info!(printer = %name, "no printer selected; using default");
                config = config.with_selected_printer(name);
                self.persist_in_background(config.clone());
            }
        }
        jobs.truncate(MAX_JOB_HISTORY);

        let snapshot = {
            let mut panel = state::lock(&self.shared);
            panel.printers = printers;
            panel.config = config;
            panel.print_jobs = jobs;
            panel.server_running = running;
            panel.loading = false;
            panel.init_error = None;
            panel.clone()
        };

        self.subscriptions.arm(self.backend.as_ref(), &self.shared);
        info!(
            printers = snapshot.printers.len(),
            jobs = snapshot.print_jobs.len(),
            running = snapshot.server_running,
            "panel loaded"
        );
        Ok(snapshot)
    }

    /// Re-fetch the printer list.
    pub async fn refresh_printers(&self) -> Result<Vec<Printer>> {
        let printers = self.backend.list_printers().await?;
        state::lock(&self.shared).printers = printers.clone();
        Ok(printers)
    }

    /// Validate and persist a new configuration, then adopt it.
    ///
    /// State is only replaced once the backend has accepted the value.
    pub async fn update_config(&self, config: AppConfig) -> Result<()> {
        config.validate()?;
        self.backend.set_config(config.clone()).await?;
        info!(port = config.port, printer = ?config.selected_printer, "configuration saved");
        state::lock(&self.shared).config = config;
        Ok(())
    }

    /// Restart the print server.
    ///
    /// The previous error is cleared up front. A failure is not returned:
    /// it is stored as a readable `server_error` and the server is marked
    /// stopped.
    pub async fn restart_server(&self) {
        state::lock(&self.shared).server_error = None;

        match self.backend.restart_server().await {
            Ok(()) => info!("print server restart requested"),
            Err(e) => {
                error!(error = %e, "print server restart failed");
                let message = humanize_error(&e).to_string();
                let mut panel = state::lock(&self.shared);
                panel.server_error = Some(message);
                panel.server_running = false;
            }
        }
    }

    /// Stop listening for pushes.
    pub fn shutdown(&self) {
        self.subscriptions.teardown();
    }

    fn persist_in_background(&self, config: AppConfig) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.set_config(config).await {
                warn!(error = %e, "failed to persist derived printer selection");
            }
        });
    }
}

/// The spooler's default printer, else the first one listed.
pub fn default_printer(printers: &[Printer]) -> Option<String> {
    printers
        .iter()
        .find(|p| p.is_default)
        .or_else(|| printers.first())
        .map(|p| p.name.clone())
}
