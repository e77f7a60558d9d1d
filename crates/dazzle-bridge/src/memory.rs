// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory backend.
//
// Holds printers, configuration, job history and server state behind a
// mutex and fans push events out over a broadcast channel. Used by the
// terminal panel (seeded from the live service) and by tests, which can
// inject one-shot command failures.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use dazzle_core::error::{DazzleError, Result};
use dazzle_core::types::MAX_JOB_HISTORY;
use dazzle_core::{AppConfig, PrintJob, Printer};

use crate::traits::{Backend, EventChannel, EventStream, PushEvent};

const EVENT_CAPACITY: usize = 256;

/// Backend commands, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ListPrinters,
    GetConfig,
    SetConfig,
    GetPrintJobs,
    GetServerRunning,
    RestartServer,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::ListPrinters => "list_printers",
            Command::GetConfig => "get_config",
            Command::SetConfig => "set_config",
            Command::GetPrintJobs => "get_print_jobs",
            Command::GetServerRunning => "get_server_running",
            Command::RestartServer => "restart_server",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    printers: Vec<Printer>,
    config: AppConfig,
    jobs: Vec<PrintJob>,
    running: bool,
    failures: HashMap<Command, String>,
    config_writes: Vec<AppConfig>,
    restarts: usize,
}

/// A `Backend` that keeps everything in process memory.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<PushEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
        }
    }

    pub fn with_printers(self, printers: Vec<Printer>) -> Self {
        self.lock().printers = printers;
        self
    }

    pub fn with_config(self, config: AppConfig) -> Self {
        self.lock().config = config;
        self
    }

    /// Seed the job history (newest first). Anything past the cap is dropped.
    pub fn with_jobs(self, mut jobs: Vec<PrintJob>) -> Self {
        jobs.truncate(MAX_JOB_HISTORY);
        self.lock().jobs = jobs;
        self
    }

    pub fn with_running(self, running: bool) -> Self {
        self.lock().running = running;
        self
    }

    /// Make the next call of `command` fail with `message`.
    pub fn fail_next(&self, command: Command, message: impl Into<String>) {
        self.lock().failures.insert(command, message.into());
    }

    pub fn set_printers(&self, printers: Vec<Printer>) {
        self.lock().printers = printers;
    }

    /// Publish a push event to every live listener.
    ///
    /// Job updates are also recorded in the backend's own history and
    /// status updates in its running flag. Returns the number of listeners
    /// (across all channels) that received the event.
    pub fn emit(&self, event: PushEvent) -> usize {
        {
            let mut state = self.lock();
            match &event {
                PushEvent::PrintJob(job) => {
                    let existing = state.jobs.iter().position(|j| j.id == job.id);
                    match existing {
                        Some(idx) => state.jobs[idx] = job.clone(),
                        None => state.jobs.insert(0, job.clone()),
                    }
                    state.jobs.truncate(MAX_JOB_HISTORY);
                }
                PushEvent::ServerStatus(running) => state.running = *running,
                PushEvent::ServerError(_) => state.running = false,
            }
        }
        debug!(channel = %event.channel(), "emitting push event");
        // No listeners is not an error for a push.
        self.events.send(event).unwrap_or(0)
    }

    /// Every configuration passed to `set_config`, oldest first.
    pub fn config_writes(&self) -> Vec<AppConfig> {
        self.lock().config_writes.clone()
    }

    pub fn restart_count(&self) -> usize {
        self.lock().restarts
    }

    /// Number of live push listeners across all channels.
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self, command: Command) -> Result<()> {
        match self.lock().failures.remove(&command) {
            Some(message) => {
                debug!(command = %command, "injected backend failure");
                Err(DazzleError::Backend(message))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_printers(&self) -> Result<Vec<Printer>> {
        self.take_failure(Command::ListPrinters)?;
        Ok(self.lock().printers.clone())
    }

    async fn get_config(&self) -> Result<AppConfig> {
        self.take_failure(Command::GetConfig)?;
        Ok(self.lock().config.clone())
    }

    async fn set_config(&self, config: AppConfig) -> Result<()> {
        self.take_failure(Command::SetConfig)?;
        let mut state = self.lock();
        state.config_writes.push(config.clone());
        state.config = config;
        Ok(())
    }

    async fn get_print_jobs(&self) -> Result<Vec<PrintJob>> {
        self.take_failure(Command::GetPrintJobs)?;
        Ok(self.lock().jobs.clone())
    }

    async fn get_server_running(&self) -> Result<bool> {
        self.take_failure(Command::GetServerRunning)?;
        Ok(self.lock().running)
    }

    async fn restart_server(&self) -> Result<()> {
        let port = self.lock().config.port;
        let failure = self.lock().failures.remove(&Command::RestartServer);
        if let Some(message) = failure {
            self.emit(PushEvent::ServerError(message.clone()));
            return Err(DazzleError::Backend(message));
        }
        self.lock().restarts += 1;
        info!(port, "print server restarted");
        self.emit(PushEvent::ServerStatus(true));
        Ok(())
    }

    fn listen(&self, channel: EventChannel) -> EventStream {
        EventStream::new(channel, self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dazzle_core::JobStatus;

    fn job(id: &str, status: JobStatus) -> PrintJob {
        PrintJob {
            id: id.into(),
            printer: "Zebra".into(),
            timestamp: 1_700_000_000,
            status,
            zpl_preview: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn commands_return_seeded_state() {
        let backend = MemoryBackend::new()
            .with_printers(vec![Printer {
                name: "Zebra".into(),
                is_default: true,
            }])
            .with_running(true);

        assert_eq!(backend.list_printers().await.unwrap().len(), 1);
        assert!(backend.get_server_running().await.unwrap());
        assert_eq!(backend.get_config().await.unwrap(), AppConfig::default());
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let backend = MemoryBackend::new();
        backend.fail_next(Command::GetConfig, "backend down");

        let err = backend.get_config().await.unwrap_err();
        assert!(err.to_string().contains("backend down"));
        assert!(backend.get_config().await.is_ok());
    }

    #[tokio::test]
    async fn set_config_is_recorded() {
        let backend = MemoryBackend::new();
        let next = AppConfig::default().with_selected_printer("B");
        backend.set_config(next.clone()).await.unwrap();

        assert_eq!(backend.config_writes(), vec![next.clone()]);
        assert_eq!(backend.get_config().await.unwrap(), next);
    }

    #[tokio::test]
    async fn emit_reaches_listener_on_its_channel() {
        let backend = MemoryBackend::new();
        let mut jobs = backend.listen(EventChannel::PrintJob);

        backend.emit(PushEvent::ServerStatus(true));
        backend.emit(PushEvent::PrintJob(job("j1", JobStatus::Pending)));

        assert_eq!(
            jobs.next().await,
            Some(PushEvent::PrintJob(job("j1", JobStatus::Pending)))
        );
    }

    #[tokio::test]
    async fn emitted_jobs_update_history() {
        let backend = MemoryBackend::new();
        backend.emit(PushEvent::PrintJob(job("j1", JobStatus::Pending)));
        backend.emit(PushEvent::PrintJob(job("j2", JobStatus::Pending)));
        backend.emit(PushEvent::PrintJob(job("j1", JobStatus::Completed)));

        let history = backend.get_print_jobs().await.unwrap();
        assert_eq!(history[0].id, "j2");
        assert_eq!(history[1].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn failed_restart_pushes_server_error() {
        let backend = MemoryBackend::new().with_running(true);
        let mut errors = backend.listen(EventChannel::ServerError);
        backend.fail_next(Command::RestartServer, "port in use");

        assert!(backend.restart_server().await.is_err());
        assert!(matches!(
            errors.next().await,
            Some(PushEvent::ServerError(msg)) if msg.contains("port in use")
        ));
        assert!(!backend.get_server_running().await.unwrap());
        assert_eq!(backend.restart_count(), 0);
    }
}
