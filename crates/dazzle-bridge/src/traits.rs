// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend command and push-event traits.
//
// Commands are request/response and may fail with a `DazzleError::Backend`.
// Push events are fire-and-forget and fan out to every listener on the
// matching channel.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use dazzle_core::error::Result;
use dazzle_core::{AppConfig, PrintJob, Printer};

/// Named push channels emitted by the desktop runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    /// A job was created or changed state.
    PrintJob,
    /// The print server started or stopped.
    ServerStatus,
    /// The print server failed (for example, the port is taken).
    ServerError,
}

impl EventChannel {
    /// Every channel the panel subscribes to.
    pub const ALL: [EventChannel; 3] = [
        EventChannel::PrintJob,
        EventChannel::ServerStatus,
        EventChannel::ServerError,
    ];

    /// Wire name of the channel.
    pub fn name(self) -> &'static str {
        match self {
            EventChannel::PrintJob => "print-job",
            EventChannel::ServerStatus => "server-status",
            EventChannel::ServerError => "server-error",
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single pushed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    PrintJob(PrintJob),
    ServerStatus(bool),
    ServerError(String),
}

impl PushEvent {
    /// Channel this event is delivered on.
    pub fn channel(&self) -> EventChannel {
        match self {
            PushEvent::PrintJob(_) => EventChannel::PrintJob,
            PushEvent::ServerStatus(_) => EventChannel::ServerStatus,
            PushEvent::ServerError(_) => EventChannel::ServerError,
        }
    }
}

/// Stream of events for one channel.
///
/// Wraps a broadcast receiver shared by all channels and filters out the
/// events that belong to other channels. A lagging listener skips what it
/// missed and keeps going.
pub struct EventStream {
    channel: EventChannel,
    rx: broadcast::Receiver<PushEvent>,
}

impl EventStream {
    pub fn new(channel: EventChannel, rx: broadcast::Receiver<PushEvent>) -> Self {
        Self { channel, rx }
    }

    pub fn channel(&self) -> EventChannel {
        self.channel
    }

    /// Wait for the next event on this channel.
    ///
    /// Returns `None` once the backend has gone away.
    pub async fn next(&mut self) -> Option<PushEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.channel() == self.channel => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "push listener lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Commands the panel can issue to the desktop runtime.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Printers known to the host spooler.
    async fn list_printers(&self) -> Result<Vec<Printer>>;

    /// Persisted application configuration.
    async fn get_config(&self) -> Result<AppConfig>;

    /// Replace the persisted configuration.
    async fn set_config(&self, config: AppConfig) -> Result<()>;

    /// Job history, newest first.
    async fn get_print_jobs(&self) -> Result<Vec<PrintJob>>;

    async fn get_server_running(&self) -> Result<bool>;

    /// Stop and start the print server on the configured port.
    async fn restart_server(&self) -> Result<()>;

    /// Subscribe to a push channel.
    ///
    /// The subscription is live as soon as this returns; events emitted
    /// afterwards are delivered to the returned stream.
    fn listen(&self, channel: EventChannel) -> EventStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_wire_names() {
        assert_eq!(EventChannel::PrintJob.to_string(), "print-job");
        assert_eq!(EventChannel::ServerStatus.to_string(), "server-status");
        assert_eq!(EventChannel::ServerError.to_string(), "server-error");
    }

    #[tokio::test]
    async fn stream_filters_other_channels() {
        let (tx, _) = broadcast::channel(16);
        let mut stream = EventStream::new(EventChannel::ServerError, tx.subscribe());

        tx.send(PushEvent::ServerStatus(true)).unwrap();
        tx.send(PushEvent::ServerError("port in use".into())).unwrap();

        assert_eq!(
            stream.next().await,
            Some(PushEvent::ServerError("port in use".into()))
        );
    }

    #[tokio::test]
    async fn stream_ends_when_sender_dropped() {
        let (tx, _) = broadcast::channel::<PushEvent>(4);
        let mut stream = EventStream::new(EventChannel::PrintJob, tx.subscribe());
        drop(tx);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn lagging_stream_resumes() {
        let (tx, _) = broadcast::channel(2);
        let mut stream = EventStream::new(EventChannel::ServerStatus, tx.subscribe());

        for running in [true, false, true, false] {
            tx.send(PushEvent::ServerStatus(running)).unwrap();
        }

        // Capacity 2: the two oldest were overwritten.
        assert_eq!(stream.next().await, Some(PushEvent::ServerStatus(true)));
        assert_eq!(stream.next().await, Some(PushEvent::ServerStatus(false)));
    }
}
