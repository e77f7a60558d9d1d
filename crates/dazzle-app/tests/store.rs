// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Panel store behaviour against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;

use dazzle_app::{PanelState, PanelStore};
use dazzle_bridge::{Command, EventChannel, MemoryBackend, PushEvent};
use dazzle_core::types::MAX_JOB_HISTORY;
use dazzle_core::{AppConfig, JobStatus, PrintJob, Printer};

fn printer(name: &str, is_default: bool) -> Printer {
    Printer {
        name: name.into(),
        is_default,
    }
}

fn job(id: &str, status: JobStatus) -> PrintJob {
    PrintJob {
        id: id.into(),
        printer: "Zebra".into(),
        timestamp: 1_700_000_000,
        status,
        zpl_preview: Some("^XA^FO50,50^FDHello^FS^XZ".into()),
        error: None,
    }
}

fn store_for(backend: &Arc<MemoryBackend>) -> PanelStore {
    PanelStore::new(Arc::clone(backend) as Arc<dyn dazzle_bridge::Backend>)
}

async fn wait_until(store: &PanelStore, pred: impl Fn(&PanelState) -> bool) -> PanelState {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = store.snapshot();
            if pred(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("panel state never reached the expected condition")
}

async fn wait_for_writes(backend: &MemoryBackend, expected: usize) -> Vec<AppConfig> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let writes = backend.config_writes();
            if writes.len() >= expected {
                return writes;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("config was never persisted")
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bootstrap_loads_everything() {
    let backend = Arc::new(
        MemoryBackend::new()
            .with_printers(vec![printer("Zebra", true)])
            .with_config(AppConfig::default().with_selected_printer("Zebra"))
            .with_jobs(vec![job("j2", JobStatus::Pending), job("j1", JobStatus::Completed)])
            .with_running(true),
    );
    let store = store_for(&backend);
    assert!(store.snapshot().loading);

    let loaded = store.bootstrap().await.unwrap();

    assert!(!loaded.loading);
    assert_eq!(loaded.init_error, None);
    assert_eq!(loaded.printers.len(), 1);
    assert_eq!(loaded.print_jobs.len(), 2);
    let submitted = loaded.print_jobs[0].submitted_at().expect("fixture timestamp in range");
    assert_eq!(submitted.year(), 2023);
    assert!(loaded.server_running);
    assert_eq!(loaded.selected_printer(), Some("Zebra"));
    assert_eq!(store.snapshot(), loaded);
    assert!(store.subscriptions().is_armed());
    assert_eq!(backend.listener_count(), EventChannel::ALL.len());
}

#[tokio::test]
async fn bootstrap_selects_default_printer_and_persists_it() {
    let backend = Arc::new(
        MemoryBackend::new().with_printers(vec![printer("A", false), printer("B", true)]),
    );
    let store = store_for(&backend);

    let loaded = store.bootstrap().await.unwrap();
    assert_eq!(loaded.selected_printer(), Some("B"));

    let writes = wait_for_writes(&backend, 1).await;
    assert_eq!(writes[0].selected_printer.as_deref(), Some("B"));
}

#[tokio::test]
async fn bootstrap_falls_back_to_first_printer() {
    let backend = Arc::new(
        MemoryBackend::new().with_printers(vec![printer("A", false), printer("C", false)]),
    );
    let store = store_for(&backend);

    let loaded = store.bootstrap().await.unwrap();
    assert_eq!(loaded.selected_printer(), Some("A"));
}

#[tokio::test]
async fn bootstrap_keeps_existing_selection() {
    let backend = Arc::new(
        MemoryBackend::new()
            .with_printers(vec![printer("A", false), printer("B", true)])
            .with_config(AppConfig::default().with_selected_printer("A")),
    );
    let store = store_for(&backend);

    let loaded = store.bootstrap().await.unwrap();
    assert_eq!(loaded.selected_printer(), Some("A"));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(backend.config_writes().is_empty());
}

#[tokio::test]
async fn bootstrap_without_printers_selects_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_for(&backend);

    let loaded = store.bootstrap().await.unwrap();
    assert_eq!(loaded.selected_printer(), None);
}

#[tokio::test]
async fn bootstrap_failure_is_all_or_nothing() {
    let backend = Arc::new(
        MemoryBackend::new()
            .with_printers(vec![printer("Zebra", true)])
            .with_jobs(vec![job("j1", JobStatus::Completed)])
            .with_running(true),
    );
    backend.fail_next(Command::GetPrintJobs, "backend down");
    let store = store_for(&backend);

    let err = store.bootstrap().await.unwrap_err();
    assert!(err.to_string().contains("backend down"));

    let state = store.snapshot();
    assert!(!state.loading);
    assert!(state.init_error.as_deref().unwrap().contains("backend down"));
    assert!(state.printers.is_empty());
    assert!(state.print_jobs.is_empty());
    assert!(!state.server_running);
    assert_eq!(state.config, AppConfig::default());
    assert!(!store.subscriptions().is_armed());
}

#[tokio::test]
async fn persistence_failure_does_not_fail_bootstrap() {
    let backend = Arc::new(MemoryBackend::new().with_printers(vec![printer("A", false)]));
    backend.fail_next(Command::SetConfig, "disk full");
    let store = store_for(&backend);

    let loaded = store.bootstrap().await.unwrap();
    assert_eq!(loaded.selected_printer(), Some("A"));
    assert_eq!(loaded.init_error, None);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(backend.config_writes().is_empty());
    assert_eq!(store.snapshot().selected_printer(), Some("A"));
}

#[tokio::test]
async fn retry_after_failure_recovers() {
    let backend = Arc::new(MemoryBackend::new().with_running(true));
    backend.fail_next(Command::ListPrinters, "backend down");
    let store = store_for(&backend);

    assert!(store.bootstrap().await.is_err());
    let loaded = store.bootstrap().await.unwrap();

    assert_eq!(loaded.init_error, None);
    assert!(loaded.server_running);
    assert!(store.subscriptions().is_armed());
}

// ---------------------------------------------------------------------------
// Push reconciliation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pushed_jobs_are_upserted() {
    let backend = Arc::new(MemoryBackend::new().with_jobs(vec![job("j1", JobStatus::Printing)]));
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    backend.emit(PushEvent::PrintJob(job("j2", JobStatus::Pending)));
    let state = wait_until(&store, |s| s.print_jobs.len() == 2).await;
    assert_eq!(state.print_jobs[0].id, "j2");

    backend.emit(PushEvent::PrintJob(job("j1", JobStatus::Completed)));
    let state = wait_until(&store, |s| s.print_jobs[1].status == JobStatus::Completed).await;
    assert_eq!(state.print_jobs.len(), 2);
    assert_eq!(state.print_jobs[1].id, "j1");
}

#[tokio::test]
async fn pushed_jobs_respect_history_cap() {
    let history: Vec<PrintJob> = (0..MAX_JOB_HISTORY)
        .rev()
        .map(|i| job(&format!("job-{i}"), JobStatus::Completed))
        .collect();
    let backend = Arc::new(MemoryBackend::new().with_jobs(history));
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    backend.emit(PushEvent::PrintJob(job("job-new", JobStatus::Pending)));
    let state = wait_until(&store, |s| s.print_jobs[0].id == "job-new").await;

    assert_eq!(state.print_jobs.len(), MAX_JOB_HISTORY);
    assert!(!state.print_jobs.iter().any(|j| j.id == "job-0"));
}

#[tokio::test]
async fn server_error_then_recovery() {
    let backend = Arc::new(MemoryBackend::new().with_running(true));
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    backend.emit(PushEvent::ServerError("Failed to bind port 29100".into()));
    let state = wait_until(&store, |s| s.server_error.is_some()).await;
    assert!(!state.server_running);

    backend.emit(PushEvent::ServerStatus(true));
    let state = wait_until(&store, |s| s.server_running).await;
    assert_eq!(state.server_error, None);
}

#[tokio::test]
async fn rebootstrap_does_not_duplicate_handlers() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_for(&backend);

    for _ in 0..3 {
        store.bootstrap().await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        while backend.listener_count() != EventChannel::ALL.len() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("stale push handlers were not torn down");

    backend.emit(PushEvent::PrintJob(job("j1", JobStatus::Pending)));
    let state = wait_until(&store, |s| !s.print_jobs.is_empty()).await;
    assert_eq!(state.print_jobs.len(), 1);
}

#[tokio::test]
async fn shutdown_stops_push_updates() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();
    store.shutdown();

    tokio::time::sleep(Duration::from_millis(20)).await;
    backend.emit(PushEvent::ServerStatus(true));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!store.snapshot().server_running);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restart_failure_surfaces_readable_error() {
    let backend = Arc::new(MemoryBackend::new().with_running(true));
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    backend.fail_next(Command::RestartServer, "port in use");
    store.restart_server().await;

    let state = store.snapshot();
    assert!(state.server_error.as_deref().unwrap().contains("port in use"));
    assert!(!state.server_running);
}

#[tokio::test]
async fn restart_success_clears_previous_error() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    backend.fail_next(Command::RestartServer, "port in use");
    store.restart_server().await;
    assert!(store.snapshot().server_error.is_some());
    // Let the pushed server-error land before restarting again.
    tokio::time::sleep(Duration::from_millis(20)).await;

    store.restart_server().await;
    let state = wait_until(&store, |s| s.server_running).await;
    assert_eq!(state.server_error, None);
    assert_eq!(backend.restart_count(), 1);
}

#[tokio::test]
async fn update_config_persists_then_applies() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    let next = AppConfig {
        port: 9100,
        selected_printer: Some("Zebra".into()),
        auto_start: true,
    };
    store.update_config(next.clone()).await.unwrap();

    assert_eq!(store.snapshot().config, next);
    assert_eq!(backend.config_writes(), vec![next]);
}

#[tokio::test]
async fn rejected_config_leaves_state_alone() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    let invalid = AppConfig {
        port: 0,
        ..AppConfig::default()
    };
    assert!(store.update_config(invalid).await.is_err());

    backend.fail_next(Command::SetConfig, "read-only store");
    let err = store
        .update_config(AppConfig::default().with_selected_printer("Zebra"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("read-only store"));

    assert_eq!(store.snapshot().config, AppConfig::default());
    assert!(backend.config_writes().is_empty());
}

#[tokio::test]
async fn refresh_printers_replaces_list() {
    let backend = Arc::new(MemoryBackend::new().with_printers(vec![printer("A", true)]));
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();
    assert_eq!(store.snapshot().printers.len(), 1);

    backend.set_printers(vec![printer("A", true), printer("B", false)]);
    let printers = store.refresh_printers().await.unwrap();

    assert_eq!(printers.len(), 2);
    assert_eq!(store.snapshot().printers, printers);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_list() {
    let backend = Arc::new(MemoryBackend::new().with_printers(vec![printer("A", true)]));
    let store = store_for(&backend);
    store.bootstrap().await.unwrap();

    backend.fail_next(Command::ListPrinters, "spooler unavailable");
    assert!(store.refresh_printers().await.is_err());
    assert_eq!(store.snapshot().printers, vec![printer("A", true)]);
}
