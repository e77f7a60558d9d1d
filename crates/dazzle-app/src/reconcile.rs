// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folding push events into panel state.

use tracing::{debug, warn};

use dazzle_bridge::PushEvent;
use dazzle_core::PrintJob;
use dazzle_core::types::MAX_JOB_HISTORY;

use crate::state::PanelState;

/// Apply one push event.
pub fn apply(state: &mut PanelState, event: PushEvent) {
    match event {
        PushEvent::PrintJob(job) => apply_job_update(&mut state.print_jobs, job),
        PushEvent::ServerStatus(running) => apply_server_status(state, running),
        PushEvent::ServerError(message) => apply_server_error(state, message),
    }
}

/// Upsert a job by id.
///
/// A known id is replaced where it sits; a new id goes to the front. The
/// list is then cut back to `MAX_JOB_HISTORY`, dropping the oldest.
pub fn apply_job_update(jobs: &mut Vec<PrintJob>, job: PrintJob) {
    let existing = jobs.iter().position(|j| j.id == job.id);
    match existing {
        Some(idx) => {
            debug!(job_id = %job.id, status = ?job.status, "job updated");
            jobs[idx] = job;
        }
        None => {
            debug!(job_id = %job.id, status = ?job.status, "job added");
            jobs.insert(0, job);
        }
    }
    jobs.truncate(MAX_JOB_HISTORY);
}

/// Record the server's running flag. Seeing it running clears any error.
pub fn apply_server_status(state: &mut PanelState, running: bool) {
    state.server_running = running;
    if running {
        state.server_error = None;
    }
}

/// Record a server failure. A failed server is not running.
pub fn apply_server_error(state: &mut PanelState, message: String) {
    warn!(error = %message, "print server reported an error");
    state.server_error = Some(message);
    state.server_running = false;
}
