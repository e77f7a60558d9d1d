// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Dazzle control panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the job history kept in memory.
pub const MAX_JOB_HISTORY: usize = 100;

/// A printer known to the host machine.
///
/// Snapshots are replaced wholesale on refresh, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printer {
    /// Stable, unique printer name.
    pub name: String,
    pub is_default: bool,
}

/// Lifecycle states of a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet handed to the spooler.
    Pending,
    /// Being written to the printer.
    Printing,
    Completed,
    /// See the job's `error` field.
    Failed,
}

/// One entry of the job history.
///
/// Only ever replaced as a whole record, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: String,
    pub printer: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub status: JobStatus,
    /// First bytes of the payload, lossily decoded for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zpl_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PrintJob {
    /// Submission time as a UTC timestamp (`None` if out of range).
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
}

/// Body of a successful `POST /print`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResult {
    pub job_id: String,
}

/// Per-submission options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Override the service's selected printer for this job.
    pub printer: Option<String>,
}

impl PrintOptions {
    pub fn with_printer(printer: impl Into<String>) -> Self {
        Self {
            printer: Some(printer.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_is_lowercase_on_the_wire() {
        let json = serde_json::to_string(&JobStatus::Completed).expect("serialize");
        assert_eq!(json, r#""completed""#);
        let back: JobStatus = serde_json::from_str(r#""pending""#).expect("parse");
        assert_eq!(back, JobStatus::Pending);
    }

    #[test]
    fn optional_job_fields_may_be_absent() {
        let job: PrintJob = serde_json::from_str(
            r#"{"id":"job1","printer":"Zebra","timestamp":1700000000,"status":"printing"}"#,
        )
        .expect("parse");
        assert!(job.zpl_preview.is_none());
        assert!(job.error.is_none());

        let json = serde_json::to_string(&job).expect("serialize");
        assert!(!json.contains("zpl_preview"));
    }

    #[test]
    fn submitted_at_converts_seconds() {
        let job = PrintJob {
            id: "abc123".into(),
            printer: "Zebra ZD420".into(),
            timestamp: 1_700_000_000,
            status: JobStatus::Completed,
            zpl_preview: Some("^XA^FO50,50^FDHello^FS^XZ".into()),
            error: None,
        };
        let at = job.submitted_at().expect("in range");
        assert_eq!(at.timestamp(), 1_700_000_000);
    }
}
