// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the control panel.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the panel presents it.

use crate::error::DazzleError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Service restarting, connection blip. Trying again may work.
    Transient,
    /// User must do something (start the service, pick a printer, fix a port).
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub retriable: bool,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `DazzleError` into a `HumanError`.
pub fn humanize_error(err: &DazzleError) -> HumanError {
    match err {
        DazzleError::Service { status, message } => humanize_service_error(*status, message),

        DazzleError::Network(detail) => humanize_network_error(detail),

        DazzleError::Fetch { url, message, .. } => HumanError {
            message: "The label file couldn't be downloaded.".into(),
            suggestion: format!("Check that {url} is reachable. ({message})"),
            retriable: true,
            severity: Severity::Transient,
        },

        DazzleError::InvalidUrl(detail) => HumanError {
            message: "That address doesn't look right.".into(),
            suggestion: format!("Check the address and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DazzleError::InvalidPayload(detail) => HumanError {
            message: "The label data was empty or damaged.".into(),
            suggestion: format!("Check the label that was sent. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        DazzleError::Backend(detail) => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("port") && (lower.contains("in use") || lower.contains("bind")) {
                HumanError {
                    message: "The print server couldn't start because its port is taken.".into(),
                    suggestion: format!("Choose a different port or close the other program. ({detail})"),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "The print server had a problem.".into(),
                    suggestion: format!("Try restarting the print server. ({detail})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DazzleError::InvalidConfig(detail) => HumanError {
            message: "That setting isn't valid.".into(),
            suggestion: format!("Fix the value and save again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DazzleError::Serialization(_) => HumanError {
            message: "The print server sent something we didn't understand.".into(),
            suggestion: "Make sure the panel and the print server are the same version.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_service_error(status: u16, detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("no printer selected") {
        HumanError {
            message: "No printer selected.".into(),
            suggestion: "Choose a printer in the panel, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("empty zpl") || lower.contains("invalid base64") {
        HumanError {
            message: "The label data was empty or damaged.".into(),
            suggestion: format!("Check the label that was sent. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else if status >= 500 {
        HumanError {
            message: "The printer couldn't print this label.".into(),
            suggestion: format!("Check the printer is on and has labels loaded. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "The print server rejected the request.".into(),
            suggestion: format!("{detail} (HTTP {status})"),
            retriable: false,
            severity: Severity::Permanent,
        }
    }
}

fn humanize_network_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") || lower.contains("timeout") {
        HumanError {
            message: "The print server didn't respond in time.".into(),
            suggestion: "It may be busy. Wait a moment and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("connection refused") || lower.contains("connect") {
        HumanError {
            message: "The print server isn't running.".into(),
            suggestion: "Start Dazzle (or press Start in the panel), then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "We couldn't reach the print server.".into(),
            suggestion: format!("Try again. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
