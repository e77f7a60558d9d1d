// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Dazzle.

use thiserror::Error;

/// Top-level error type for all Dazzle operations.
#[derive(Debug, Error)]
pub enum DazzleError {
    // -- Print service --
    /// The print service answered with a non-success status.
    #[error("{message}")]
    Service { status: u16, message: String },

    /// The request never produced a response (DNS, refused, reset...).
    #[error("network error: {0}")]
    Network(String),

    /// A remote payload could not be fetched before submission.
    ///
    /// `status` is absent when no response arrived at all.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    // -- Backend collaborator --
    #[error("backend command failed: {0}")]
    Backend(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DazzleError {
    /// HTTP status carried by a service error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DazzleError>;
