// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application and client configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DazzleError, Result};

/// Default port of the local print service.
pub const DEFAULT_PORT: u16 = 29100;

/// Default host of the local print service.
pub const DEFAULT_HOST: &str = "localhost";

/// Settings owned by the backend collaborator.
///
/// The panel never patches this in place: callers build the complete next
/// value and hand it over as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the print service binds on 127.0.0.1.
    pub port: u16,
    /// Printer used when a submission carries no override.
    pub selected_printer: Option<String>,
    /// Launch the service at login.
    #[serde(default)]
    pub auto_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            selected_printer: None,
            auto_start: false,
        }
    }
}

impl AppConfig {
    /// Reject values the service cannot bind.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(DazzleError::InvalidConfig(
                "port must be between 1 and 65535".into(),
            ));
        }
        Ok(())
    }

    /// Next configuration value with a different printer selection.
    pub fn with_selected_printer(&self, printer: impl Into<String>) -> Self {
        Self {
            selected_printer: Some(printer.into()),
            ..self.clone()
        }
    }
}

/// URL scheme used to reach the print service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = DazzleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(DazzleError::InvalidConfig(format!(
                "unknown protocol '{other}'"
            ))),
        }
    }
}

/// Where the print service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            protocol: Protocol::Http,
        }
    }
}

impl ClientOptions {
    /// Defaults overlaid with `DAZZLE_HOST`, `DAZZLE_PORT` and `DAZZLE_PROTOCOL`.
    ///
    /// Values that fail to parse are logged and skipped.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();

        if let Some(host) = lookup("DAZZLE_HOST").filter(|h| !h.is_empty()) {
            opts.host = host;
        }
        if let Some(raw) = lookup("DAZZLE_PORT") {
            match raw.parse::<u16>() {
                Ok(port) if port != 0 => opts.port = port,
                _ => warn!(value = %raw, "ignoring invalid DAZZLE_PORT"),
            }
        }
        if let Some(raw) = lookup("DAZZLE_PROTOCOL") {
            match raw.parse::<Protocol>() {
                Ok(protocol) => opts.protocol = protocol,
                Err(e) => warn!(error = %e, "ignoring invalid DAZZLE_PROTOCOL"),
            }
        }

        opts
    }

    /// `protocol://host:port`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
