// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async HTTP client for the local print service.
//
// Endpoints:
//   - GET  /status                              -> ServerStatus
//   - GET  /printers                            -> [Printer]
//   - POST /print?encoding=base64[&printer=..]  -> PrintResult
//
// Submissions always travel as base64 text so that 8-bit ZPL survives any
// text-only hop between the caller and the service.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use dazzle_core::config::ClientOptions;
use dazzle_core::error::{DazzleError, Result};
use dazzle_core::types::{PrintOptions, PrintResult, Printer, ServerStatus};

use crate::encoding::{Payload, encode_base64};
use crate::probe::Reachability;

/// Client bound to one print service address.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DazzleClient {
    http: Client,
    base_url: Url,
}

impl DazzleClient {
    /// Create a client for the service described by `options`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Self::with_base_url(&options.base_url())
    }

    /// Create a client for an explicit base URL such as `http://127.0.0.1:29100`.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DazzleError::InvalidUrl(format!("'{base_url}': {e}")))?;
        let http = Client::builder().build().map_err(network_error)?;
        Ok(Self { http, base_url })
    }

    /// The service address this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DazzleError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Check whether anything is answering at the service address.
    ///
    /// Any response counts as alive, whatever its status; only a failed
    /// request (nothing listening, DNS, reset) reports `false`. The response
    /// is never read.
    pub async fn is_running(&self) -> bool {
        let url = match self.endpoint("/status") {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "probe skipped");
                return false;
            }
        };

        match self.http.get(url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %error_chain(&e), "probe failed");
                false
            }
        }
    }

    /// Server status and version.
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn status(&self) -> Result<ServerStatus> {
        let res = self.get(self.endpoint("/status")?).await?;
        read_json(res).await
    }

    /// Printers installed on the host running the service.
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn printers(&self) -> Result<Vec<Printer>> {
        let res = self.get(self.endpoint("/printers")?).await?;
        let printers: Vec<Printer> = read_json(res).await?;
        debug!(count = printers.len(), "listed printers");
        Ok(printers)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        let res = self.http.get(url).send().await.map_err(network_error)?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            return Err(DazzleError::Service {
                status,
                message: format!("Server error: {status}"),
            });
        }
        Ok(res)
    }

    /// Submit one payload.
    ///
    /// Uses the service's selected printer unless `options.printer` is set.
    #[instrument(skip(self, payload, options), fields(printer = ?options.printer))]
    pub async fn print(
        &self,
        payload: impl Into<Payload>,
        options: &PrintOptions,
    ) -> Result<PrintResult> {
        let payload = payload.into();
        let bytes = payload.to_bytes();

        let mut url = self.endpoint("/print")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("encoding", "base64");
            if let Some(printer) = options.printer.as_deref().filter(|p| !p.is_empty()) {
                query.append_pair("printer", printer);
            }
        }

        debug!(bytes = bytes.len(), "submitting payload");
        let res = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(encode_base64(&bytes))
            .send()
            .await
            .map_err(network_error)?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("Print failed: {status}")
            } else {
                body
            };
            warn!(status, %message, "print rejected");
            return Err(DazzleError::Service { status, message });
        }

        let result: PrintResult = read_json(res).await?;
        info!(job_id = %result.job_id, bytes = bytes.len(), "print accepted");
        Ok(result)
    }

    /// Submit several payloads in order.
    ///
    /// Each submission is awaited before the next one starts, so the printer
    /// sees the payloads in exactly the given order. The first failure ends
    /// the batch: later payloads are never sent and the error is returned
    /// as-is. Labels printed before the failure are only reported in the log.
    #[instrument(skip(self, payloads, options), fields(printer = ?options.printer))]
    pub async fn print_many<I, P>(&self, payloads: I, options: &PrintOptions) -> Result<Vec<PrintResult>>
    where
        I: IntoIterator<Item = P>,
        P: Into<Payload>,
    {
        let mut results = Vec::new();
        for (index, payload) in payloads.into_iter().enumerate() {
            match self.print(payload, options).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        index,
                        already_printed = results.len(),
                        error = %e,
                        "batch aborted"
                    );
                    return Err(e);
                }
            }
        }
        Ok(results)
    }

    /// Download a payload from `source` and submit it.
    #[instrument(skip(self, options), fields(printer = ?options.printer))]
    pub async fn print_url(&self, source: &str, options: &PrintOptions) -> Result<PrintResult> {
        let url = Url::parse(source)
            .map_err(|e| DazzleError::InvalidUrl(format!("'{source}': {e}")))?;

        let res = self.http.get(url).send().await.map_err(|e| DazzleError::Fetch {
            url: source.to_owned(),
            status: None,
            message: error_chain(&e),
        })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("Fetch failed: {status}")
            } else {
                body
            };
            return Err(DazzleError::Fetch {
                url: source.to_owned(),
                status: Some(status),
                message,
            });
        }

        let bytes = res.bytes().await.map_err(|e| DazzleError::Fetch {
            url: source.to_owned(),
            status: None,
            message: error_chain(&e),
        })?;
        debug!(bytes = bytes.len(), "fetched remote payload");

        self.print(bytes.to_vec(), options).await
    }
}

#[async_trait]
impl Reachability for DazzleClient {
    async fn probe(&self) -> bool {
        self.is_running().await
    }
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let body = res.bytes().await.map_err(network_error)?;
    Ok(serde_json::from_slice(&body)?)
}

fn network_error(err: reqwest::Error) -> DazzleError {
    DazzleError::Network(error_chain(&err))
}

/// Render an error with its full source chain ("a: b: c").
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
