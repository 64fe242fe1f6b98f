// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP transport for SOAP requests.
//!
//! [`SoapTransport`] is the seam between the dispatcher and the network. The
//! default [`HttpTransport`] is a blocking `reqwest` client; tests and
//! embedders can plug their own.

use crate::error::{Error, Result};
use std::time::Duration;

/// Raw HTTP exchange result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one SOAP envelope and returns the raw HTTP response.
///
/// Implementations report network-level problems (refused, unreachable,
/// timed out) as [`Error::ConnectionFailure`]. Any HTTP status, including
/// errors, is returned as a response so the dispatcher can look for a SOAP
/// fault in the body first.
pub trait SoapTransport: Send + Sync {
    /// POST `envelope` to `endpoint` with the SOAP 1.2 `action`.
    fn post(&self, endpoint: &str, action: &str, envelope: String) -> Result<HttpResponse>;
}

/// Blocking HTTP/1.1 transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::UnexpectedFailure(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timeout: {}", err)
    } else if err.is_connect() {
        format!("connect: {}", err)
    } else {
        err.to_string()
    }
}

impl SoapTransport for HttpTransport {
    fn post(&self, endpoint: &str, action: &str, envelope: String) -> Result<HttpResponse> {
        let content_type = format!(
            "application/soap+xml; charset=utf-8; action=\"{}\"",
            action
        );
        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(envelope)
            .send()
            .map_err(|e| {
                log::debug!("[SOAP] POST {} failed: {}", endpoint, e);
                Error::ConnectionFailure(describe(&e))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::ConnectionFailure(describe(&e)))?;

        log::trace!("[SOAP] POST {} -> {} ({} bytes)", endpoint, status, body.len());
        Ok(HttpResponse { status, body })
    }
}
