//! Shared blocking HTTP plumbing for the hosted oracles.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{OracleError, Result, TabulaxError};

/// Build a blocking client with the per-call timeout applied.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TabulaxError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// JSON content-type headers plus any extra (name, value) pairs.
pub(crate) fn json_headers(extra: &[(&'static str, &str)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in extra {
        headers.insert(
            *name,
            HeaderValue::from_str(value)
                .map_err(|e| TabulaxError::Config(format!("Invalid header {}: {}", name, e)))?,
        );
    }
    Ok(headers)
}

/// POST a JSON body and decode the JSON reply.
pub(crate) fn post_json(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    body: &Value,
    timeout: Duration,
) -> std::result::Result<Value, OracleError> {
    trace!(url, body = %body, "oracle request");
    let response = client
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .map_err(|e| OracleError::from_reqwest(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        debug!(status = status.as_u16(), "oracle returned error status");
        return Err(OracleError::Status {
            code: status.as_u16(),
            body,
        });
    }

    let reply = response
        .json::<Value>()
        .map_err(|e| OracleError::MalformedReply(e.to_string()))?;
    trace!(url, reply = %reply, "oracle reply");
    Ok(reply)
}

/// Require non-blank reply text.
pub(crate) fn non_empty(text: Option<String>) -> std::result::Result<String, OracleError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(OracleError::EmptyReply),
    }
}
