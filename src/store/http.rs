// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking HTTP transport to the engine.
//!
//! Reads are `GET <host>` with a JSON body, writes `POST <host>`, deletes
//! `DELETE <host>` and statistics `GET <host>/_stat`.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::wire::{self, DeleteRequest, FindRequest, FindResponse, WriteRequest};
use super::Engine;
use crate::errors::StoreError;

/// Engine reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    host: String,
}

impl HttpEngine {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let host = host.into();
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            StoreError::Transport {
                host: host.clone(),
                message: format!("failed to build HTTP client: {err}"),
                source: Some(err),
            }
        })?;
        Ok(Self { client, host })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn stat_url(&self) -> String {
        format!("{}/_stat", self.host.trim_end_matches('/'))
    }

    fn send_json<T: Serialize>(&self, method: Method, body: &T) -> Result<Value, StoreError> {
        let builder = self.client.request(method.clone(), &self.host).json(body);
        debug!(%method, host = %self.host, "engine request");
        self.execute(builder)
    }

    fn execute(&self, builder: RequestBuilder) -> Result<Value, StoreError> {
        let response = builder.send().map_err(|err| self.transport(err))?;
        let status = response.status();
        let text = response.text().map_err(|err| self.transport(err))?;

        match serde_json::from_str::<Value>(&text) {
            // An exception payload wins over the status code.
            Ok(body) if body.get("exception").is_some() => wire::ensure_accepted(body),
            _ if !status.is_success() => Err(StoreError::Transport {
                host: self.host.clone(),
                message: format!("HTTP {status}: {}", snippet(&text)),
                source: None,
            }),
            Ok(body) => Ok(body),
            Err(err) => Err(StoreError::Decode {
                message: format!("{err} in response body: {}", snippet(&text)),
                source: Some(err),
            }),
        }
    }

    fn transport(&self, err: reqwest::Error) -> StoreError {
        StoreError::Transport {
            host: self.host.clone(),
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl Engine for HttpEngine {
    fn find(&self, request: &FindRequest<'_>) -> Result<FindResponse, StoreError> {
        let body = self.send_json(Method::GET, request)?;
        Ok(serde_json::from_value(body)?)
    }

    fn index(&self, request: &WriteRequest<'_>) -> Result<Value, StoreError> {
        self.send_json(Method::POST, request)
    }

    fn delete(&self, request: &DeleteRequest<'_>) -> Result<Value, StoreError> {
        self.send_json(Method::DELETE, request)
    }

    fn stat(&self) -> Result<Value, StoreError> {
        debug!(host = %self.host, "engine stat");
        self.execute(self.client.get(self.stat_url()))
    }
}

fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
