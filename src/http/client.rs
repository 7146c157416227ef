//! Thin JSON client over reqwest.
//!
//! The selection core performs no I/O of its own; providers use this client
//! to page through release and tag listings. Transient-failure handling is
//! deliberately absent: retries and backoff belong to the environment
//! invoking the tool.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Errors that callers are expected to react to rather than report verbatim.
#[derive(Debug)]
pub enum HttpError {
    /// Resource not found (HTTP 404): usually "no such repository".
    NotFound(String),
    /// Rate limit exceeded (HTTP 403/429).
    RateLimited(String),
    /// Other client errors that will not succeed on a second attempt.
    Client(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::NotFound(msg) => write!(f, "Not found: {}", msg),
            HttpError::RateLimited(msg) => {
                write!(f, "Rate limit exceeded: {}. Try again later.", msg)
            }
            HttpError::Client(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// JSON-over-HTTP client shared by all providers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let response = classify_status(response, url)?;

        response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")
    }

    /// Performs a GET request with query parameters and deserializes the
    /// JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        let response = classify_status(response, url)?;

        response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")
    }
}

/// Maps error statuses to [`HttpError`] so callers can downcast and react.
fn classify_status(response: Response, url: &str) -> Result<Response> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(HttpError::NotFound(url.to_string()).into()),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
            Err(HttpError::RateLimited(url.to_string()).into())
        }
        status if status.is_client_error() => {
            Err(HttpError::Client(format!("{} for {}", status, url)).into())
        }
        _ => response
            .error_for_status()
            .context("Request returned an error status"),
    }
}
