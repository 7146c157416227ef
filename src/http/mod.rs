//! HTTP client module with API error classification.

mod client;

pub use client::{HttpClient, HttpError};
