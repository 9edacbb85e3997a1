//! HTTP client infrastructure.

mod client;

pub use client::{ApiClient, HttpClient, HttpClientBuilder};
