//! HTTP client wrapper sitting between the typed API and the transport.

pub mod client;

pub use client::HttpClient;
