//! Core `adapters` crate for abstracting the portal's HTTP egress.
//!
//! This crate defines the `Transport` trait, which outlines the single
//! request/response exchange the portal needs from an HTTP stack, and provides
//! the concrete implementations: a `reqwest`-backed transport for real
//! backends and a scripted in-memory transport for tests and offline runs.

pub mod errors;
pub mod http;
pub mod models;
pub mod scripted;

use async_trait::async_trait;

pub use errors::TransportError;
pub use http::ReqwestTransport;
pub use models::{FormPart, HttpRequest, HttpResponse, Method, PartValue, RequestBody};
pub use scripted::ScriptedTransport;

/// Sends one HTTP request and returns the raw response.
///
/// Implementations never interpret status codes: a 401 or 500 is still an
/// `Ok(HttpResponse)`. Only failures to complete the exchange are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
