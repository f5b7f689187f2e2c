//! Typed wrappers around the portal's REST endpoints.
//!
//! Every function takes the shared `HttpClient` and returns an explicit type;
//! responses that do not match are rejected at this boundary.

pub mod admin;
pub mod appointments;
pub mod catalog;
pub mod doctor;
pub mod documents;
pub mod models;

pub use models::*;
