//! CarePortal client core.
//!
//! A typed client for the CarePortal REST API: session persistence, a bearer
//! token HTTP wrapper with forced logout on 401, the sign-in state machine,
//! fail-closed permission checks, and the booking, document, check-in,
//! patient search and analytics features built on top of them.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod features;
pub mod http;
pub mod navigation;
pub mod services;
pub mod session;

pub use app::Portal;
pub use auth::{AuthFlow, AuthState, PermissionGate};
pub use config::PortalConfig;
pub use errors::{PortalError, Result};
pub use http::HttpClient;
pub use navigation::{Navigator, Route};
pub use services::{PortalQueries, QueryClient, QueryKey};
pub use session::{Role, Session, SessionStore, UserProfile};
