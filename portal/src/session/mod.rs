//! Client-side session persistence.
//!
//! The session is three string entries (access token, refresh token and the
//! serialized user) in a `SessionStorage` backend. Nothing here knows about
//! expiry; the backend signals it with a 401.

pub mod models;
pub mod storage;
pub mod store;

pub use models::{Role, Session, UserProfile};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::SessionStore;
