//! The persisted session: access token, refresh token and signed-in user,
//! kept under three storage keys and always written or removed together.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use super::models::{Session, UserProfile};
use super::storage::{MemoryStorage, SessionStorage};
use crate::errors::{PortalError, Result};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Sole owner of the persisted session.
///
/// Writes come only from the auth flow and from the HTTP client's 401 handler;
/// last write wins. Clones share the same backing storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    writes: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn store(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user)
            .map_err(|err| PortalError::Storage(format!("Cannot serialize user: {}", err)))?;
        let _writes = self.lock_writes();
        self.storage.set(ACCESS_TOKEN_KEY, &session.access_token)?;
        self.storage.set(REFRESH_TOKEN_KEY, &session.refresh_token)?;
        self.storage.set(USER_KEY, &user)?;
        Ok(())
    }

    /// Removes all three keys, attempting each even if an earlier one fails.
    pub fn clear(&self) -> Result<()> {
        let _writes = self.lock_writes();
        let mut first_error = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!("Failed to remove session key {}: {}", key, err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The access token used to sign requests. Unreadable storage counts as no token.
    pub fn read_token(&self) -> Option<String> {
        match self.storage.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!("Failed to read access token: {}", err);
                None
            }
        }
    }

    pub fn read_refresh_token(&self) -> Option<String> {
        self.storage
            .get(REFRESH_TOKEN_KEY)
            .ok()
            .flatten()
            .filter(|t| !t.is_empty())
    }

    pub fn read_user(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!("Failed to read stored user: {}", err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!("Ignoring malformed stored user: {}", err);
                None
            }
        }
    }

    /// The full session, only if both a token and a valid user are stored.
    pub fn load(&self) -> Option<Session> {
        let access_token = self.read_token()?;
        let user = self.read_user()?;
        Some(Session {
            access_token,
            refresh_token: self.read_refresh_token().unwrap_or_default(),
            user,
        })
    }

    /// Replaces the tokens after a refresh, keeping the stored user.
    ///
    /// Only applies to the session that `previous_token` belongs to. If that
    /// session was cleared or replaced while the refresh was in flight, nothing
    /// is written and `Unauthorized` is returned.
    pub fn update_tokens(
        &self,
        previous_token: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<()> {
        let _writes = self.lock_writes();
        let current = self.read_token();
        if current.as_deref() != Some(previous_token) || self.read_user().is_none() {
            warn!("Session ended during token refresh, discarding new token");
            return Err(PortalError::Unauthorized(
                "Session ended before the token refresh completed".to_string(),
            ));
        }
        self.storage.set(ACCESS_TOKEN_KEY, access_token)?;
        if let Some(refresh) = refresh_token {
            self.storage.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_empty(&self) -> bool {
        [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY]
            .iter()
            .all(|key| matches!(self.storage.get(key), Ok(None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::Role;
    use crate::session::storage::FileStorage;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: "R1".to_string(),
            user: UserProfile {
                id: "u1".to_string(),
                name: None,
                username: None,
                email: Some("a@b.com".to_string()),
                phone: None,
                role: Role::Patient,
                avatar: None,
                permissions: None,
                department: None,
            },
        }
    }

    #[test]
    fn store_then_read_returns_same_token() {
        let store = SessionStore::in_memory();
        store.store(&session("T1")).unwrap();
        assert_eq!(store.read_token(), Some("T1".to_string()));
        assert_eq!(store.load().unwrap().user.role, Role::Patient);
    }

    #[test]
    fn clear_then_read_returns_nothing() {
        let store = SessionStore::in_memory();
        store.store(&session("T1")).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read_token(), None);
        assert!(store.load().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let store = SessionStore::in_memory();
        store.store(&session("T1")).unwrap();
        store.store(&session("T2")).unwrap();
        assert_eq!(store.read_token(), Some("T2".to_string()));
    }

    #[test]
    fn malformed_user_means_no_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACCESS_TOKEN_KEY, "T1").unwrap();
        storage.set(USER_KEY, "{\"id\":\"u1\",\"role\":\"wizard\"}").unwrap();

        let store = SessionStore::new(storage);
        assert!(store.read_user().is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn update_tokens_keeps_user() {
        let store = SessionStore::in_memory();
        store.store(&session("T1")).unwrap();
        store.update_tokens("T1", "T2", None).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token, "T2");
        assert_eq!(loaded.refresh_token, "R1");
        assert_eq!(loaded.user.id, "u1");
    }

    #[test]
    fn update_tokens_after_clear_writes_nothing() {
        let store = SessionStore::in_memory();
        store.store(&session("T1")).unwrap();
        store.clear().unwrap();

        let err = store.update_tokens("T1", "T2", Some("R2")).unwrap_err();
        assert!(matches!(err, PortalError::Unauthorized(_)));
        assert_eq!(store.read_token(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn update_tokens_for_a_replaced_session_is_ignored() {
        let store = SessionStore::in_memory();
        store.store(&session("T1")).unwrap();
        store.store(&session("T5")).unwrap();

        assert!(store.update_tokens("T1", "T2", None).is_err());
        assert_eq!(store.read_token(), Some("T5".to_string()));
    }

    #[test]
    fn file_backed_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        SessionStore::new(Arc::new(FileStorage::new(&path)))
            .store(&session("T1"))
            .unwrap();
        let reopened = SessionStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(reopened.read_token(), Some("T1".to_string()));
    }
}
