//! Read-through cache for query results.
//!
//! Entries are keyed by a `QueryKey` and hold the first successful result for
//! that key until they are invalidated. Concurrent fetches of the same key
//! share one in-flight request. A failed fetch leaves the entry empty, so the
//! next caller tries again.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::{PortalError, Result};

/// Ordered list of string segments, e.g. `["documents", "list"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Appends the JSON form of `params` as a trailing segment. `None` fields
    /// are dropped by the params' own serializer, so equal filters give equal keys.
    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        let segment = serde_json::to_string(params).unwrap_or_else(|err| {
            warn!("Unserializable query params for {}: {}", self, err);
            String::from("?")
        });
        self.0.push(segment);
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(segments: [&str; N]) -> Self {
        QueryKey::new(segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

type CachedValue = Arc<dyn Any + Send + Sync>;
type Entry = Arc<OnceCell<CachedValue>>;

#[derive(Clone, Default)]
pub struct QueryClient {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or runs `fetcher` to fill it.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let entry = self.entry(&key);
        let value = entry
            .get_or_try_init(|| async {
                debug!("Query {} is not cached, fetching", key);
                let value = fetcher().await?;
                Ok::<CachedValue, PortalError>(Arc::new(value))
            })
            .await?;

        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| PortalError::Decode {
                endpoint: key.to_string(),
                reason: String::from("cached value has a different type"),
            })
    }

    /// Cached value for `key`, without fetching.
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.lock().get(key).cloned()?;
        entry.get()?.downcast_ref::<T>().cloned()
    }

    pub fn is_cached(&self, key: &QueryKey) -> bool {
        self.lock()
            .get(key)
            .map(|entry| entry.initialized())
            .unwrap_or(false)
    }

    /// Drops every entry whose key starts with `prefix`. In-flight fetches
    /// still resolve for their callers but are no longer cached.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = before - entries.len();
        debug!("Invalidated {} queries under {}", dropped, prefix);
        dropped
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn entry(&self, key: &QueryKey) -> Entry {
        self.lock().entry(key.clone()).or_default().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn prefix_matching_is_segment_wise() {
        let list = QueryKey::from(["documents", "list"]);
        assert!(list.starts_with(&QueryKey::from(["documents"])));
        assert!(!list.starts_with(&QueryKey::from(["doc"])));
        assert!(list.starts_with(&QueryKey::new(Vec::<String>::new())));
    }

    #[test]
    fn params_become_a_segment() {
        #[derive(Serialize)]
        struct Page {
            page: u32,
        }
        let key = QueryKey::from(["doctorPending"]).with_params(&Page { page: 2 });
        assert_eq!(key.segments(), ["doctorPending", r#"{"page":2}"#]);
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let client = QueryClient::new();
        let calls = AtomicUsize::new(0);
        let key = QueryKey::from(["cities"]);

        for _ in 0..2 {
            let value: Vec<String> = client
                .fetch(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![String::from("Pune")])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["Pune"]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.peek::<Vec<String>>(&key), Some(vec![String::from("Pune")]));
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_call() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::from(["documents", "list"]);

        let fetch = || {
            let calls = calls.clone();
            client.fetch(key.clone(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(7u32)
            })
        };
        let (a, b) = tokio::join!(fetch(), fetch());
        assert_eq!((a.unwrap(), b.unwrap()), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let client = QueryClient::new();
        let key = QueryKey::from(["adminDashboard"]);

        let err = client
            .fetch::<u32, _, _>(key.clone(), || async {
                Err(PortalError::Api {
                    status: 503,
                    message: "down".into(),
                })
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(!client.is_cached(&key));

        let value = client.fetch(key.clone(), || async { Ok(1u32) }).await.unwrap();
        assert_eq!(value, 1);
        assert!(client.is_cached(&key));
    }

    #[tokio::test]
    async fn invalidate_drops_keys_under_prefix() {
        let client = QueryClient::new();
        for key in [
            QueryKey::from(["documents", "list"]),
            QueryKey::from(["documents", "detail", "d1"]),
            QueryKey::from(["cities"]),
        ] {
            client.fetch(key, || async { Ok(0u8) }).await.unwrap();
        }

        assert_eq!(client.invalidate(&QueryKey::from(["documents"])), 2);
        assert!(client.is_cached(&QueryKey::from(["cities"])));
        assert!(!client.is_cached(&QueryKey::from(["documents", "list"])));
    }

    #[tokio::test]
    async fn type_mismatch_is_reported() {
        let client = QueryClient::new();
        let key = QueryKey::from(["cities"]);
        client.fetch(key.clone(), || async { Ok(1u32) }).await.unwrap();

        let err = client
            .fetch::<String, _, _>(key, || async { Ok(String::new()) })
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Decode { .. }));
    }
}
