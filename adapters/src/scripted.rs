//! Scripted in-memory implementation of the `Transport` trait.
//!
//! Responses are queued up front and handed out in order; every request that
//! reaches the transport is recorded so callers can assert on what was sent.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::models::{HttpRequest, HttpResponse};
use crate::Transport;

enum Scripted {
    Response(HttpResponse),
    Failure(TransportError),
}

#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push(&self, response: HttpResponse) -> &Self {
        self.lock_queue().push_back(Scripted::Response(response));
        self
    }

    pub fn push_json(&self, status: u16, value: serde_json::Value) -> &Self {
        self.push(HttpResponse::json(status, &value))
    }

    pub fn push_failure(&self, error: TransportError) -> &Self {
        self.lock_queue().push_back(Scripted::Failure(error));
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests().pop()
    }

    pub fn remaining(&self) -> usize {
        self.lock_queue().len()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        // A poisoned queue only means a test panicked mid-push; the data is still usable.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method.to_string();
        let url = request.url.clone();

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.lock_queue().pop_front();

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure(error)) => Err(error),
            None => Err(TransportError::UnscriptedError { method, url }),
        }
    }
}
