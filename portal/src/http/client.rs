//! The portal's HTTP wrapper: bearer-token injection, 401 handling and
//! JSON decoding on top of an `adapters::Transport`.

use std::sync::Arc;

use adapters::{FormPart, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{PortalError, Result};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

/// Single point of egress for every REST call the portal makes.
///
/// Attaches the stored bearer token to outgoing requests and turns a 401 into
/// a forced logout: the session is cleared and the navigator sent to the login
/// route before the error reaches the caller. No retries.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    session: SessionStore,
    navigator: Navigator,
    on_unauthorized: Option<UnauthorizedHook>,
}

/// Runs on the 401 path, after the session is cleared and before the error
/// is returned.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

impl HttpClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        session: SessionStore,
        navigator: Navigator,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            navigator,
            on_unauthorized: None,
        }
    }

    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = HttpRequest::new(Method::Get, self.url(path));
        self.send_json(path, request).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = HttpRequest::new(Method::Get, self.url(path)).with_query(query_pairs(query)?);
        self.send_json(path, request).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request =
            HttpRequest::new(Method::Post, self.url(path)).with_body(json_body(body)?);
        self.send_json(path, request).await
    }

    /// Like `post`, also returning the status of the successful response.
    pub async fn post_with_status<T, B>(&self, path: &str, body: &B) -> Result<(u16, T)>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request =
            HttpRequest::new(Method::Post, self.url(path)).with_body(json_body(body)?);
        let response = self.execute(request).await?;
        Ok((response.status, decode(path, &response)?))
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = HttpRequest::new(Method::Post, self.url(path));
        self.send_json(path, request).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = HttpRequest::new(Method::Put, self.url(path)).with_body(json_body(body)?);
        self.send_json(path, request).await
    }

    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = HttpRequest::new(Method::Put, self.url(path));
        self.send_json(path, request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = HttpRequest::new(Method::Delete, self.url(path));
        self.send_json(path, request).await
    }

    pub async fn upload<T: DeserializeOwned>(&self, path: &str, parts: Vec<FormPart>) -> Result<T> {
        let request =
            HttpRequest::new(Method::Post, self.url(path)).with_body(RequestBody::Multipart(parts));
        self.send_json(path, request).await
    }

    /// Fetches a raw body, e.g. a document download.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let request = HttpRequest::new(Method::Get, self.url(path));
        Ok(self.execute(request).await?.body)
    }

    async fn send_json<T: DeserializeOwned>(&self, path: &str, request: HttpRequest) -> Result<T> {
        let response = self.execute(request).await?;
        decode(path, &response)
    }

    async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if !matches!(request.body, RequestBody::Multipart(_)) {
            request = request.with_header("Content-Type", "application/json");
        }
        if let Some(token) = self.session.read_token() {
            request = request.with_header("Authorization", format!("Bearer {}", token));
        }

        debug!("{} {}", request.method, request.url);
        let method = request.method;
        let url = request.url.clone();
        let response = self.transport.send(request).await?;

        if response.status == 401 {
            warn!("{} {} answered 401, clearing session", method, url);
            if let Err(err) = self.session.clear() {
                warn!("Failed to clear session after 401: {}", err);
            }
            if let Some(hook) = &self.on_unauthorized {
                hook();
            }
            self.navigator.navigate(Route::Auth);
            return Err(PortalError::Unauthorized(error_message(&response)));
        }

        if !response.is_success() {
            debug!("{} {} failed with {}", method, url, response.status);
            return Err(PortalError::Api {
                status: response.status,
                message: error_message(&response),
            });
        }

        Ok(response)
    }
}

/// Decodes a success body into `T`.
///
/// An empty body decodes as JSON `null`, or as `{}` for types that need an object.
fn decode<T: DeserializeOwned>(endpoint: &str, response: &HttpResponse) -> Result<T> {
    let result: std::result::Result<T, serde_json::Error> =
        if response.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_str("null").or_else(|_| serde_json::from_str("{}"))
        } else {
            serde_json::from_slice(&response.body)
        };
    result.map_err(|err| PortalError::Decode {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })
}

/// Best human-readable message in an error response.
fn error_message(response: &HttpResponse) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(|m| m.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }
    let text = response.text();
    if text.trim().is_empty() || text.len() > 200 {
        format!("HTTP {}", response.status)
    } else {
        text.trim().to_string()
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<RequestBody> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(|err| PortalError::Encode(format!("request body: {}", err)))
}

/// Flattens a serializable struct or map into query pairs, skipping `None` fields.
fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(query)
        .map_err(|err| PortalError::Encode(format!("query: {}", err)))?;

    let object = match value {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Object(object) => object,
        other => {
            return Err(PortalError::Encode(format!(
                "query parameters must be an object, got {}",
                other
            )))
        }
    };

    Ok(object
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
