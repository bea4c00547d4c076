//! HTTP client adapter.
//!
//! Resource requests pick up the current credential from a
//! [`CredentialSource`] (the store, in production) and report every 401 to the
//! subscribed listeners before handing the error back to the caller. Session
//! requests carry an explicit credential and never notify.

use std::sync::{Arc, RwLock};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use omnicorp_auth::Credential;
use omnicorp_core::User;

use crate::error::{ApiError, ApiResult};

/// Where the adapter reads the bearer token from at request time.
pub trait CredentialSource: Send + Sync {
    fn current_credential(&self) -> Option<Credential>;
}

/// Signals emitted by the adapter, independent of who made the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Unauthorized { method: String, path: String },
}

type Listener = Arc<dyn Fn(&TransportEvent) + Send + Sync>;

/// Body of a successful token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    credentials: Arc<dyn CredentialSource>,
    listeners: Arc<RwLock<Vec<Listener>>>,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, credentials)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            credentials,
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Registers a listener for transport events. Listeners run synchronously
    /// on the task that observed the response, before the caller sees it.
    pub fn on_transport_event(&self, listener: impl Fn(&TransportEvent) + Send + Sync + 'static) {
        match self.listeners.write() {
            Ok(mut guard) => guard.push(Arc::new(listener)),
            Err(poisoned) => poisoned.into_inner().push(Arc::new(listener)),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self.send(Method::GET, path, |req| req).await?;
        decode(resp).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(Method::POST, path, |req| req.json(body)).await?;
        decode(resp).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(Method::PUT, path, |req| req.json(body)).await?;
        decode(resp).await
    }

    /// POST without a body whose response content is not needed.
    pub async fn post_empty(&self, path: &str) -> ApiResult<()> {
        self.send(Method::POST, path, |req| req).await.map(drop)
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(Method::DELETE, path, |req| req).await.map(drop)
    }

    /// Form-encoded username/password exchange.
    pub async fn exchange_credentials(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<TokenResponse> {
        let req = self
            .http
            .post(self.url(path))
            .form(&[("username", username), ("password", password)]);
        let resp = self.execute(Method::POST, path, req, false).await?;
        decode(resp).await
    }

    /// Current-user check with a caller-supplied credential.
    pub async fn current_user(&self, path: &str, credential: &Credential) -> ApiResult<User> {
        let req = self.http.get(self.url(path)).bearer_auth(credential.as_str());
        let resp = self.execute(Method::GET, path, req, false).await?;
        decode(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<Response> {
        let mut req = self.http.request(method.clone(), self.url(path));
        if let Some(credential) = self.credentials.current_credential() {
            req = req.bearer_auth(credential.as_str());
        }
        self.execute(method, path, build(req), true).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
        notify: bool,
    ) -> ApiResult<Response> {
        tracing::debug!(%method, path, "request");

        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body);
        tracing::debug!(%method, path, status = status.as_u16(), error = %err, "request failed");

        if notify && err.is_unauthorized() {
            self.emit(&TransportEvent::Unauthorized {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        Err(err)
    }

    fn emit(&self, event: &TransportEvent) {
        let listeners: Vec<Listener> = match self.listeners.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in listeners {
            listener(event);
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
