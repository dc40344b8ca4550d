//! Authenticated request client.
//!
//! Every backend call goes through [`ApiClient::send`]: the stored access
//! token is attached, the `{code, message, data}` envelope is unwrapped, and an
//! HTTP 401 triggers one shared token refresh followed by a single replay.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::envelope::{decode_data, decode_failure, decode_success};
use super::error::ApiError;
use super::monitor::{self, ErrorMonitor, ErrorReport, TracingMonitor};
use super::navigator::{redirect_to_login, LoggingNavigator, Navigator};
use super::refresh::{with_timeout_and_retries, RefreshCoordinator};
use super::session::SessionStore;
use crate::config::ClientConfig;
use crate::models::TokenPair;

/// Endpoint that mints new tokens from a refresh token.
pub const REFRESH_PATH: &str = "/login/refresh";

/// One logical backend call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Trailing path segments, each percent-encoded on its own
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::transport(format!("failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append one path segment. `/`, `?` and `#` inside it are encoded and
    /// never split the path.
    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Why a single attempt failed.
enum Failure {
    /// HTTP 401: the credentials may be renewable
    Unauthorized(ApiError),
    Other(ApiError),
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Unauthorized(e) | Failure::Other(e) => e,
        }
    }
}

struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<dyn SessionStore>,
    monitor: Arc<dyn ErrorMonitor>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    session: Arc<dyn SessionStore>,
    monitor: Arc<dyn ErrorMonitor>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClientBuilder {
    pub fn monitor(mut self, monitor: Arc<dyn ErrorMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                config: self.config,
                session: self.session,
                monitor: self.monitor,
                navigator: self.navigator,
                refresh: RefreshCoordinator::new(),
            }),
        })
    }
}

/// Client for the billing backend. Cheap to clone; clones share the session
/// and the in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn builder(config: ClientConfig, session: Arc<dyn SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            session,
            monitor: Arc::new(TracingMonitor),
            navigator: Arc::new(LoggingNavigator::default()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.inner.session.as_ref()
    }

    /// Whether a token refresh is currently running.
    pub fn refresh_in_flight(&self) -> bool {
        self.inner.refresh.in_flight()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Perform one logical call and decode its `data` into `T`.
    ///
    /// Failures are reported to the error monitor before being returned.
    pub async fn send<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ApiError> {
        let token = self.inner.session.access_token();
        let had_token = token.is_some();

        let outcome = match self.attempt(&req, token.as_deref()).await {
            Ok(data) => Ok(data),
            Err(Failure::Other(e)) => Err(e),
            Err(Failure::Unauthorized(e)) => self.recover(&req, token.as_deref(), e).await,
        };

        match outcome.and_then(decode_data) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.report(&req, had_token, &e);
                Err(e)
            }
        }
    }

    /// Handle an HTTP 401 for `req`, which was sent with `used_token`.
    async fn recover(
        &self,
        req: &ApiRequest,
        used_token: Option<&str>,
        err: ApiError,
    ) -> Result<Value, ApiError> {
        if req.path == REFRESH_PATH {
            tracing::warn!("Refresh endpoint rejected the session: {}", err.message);
            self.expire_session();
            return Err(ApiError::session_expired());
        }

        // Someone already renewed the token while this call was on the wire
        if let Some(current) = self.inner.session.access_token() {
            if used_token != Some(current.as_str()) {
                tracing::debug!("Replaying {} with the already refreshed token", req.path);
                return self.replay(req, &current).await;
            }
        }

        let Some(refresh_token) = self.inner.session.refresh_token() else {
            tracing::info!("Got 401 from {} without a refresh token", req.path);
            self.expire_session();
            return Err(ApiError::session_expired());
        };

        let client = self.clone();
        let refreshed = self
            .inner
            .refresh
            .refresh(move || async move { client.refresh_tokens(refresh_token).await })
            .await;

        match refreshed {
            Ok(tokens) => self.replay(req, &tokens.access_token).await,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.expire_session();
                Err(ApiError::session_expired())
            }
        }
    }

    /// Re-issue `req` once with `token`. A second 401 is returned as is.
    async fn replay(&self, req: &ApiRequest, token: &str) -> Result<Value, ApiError> {
        self.attempt(req, Some(token)).await.map_err(Failure::into_error)
    }

    /// Exchange the refresh token for a new pair and persist it.
    async fn refresh_tokens(&self, refresh_token: String) -> Result<TokenPair, ApiError> {
        let req = ApiRequest::post(REFRESH_PATH).json(&json!({ "refreshToken": refresh_token }))?;
        let config = &self.inner.config;

        let result = with_timeout_and_retries(config.refresh_timeout, config.refresh_retries, || {
            let client = self.clone();
            let req = req.clone();
            async move {
                let data = client.attempt(&req, None).await.map_err(Failure::into_error)?;
                decode_data::<TokenPair>(data)
            }
        })
        .await;

        match &result {
            Ok(tokens) => {
                self.inner.session.store_tokens(tokens);
                tracing::info!("Access token refreshed");
            }
            Err(e) => self.report(&req, false, e),
        }
        result
    }

    /// Issue one HTTP request and unwrap its envelope.
    async fn attempt(&self, req: &ApiRequest, token: Option<&str>) -> Result<Value, Failure> {
        let url = self.request_url(req).map_err(Failure::Other)?;

        let mut builder = self
            .inner
            .http
            .request(req.method.clone(), url)
            .headers(req.headers.clone());
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Failure::Other(ApiError::from(e)))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| Failure::Other(ApiError::from(e)))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(Failure::Unauthorized(decode_failure(status, &body)));
        }
        if !status.is_success() {
            return Err(Failure::Other(decode_failure(status, &body)));
        }

        decode_success(content_type.as_deref(), &body).map_err(Failure::Other)
    }

    fn request_url(&self, req: &ApiRequest) -> Result<Url, ApiError> {
        let endpoint = self.inner.config.endpoint_url(&req.path);
        let mut url = Url::parse(&endpoint)
            .map_err(|e| ApiError::transport(format!("invalid endpoint URL {}: {}", endpoint, e)))?;
        if !req.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ApiError::transport(format!("cannot append path segments to {}", endpoint)))?
                .pop_if_empty()
                .extend(&req.segments);
        }
        Ok(url)
    }

    /// Drop the local session and send the user to the login entry point.
    pub(crate) fn expire_session(&self) {
        self.inner.session.clear();
        if redirect_to_login(self.inner.navigator.as_ref(), &self.inner.config.login_path) {
            tracing::info!("Session cleared, login required");
        }
    }

    fn report(&self, req: &ApiRequest, had_token: bool, err: &ApiError) {
        let report = ErrorReport {
            endpoint: req.path.clone(),
            method: req.method.to_string(),
            status: err.code,
            message: err.message.clone(),
            had_token,
        };
        monitor::dispatch(self.inner.monitor.as_ref(), &report);
    }
}
