//! In-process backend used by the client tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::ClientConfig;

/// How `POST /login/refresh` behaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshMode {
    Succeed,
    /// HTTP 200 with a non-200 envelope code
    Reject,
    /// HTTP 401
    Unauthorized,
    /// Never answers in time
    Hang,
}

pub struct MockState {
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub valid_token: Mutex<String>,
    pub refresh_mode: Mutex<RefreshMode>,
    pub refresh_delay: Mutex<Duration>,
    /// Bearer tokens accepted by protected routes, in arrival order
    pub accepted_tokens: Mutex<Vec<String>>,
    pub last_body: Mutex<Option<Value>>,
}

#[derive(Clone)]
pub struct MockBackend {
    pub state: Arc<MockState>,
    pub base_url: String,
}

impl MockBackend {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            valid_token: Mutex::new("access-2".to_string()),
            refresh_mode: Mutex::new(RefreshMode::Succeed),
            refresh_delay: Mutex::new(Duration::from_millis(0)),
            accepted_tokens: Mutex::new(Vec::new()),
            last_body: Mutex::new(None),
        });

        let router = Router::new()
            .route("/login/sendcode", post(handle_send_code))
            .route("/login", post(handle_login))
            .route("/login/refresh", post(handle_refresh))
            .route("/login/logout", post(handle_logout))
            .route("/usage/today/{id}", get(handle_usage_today))
            .route("/usage/history/{id}", get(handle_usage_history))
            .route("/users", get(handle_list_users))
            .route("/users/{id}/role", put(handle_echo))
            .route("/users/{id}/package", post(handle_echo))
            .route("/users/{id}", get(handle_get_user).delete(handle_delete))
            .route("/packages", get(handle_list_packages).post(handle_echo))
            .route("/packages/{id}", put(handle_echo).delete(handle_delete))
            .route("/apikeys", get(handle_list_keys).post(handle_create_key))
            .route("/apikeys/{id}", delete(handle_delete))
            .route("/health/channels", get(handle_channels))
            .route("/health/realtime", get(handle_realtime))
            .route("/health/history/{alias}", get(handle_health_history))
            .route("/business-error", get(handle_business_error))
            .route("/server-error", get(handle_server_error))
            .route("/html", get(handle_html))
            .route("/revoked", get(handle_revoked))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(5),
            refresh_timeout: Duration::from_secs(2),
            ..ClientConfig::default()
        }
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.state.refresh_mode.lock().unwrap() = mode;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn accepted_tokens(&self) -> Vec<String> {
        self.state.accepted_tokens.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }
}

type Shared = State<Arc<MockState>>;

fn ok(data: Value) -> Response {
    Json(json!({"code": 200, "message": "ok", "data": data})).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"code": 401, "message": "token expired"})),
    )
        .into_response()
}

/// Accept the request if it carries the currently valid bearer token.
fn authorize(state: &MockState, headers: &HeaderMap) -> bool {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    match presented {
        Some(token) if token == *state.valid_token.lock().unwrap() => {
            state.accepted_tokens.lock().unwrap().push(token);
            true
        }
        _ => false,
    }
}

async fn handle_send_code(State(state): Shared, Json(body): Json<Value>) -> Response {
    *state.last_body.lock().unwrap() = Some(body);
    ok(Value::Null)
}

async fn handle_login(State(state): Shared, Json(body): Json<Value>) -> Response {
    if body["code"] != "123456" {
        return Json(json!({"code": 4001, "message": "invalid verification code"})).into_response();
    }
    *state.valid_token.lock().unwrap() = "access-1".to_string();
    ok(json!({
        "accessToken": "access-1",
        "refreshToken": "refresh-1",
        "expiresIn": 900,
        "refreshExpiresIn": 604800,
        "user": {"id": 9007199254740993u64, "email": body["email"], "role": "admin"}
    }))
}

async fn handle_refresh(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body);

    let delay = *state.refresh_delay.lock().unwrap();
    let mode = *state.refresh_mode.lock().unwrap();
    tokio::time::sleep(delay).await;

    match mode {
        RefreshMode::Succeed => {
            *state.valid_token.lock().unwrap() = "access-2".to_string();
            ok(json!({"accessToken": "access-2", "refreshToken": "refresh-2"}))
        }
        RefreshMode::Reject => {
            Json(json!({"code": 4010, "message": "refresh token expired"})).into_response()
        }
        RefreshMode::Unauthorized => unauthorized(),
        RefreshMode::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            unauthorized()
        }
    }
}

async fn handle_logout(State(state): Shared) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    ok(Value::Null)
}

async fn handle_usage_today(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!({"userId": id, "used": 120, "quota": 1000, "usageRate": 0.12}))
}

async fn handle_usage_history(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!([
        {"time": "2026-10-14", "usageRate": 0.4},
        {"time": "2026-10-15", "usageRate": 0.9},
        {"time": "2026-10-16", "usageRate": 0.2}
    ]))
}

async fn handle_list_users(State(state): Shared, Query(q): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    *state.last_body.lock().unwrap() = Some(json!(q));
    ok(json!({
        "items": [{"id": "18446744073709551615", "email": "big@example.com", "role": "user", "balance": 3.5}],
        "total": 1, "page": 1, "pageSize": 20
    }))
}

async fn handle_get_user(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!({"id": id, "email": "someone@example.com", "role": "user", "balance": 0.0}))
}

/// Records the decoded `{id}` segment it was called with.
async fn handle_delete(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    *state.last_body.lock().unwrap() = Some(json!({"id": id}));
    ok(Value::Null)
}

async fn handle_list_packages(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!([{"id": 3, "name": "Pro", "price": 19.9, "dailyQuota": 5000, "durationDays": 30}]))
}

async fn handle_list_keys(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!([{"id": "k1", "name": "ci", "key": "sk-***", "enabled": true}]))
}

async fn handle_create_key(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!({"id": "k2", "name": body["name"], "key": "sk-new", "enabled": true}))
}

async fn handle_echo(State(state): Shared, headers: HeaderMap, body: Bytes) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    *state.last_body.lock().unwrap() = serde_json::from_slice(&body).ok();
    ok(Value::Null)
}

async fn handle_channels(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!([
        {"alias": "openai", "alive": true, "consecutiveFailures": 0, "ewmaLatencyMs": 210.0},
        {"alias": "claude", "alive": false, "consecutiveFailures": 4, "ewmaLatencyMs": 0.0}
    ]))
}

async fn handle_realtime(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    ok(json!([
        {"time": "10:00", "openai_latency": 200, "openai_available": true, "claude_latency": 0, "claude_available": false}
    ]))
}

async fn handle_health_history(State(state): Shared, Path(alias): Path<String>, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    *state.last_body.lock().unwrap() = Some(json!({"alias": alias}));
    ok(json!([
        {"time": "2026-10-16T10:15:00Z", "status": "degraded"},
        {"time": "2026-10-16T10:00:00Z", "status": "available"}
    ]))
}

async fn handle_business_error(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers) {
        return unauthorized();
    }
    Json(json!({"code": 4003, "message": "quota exceeded"})).into_response()
}

/// Rejects every token, including freshly refreshed ones.
async fn handle_revoked() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"code": 401, "message": "token revoked"})),
    )
        .into_response()
}

async fn handle_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"code": 500, "message": "database unavailable"})),
    )
        .into_response()
}

async fn handle_html() -> Response {
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<html>maintenance</html>",
    )
        .into_response()
}
