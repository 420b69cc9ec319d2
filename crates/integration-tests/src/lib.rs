//! Integration tests for Campick.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p campick-integration-tests
//! ```
//!
//! No external services are needed. [`MockBackend`] is an in-process
//! `axum` server standing in for the REST backend and the SSE push
//! endpoint: tests script a reply per route, drive the client crates
//! against it, then inspect the requests the client sent.
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! backend.on(Method::GET, "/api/getAllShops", Reply::json(json!([])));
//!
//! let client = BackendClient::new(&backend.config()).unwrap();
//! assert!(client.list_shops().await.unwrap().is_empty());
//! assert_eq!(backend.hits(&Method::GET, "/api/getAllShops"), 1);
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use campick_storefront::config::ClientConfig;
use campick_storefront::state::ClientState;
use campick_storefront::storage::MemoryStorage;
use futures::Stream;
use serde_json::{Value, json};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Path of the mock SSE endpoint, matching the client's default push URL.
pub const EVENTS_PATH: &str = "/api/events";

/// How long `wait_for_*` helpers poll before failing the test.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Replies and recorded requests
// =============================================================================

/// A canned HTTP reply.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Value,
    delay: Option<Duration>,
}

impl Reply {
    /// `200 OK` with a JSON body.
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body,
            delay: None,
        }
    }

    /// `200 OK` with an empty JSON object.
    #[must_use]
    pub fn ok() -> Self {
        Self::json(json!({}))
    }

    /// Any status with a JSON body.
    #[must_use]
    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: Vec::new(),
            body,
            delay: None,
        }
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.push((name, HeaderValue::from_static(value)));
        self
    }

    /// Hold the reply back for `delay` after the request arrives.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        for (name, value) in self.headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    /// The body parsed as JSON, or `Null`.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The bearer token, if one was sent.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

// =============================================================================
// Mock backend
// =============================================================================

#[derive(Debug, Clone)]
enum PushMessage {
    Event { name: String, data: String },
    Close,
}

#[derive(Default)]
struct Routes {
    replies: HashMap<(Method, String), VecDeque<Reply>>,
    requests: Vec<Recorded>,
}

struct Shared {
    routes: Mutex<Routes>,
    push: broadcast::Sender<PushMessage>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process stand-in for the REST backend and push endpoint.
///
/// Replies scripted for a route are served in order; the last one repeats.
/// Unscripted routes answer `404 {"message": "no route"}`.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let (push, _) = broadcast::channel(64);
        let shared = Arc::new(Shared {
            routes: Mutex::new(Routes::default()),
            push,
        });

        let app = Router::new()
            .route(EVENTS_PATH, get(events))
            .fallback(scripted)
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend stopped");
        });

        Self { addr, shared, task }
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api(&self.url()).expect("Mock backend URL is valid")
    }

    /// Fresh client state on in-memory storage, pointed at this backend.
    #[must_use]
    pub fn client_state(&self) -> ClientState {
        ClientState::with_storage(self.config(), Arc::new(MemoryStorage::new()))
            .expect("Failed to build client state")
    }

    /// Client state signed in with `token`.
    #[must_use]
    pub fn signed_in(&self, token: &str) -> ClientState {
        let state = self.client_state();
        state.sign_in(token).expect("Test token is valid");
        state
    }

    /// Answer `method path` with `reply`, replacing anything scripted before.
    pub fn on(&self, method: Method, path: &str, reply: Reply) {
        self.shared
            .lock()
            .replies
            .insert((method, path.to_string()), VecDeque::from([reply]));
    }

    /// Queue `reply` after those already scripted for `method path`.
    pub fn then(&self, method: Method, path: &str, reply: Reply) {
        self.shared
            .lock()
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.lock().requests.clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.shared
            .lock()
            .requests
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    /// The most recent request for `method path`.
    #[must_use]
    pub fn last_request(&self, method: &Method, path: &str) -> Option<Recorded> {
        self.requests_to(method, path).pop()
    }

    /// Number of requests received for `method path`.
    #[must_use]
    pub fn hits(&self, method: &Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    /// Wait until `method path` has been hit at least `count` times.
    pub async fn wait_for_hits(&self, method: &Method, path: &str, count: usize) {
        let waited = tokio::time::timeout(WAIT_TIMEOUT, async {
            while self.hits(method, path) < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "timed out waiting for {count} hit(s) on {method} {path}, saw {}",
            self.hits(method, path)
        );
    }

    /// Send an event to every connected push subscriber.
    pub fn push(&self, event: &str, data: &Value) {
        let _ = self.shared.push.send(PushMessage::Event {
            name: event.to_string(),
            data: data.to_string(),
        });
    }

    /// Send a raw, possibly malformed, event payload.
    pub fn push_raw(&self, event: &str, data: &str) {
        let _ = self.shared.push.send(PushMessage::Event {
            name: event.to_string(),
            data: data.to_string(),
        });
    }

    /// End every open push stream.
    pub fn close_push(&self) {
        let _ = self.shared.push.send(PushMessage::Close);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn record(shared: &Shared, method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) {
    shared.lock().requests.push(Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
}

async fn scripted(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(&shared, method.clone(), &uri, headers, body);

    let reply = shared
        .lock()
        .replies
        .get_mut(&(method, uri.path().to_string()))
        .and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

    let Some(reply) = reply else {
        return Reply::status(404, json!({"message": "no route"})).into_response();
    };
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    reply.into_response()
}

async fn events(
    State(shared): State<Arc<Shared>>,
    uri: Uri,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    record(&shared, Method::GET, &uri, headers, Bytes::new());

    // Subscribe before responding so events pushed after connect are seen.
    let mut rx = shared.push.subscribe();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(PushMessage::Event { name, data }) => {
                    yield Ok(Event::default().event(name).data(data));
                }
                Ok(PushMessage::Close) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(_)) => {}
            }
        }
    };
    Sse::new(stream)
}

// =============================================================================
// Tokens
// =============================================================================

/// An unsigned token carrying `claims`. The client never verifies
/// signatures, only decodes the payload.
#[must_use]
pub fn token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// A live shopper token for user `id`.
#[must_use]
pub fn customer_token(id: i64) -> String {
    token(&json!({
        "id": id,
        "role": "student",
        "email": format!("student{id}@campus.edu"),
        "name": format!("Student {id}"),
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

/// A live shop-owner token for user `id`.
#[must_use]
pub fn owner_token(id: i64) -> String {
    token(&json!({
        "id": id,
        "role": "shop_owner",
        "email": format!("owner{id}@campus.edu"),
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

// =============================================================================
// Fixtures
// =============================================================================

/// A shop as the backend lists it.
#[must_use]
pub fn shop_json(id: i64, name: &str, is_open: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} on the main campus"),
        "image_url": null,
        "contact_number": "98450 00000",
        "is_open": is_open,
    })
}

/// A menu item as the backend lists it.
#[must_use]
pub fn menu_item_json(item_id: &str, shop_id: i64, name: &str, price: &str, category: &str) -> Value {
    json!({
        "item_id": item_id,
        "shop_id": shop_id,
        "name": name,
        "category": category,
        "description": format!("Fresh {name}"),
        "image_url": format!("https://img.campick.test/{item_id}.png"),
        "price": price,
        "created_at": "2024-08-01T09:00:00Z",
        "updated_at": "2024-08-01T09:00:00Z",
    })
}

/// An order as the backend lists it.
#[must_use]
pub fn order_json(order_id: i64, status: &str, payment_status: &str, total: &str) -> Value {
    json!({
        "order_id": order_id,
        "payment_id": null,
        "created_at": "2024-08-01T12:30:00Z",
        "status": status,
        "total_price": total,
        "payment_status": payment_status,
        "user_id": 7,
        "user_name": "Student 7",
        "email": "student7@campus.edu",
        "items": [],
        "user_type": "student",
        "shop_id": 1,
    })
}
