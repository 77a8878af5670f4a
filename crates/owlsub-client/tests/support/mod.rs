//! In-process fakes for the Twitch endpoints used by integration tests.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Form, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use owlsub_client::config::EventSubSection;

/// Bind on an ephemeral port and serve `app` in the background.
pub async fn serve(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

/// Poll `cond` every 10ms until it holds or `within` elapses.
pub async fn eventually(within: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Fast reconnect settings pointed at `url`.
pub fn settings(url: &str) -> EventSubSection {
    EventSubSection {
        url: url.to_string(),
        backoff_floor_ms: 50,
        backoff_ceiling_ms: 400,
        connect_timeout_ms: 1000,
        keepalive_grace_ms: 2000,
        ..EventSubSection::default()
    }
}

// ---------- frames ----------

pub fn frame(message_id: &str, message_type: &str, payload: Value) -> String {
    json!({
        "metadata": {
            "message_id": message_id,
            "message_type": message_type,
            "message_timestamp": Utc::now().to_rfc3339(),
        },
        "payload": payload,
    })
    .to_string()
}

pub fn welcome(message_id: &str, session_id: &str) -> String {
    frame(
        message_id,
        "session_welcome",
        json!({ "session": {
            "id": session_id,
            "status": "connected",
            "keepalive_timeout_seconds": 10,
            "reconnect_url": null,
        }}),
    )
}

pub fn notification(message_id: &str, broadcaster: &str) -> String {
    frame(
        message_id,
        "notification",
        json!({
            "subscription": {
                "id": "sub-1",
                "status": "enabled",
                "type": "stream.online",
                "version": "1",
                "cost": 0,
                "condition": { "broadcaster_user_id": broadcaster },
                "transport": { "method": "websocket", "session_id": "abc" },
            },
            "event": {
                "id": "9001",
                "broadcaster_user_id": broadcaster,
                "broadcaster_user_login": "owl",
                "broadcaster_user_name": "Owl",
                "type": "live",
                "started_at": Utc::now().to_rfc3339(),
            },
        }),
    )
}

pub fn reconnect(message_id: &str, session_id: &str, url: &str) -> String {
    frame(
        message_id,
        "session_reconnect",
        json!({ "session": {
            "id": session_id,
            "status": "reconnecting",
            "keepalive_timeout_seconds": null,
            "reconnect_url": url,
        }}),
    )
}

// ---------- fake eventsub websocket ----------

#[derive(Debug, Clone)]
pub enum Step {
    Send(String),
    Ping(Vec<u8>),
    /// Drop the socket without a close frame.
    Drop,
    /// Keep reading until the client leaves or `kick` fires.
    Hold,
}

/// Each accepted connection consumes the next script; an exhausted queue holds.
#[derive(Default)]
pub struct FakeEventSub {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    pub connections: AtomicUsize,
    /// Upgrade requests to answer with 503 before accepting again.
    pub refuse_next: AtomicUsize,
    pub client_closes: AtomicUsize,
    pub pongs: Mutex<Vec<Vec<u8>>>,
    pub kick: Notify,
}

impl FakeEventSub {
    pub fn with_scripts(scripts: Vec<Vec<Step>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        })
    }

    pub fn push_script(&self, script: Vec<Step>) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub async fn spawn(self: &Arc<Self>) -> (String, JoinHandle<()>) {
        let app = Router::new()
            .route("/ws", get(ws_upgrade))
            .with_state(Arc::clone(self));
        let (addr, handle) = serve(app).await;
        (format!("ws://{addr}/ws"), handle)
    }

    async fn drive(self: Arc<Self>, mut socket: WebSocket) {
        self.connections.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![Step::Hold]);

        for step in script {
            match step {
                Step::Send(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        return;
                    }
                }
                Step::Ping(payload) => {
                    if socket.send(Message::Ping(payload)).await.is_err() {
                        return;
                    }
                }
                Step::Drop => return,
                Step::Hold => break,
            }
        }

        loop {
            tokio::select! {
                _ = self.kick.notified() => return,
                msg = socket.recv() => match msg {
                    Some(Ok(Message::Pong(p))) => self.pongs.lock().unwrap().push(p),
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        self.client_closes.fetch_add(1, Ordering::SeqCst);
                        return;
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}

async fn ws_upgrade(State(fake): State<Arc<FakeEventSub>>, ws: WebSocketUpgrade) -> Response {
    let refused = fake
        .refuse_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if refused {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| fake.drive(socket))
}

// ---------- fake token endpoint + helix ----------

pub struct FakeTwitch {
    pub token_calls: AtomicUsize,
    pub token_status: AtomicU16,
    pub expires_in: u64,
    pub last_token_form: Mutex<HashMap<String, String>>,

    pub sub_calls: AtomicUsize,
    pub sub_status: AtomicU16,
    pub last_sub: Mutex<Option<(HeaderMap, Value)>>,

    pub lookup_status: AtomicU16,
    pub last_query: Mutex<Option<String>>,
}

impl FakeTwitch {
    pub fn new(expires_in: u64) -> Arc<Self> {
        Arc::new(Self {
            token_calls: AtomicUsize::new(0),
            token_status: AtomicU16::new(200),
            expires_in,
            last_token_form: Mutex::new(HashMap::new()),
            sub_calls: AtomicUsize::new(0),
            sub_status: AtomicU16::new(202),
            last_sub: Mutex::new(None),
            lookup_status: AtomicU16::new(200),
            last_query: Mutex::new(None),
        })
    }

    /// Returns `(token_url, api_base)`.
    pub async fn spawn(self: &Arc<Self>) -> (String, String) {
        let app = Router::new()
            .route("/oauth2/token", post(token))
            .route("/helix/eventsub/subscriptions", post(create_subscription))
            .route("/helix/users", get(users))
            .route("/helix/streams", get(streams))
            .with_state(Arc::clone(self));
        let (addr, _handle) = serve(app).await;
        (
            format!("http://{addr}/oauth2/token"),
            format!("http://{addr}/helix"),
        )
    }
}

fn status_of(code: &AtomicU16) -> StatusCode {
    StatusCode::from_u16(code.load(Ordering::SeqCst)).unwrap()
}

async fn token(
    State(fake): State<Arc<FakeTwitch>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let n = fake.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    *fake.last_token_form.lock().unwrap() = form;

    let status = status_of(&fake.token_status);
    if !status.is_success() {
        return (status, r#"{"status":401,"message":"invalid client secret"}"#).into_response();
    }
    // Slow enough that concurrent callers overlap.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Json(json!({
        "access_token": format!("tok-{n}"),
        "expires_in": fake.expires_in,
        "token_type": "bearer",
    }))
    .into_response()
}

async fn create_subscription(
    State(fake): State<Arc<FakeTwitch>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.sub_calls.fetch_add(1, Ordering::SeqCst);
    *fake.last_sub.lock().unwrap() = Some((headers, body));

    let status = status_of(&fake.sub_status);
    if status.is_success() {
        (status, Json(json!({ "data": [], "total": 1 }))).into_response()
    } else {
        (status, r#"{"error":"Conflict","status":409,"message":"subscription already exists"}"#)
            .into_response()
    }
}

async fn users(State(fake): State<Arc<FakeTwitch>>, RawQuery(q): RawQuery) -> Response {
    *fake.last_query.lock().unwrap() = q;
    let status = status_of(&fake.lookup_status);
    if !status.is_success() {
        return status.into_response();
    }
    Json(json!({ "data": [
        { "id": "1", "login": "owl", "display_name": "Owl" },
        { "id": "2", "login": "hawk", "display_name": "Hawk" },
    ]}))
    .into_response()
}

async fn streams(State(fake): State<Arc<FakeTwitch>>, RawQuery(q): RawQuery) -> Response {
    *fake.last_query.lock().unwrap() = q;
    let status = status_of(&fake.lookup_status);
    if !status.is_success() {
        return status.into_response();
    }
    Json(json!({
        "data": [{
            "id": "40000",
            "user_id": "1",
            "user_login": "owl",
            "user_name": "Owl",
            "game_name": "Just Chatting",
            "type": "live",
            "title": "night shift",
            "thumbnail_url": "",
            "started_at": "2024-05-01T11:00:00Z",
        }],
        "pagination": {},
    }))
    .into_response()
}
