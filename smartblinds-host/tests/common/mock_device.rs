use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

struct MockDeviceState {
    status_reply: Mutex<(StatusCode, String)>,
    move_status: Mutex<StatusCode>,
    status_delay: Mutex<Duration>,
    moves: Mutex<Vec<Value>>,
    step_moves: Mutex<Vec<Value>>,
    busy: AtomicBool,
    status_requests: AtomicUsize,
    resets: AtomicUsize,
}

/// Blind firmware impersonation served on an ephemeral local port.
pub struct MockDevice {
    pub address: SocketAddr,
    state: Arc<MockDeviceState>,
}

impl MockDevice {
    pub async fn start() -> Self {
        let state = Arc::new(MockDeviceState {
            status_reply: Mutex::new((StatusCode::OK, json!({ "msg": "State uninitialized" }).to_string())),
            move_status: Mutex::new(StatusCode::OK),
            status_delay: Mutex::new(Duration::ZERO),
            moves: Mutex::new(Vec::new()),
            step_moves: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
            status_requests: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/status", get(status))
            .route("/move", put(move_to_fraction))
            .route("/unsafe_move", put(move_steps))
            .route("/reset_state", put(reset_state))
            .route("/system_info", get(system_info))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { address, state }
    }

    pub fn host(&self) -> String {
        self.address.to_string()
    }

    pub fn reply_status(&self, status: StatusCode, body: impl Into<String>) {
        *self.state.status_reply.lock().unwrap() = (status, body.into());
    }

    pub fn reply_position(&self, current_steps: i64, max_steps: i64) {
        self.reply_status(
            StatusCode::OK,
            json!({ "current_steps": current_steps, "max_steps": max_steps }).to_string(),
        );
    }

    pub fn reply_message(&self, msg: &str) {
        self.reply_status(StatusCode::OK, json!({ "msg": msg }).to_string());
    }

    pub fn reject_moves(&self, status: StatusCode) {
        *self.state.move_status.lock().unwrap() = status;
    }

    /// Answer every command with the firmware's busy message.
    pub fn set_busy(&self, busy: bool) {
        self.state.busy.store(busy, Ordering::SeqCst);
    }

    pub fn delay_status(&self, delay: Duration) {
        *self.state.status_delay.lock().unwrap() = delay;
    }

    pub fn moves(&self) -> Vec<Value> {
        self.state.moves.lock().unwrap().clone()
    }

    pub fn step_moves(&self) -> Vec<Value> {
        self.state.step_moves.lock().unwrap().clone()
    }

    pub fn status_requests(&self) -> usize {
        self.state.status_requests.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.state.resets.load(Ordering::SeqCst)
    }
}

/// Address on which nothing listens.
pub async fn unreachable_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    address.to_string()
}

async fn status(State(state): State<Arc<MockDeviceState>>) -> impl IntoResponse {
    state.status_requests.fetch_add(1, Ordering::SeqCst);

    let delay = *state.status_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = state.status_reply.lock().unwrap().clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

fn busy_reply() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "msg": "Stepper is still moving" })))
}

fn ok_reply() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "msg": "OK" })))
}

async fn move_to_fraction(
    State(state): State<Arc<MockDeviceState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.moves.lock().unwrap().push(body);

    if state.busy.load(Ordering::SeqCst) {
        return busy_reply();
    }

    let status = *state.move_status.lock().unwrap();
    if status.is_success() {
        ok_reply()
    } else {
        (status, Json(json!({ "msg": "Invalid fraction." })))
    }
}

/// Applies the move to the reported counters the way the stepper does: an
/// uncalibrated device starts from 0/0 and `max_steps` grows to cover every
/// position reached.
async fn move_steps(
    State(state): State<Arc<MockDeviceState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.step_moves.lock().unwrap().push(body.clone());

    if state.busy.load(Ordering::SeqCst) {
        return busy_reply();
    }

    let steps = body["steps"].as_i64().unwrap_or(0);
    let mut reply = state.status_reply.lock().unwrap();
    let current: Value = serde_json::from_str(&reply.1).unwrap_or(Value::Null);

    let mut current_steps = current["current_steps"].as_i64().unwrap_or(-1);
    let mut max_steps = current["max_steps"].as_i64().unwrap_or(-1);
    if current_steps < 0 || max_steps < 0 {
        current_steps = 0;
        max_steps = 0;
    }

    current_steps += steps;
    if current_steps >= max_steps {
        max_steps = current_steps;
    }
    if current_steps < 0 {
        max_steps -= current_steps;
        current_steps = 0;
    }

    *reply = (
        StatusCode::OK,
        json!({ "current_steps": current_steps, "max_steps": max_steps }).to_string(),
    );

    ok_reply()
}

async fn reset_state(State(state): State<Arc<MockDeviceState>>) -> impl IntoResponse {
    if state.busy.load(Ordering::SeqCst) {
        return busy_reply();
    }

    state.resets.fetch_add(1, Ordering::SeqCst);
    *state.status_reply.lock().unwrap() = (
        StatusCode::OK,
        json!({ "current_steps": -1, "max_steps": -1 }).to_string(),
    );

    ok_reply()
}

async fn system_info() -> impl IntoResponse {
    Json(json!({ "version": "v4.4.1", "cores": 2 }))
}
