use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use checkit_engine::services::CheckpointStore;
use checkit_engine::{Config, GameService, MemoryCheckpointStore};

/// Shared state of the stub CheckIT backend.
#[derive(Default)]
pub struct BackendState {
    /// When set, the content endpoint answers 403 (event paused/closed).
    pub closed: AtomicBool,
    /// When set, the submit endpoint answers 500.
    pub fail_submissions: AtomicBool,
    /// Every payload the submit endpoint received.
    pub submissions: Mutex<Vec<serde_json::Value>>,
}

pub struct StubBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

impl StubBackend {
    pub fn submission_count(&self) -> usize {
        self.state.submissions.lock().unwrap().len()
    }

    pub fn last_submission(&self) -> Option<serde_json::Value> {
        self.state.submissions.lock().unwrap().last().cloned()
    }
}

/// Stand up a stub backend on an ephemeral port serving the two endpoints
/// the engine consumes.
pub async fn spawn_backend() -> StubBackend {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let state = Arc::new(BackendState::default());
    let app = Router::new()
        .route("/api/v1/games/content/{game_type}", get(content))
        .route("/api/v1/games/submit", post(submit))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubBackend {
        base_url: format!("http://{}", addr),
        state,
    }
}

async fn content(
    State(state): State<Arc<BackendState>>,
    Path(game_type): Path<String>,
) -> Response {
    if state.closed.load(Ordering::SeqCst) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let rows = match game_type.as_str() {
        "binary_brain" => json!([
            {
                "id": 1,
                "question": "Which port does HTTPS use?",
                "image": "none",
                "answer_correct": "443",
                "answer_wrong1": "80",
                "answer_wrong2": "22",
                "answer_wrong3": "8080"
            },
            {
                "id": 2,
                "question": "What does DNS resolve?",
                "answer_correct": "Domain names",
                "answer_wrong1": "MAC addresses",
                "answer_wrong2": "Port numbers",
                "answer_wrong3": "Subnet masks"
            },
            {
                "id": 3,
                "question": "Which device forwards frames by MAC address?",
                "answer_correct": "Switch",
                "answer_wrong1": "Hub",
                "answer_wrong2": "Repeater",
                "answer_wrong3": "Modem"
            }
        ]),
        "it_match" => json!([
            {"id": "c1", "question": "USB stick from the parking lot", "image": "usb.jpg", "is_correct": false},
            {"id": "c2", "question": "Password manager", "is_correct": true},
            {"id": "c3", "question": "Sticky note with the admin password", "is_correct": false},
            {"id": "c4", "question": "Locking the screen before lunch", "is_correct": true}
        ]),
        "patch_master" => json!([
            {"id": "panel", "question": "Patch every pair on the panel"}
        ]),
        _ => json!([]),
    };

    Json(rows).into_response()
}

async fn submit(
    State(state): State<Arc<BackendState>>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    state.submissions.lock().unwrap().push(payload.clone());

    if state.fail_submissions.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Json(json!({
        "nick": "Player",
        "game_type": payload["game_type"],
        "score": payload["score"],
        "duration_ms": payload["duration_ms"]
    }))
    .into_response()
}

/// Engine wired to the stub backend and an in-memory checkpoint store.
pub fn engine_for(backend: &StubBackend) -> (GameService, Arc<MemoryCheckpointStore>) {
    let config = Config {
        backend_url: backend.base_url.clone(),
        redis_uri: "redis://127.0.0.1:6379/0".to_string(),
    };
    let store = Arc::new(MemoryCheckpointStore::new());
    let service = GameService::new(&config, store.clone() as Arc<dyn CheckpointStore>);
    (service, store)
}
