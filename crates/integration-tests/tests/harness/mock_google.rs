//! Mock Google image generation backend for integration tests
//!
//! Serves both `:generateContent` (Gemini) and `:predict` (Imagen) under
//! `/v1beta/models/{model}:{method}` with a scripted behavior.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio_util::sync::CancellationToken;

/// What the mock answers once any scripted failures are used up
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Image bytes base64-encoded once
    SingleBase64 { bytes: Vec<u8>, mime_type: String },
    /// Image bytes base64-encoded twice
    DoubleBase64 { bytes: Vec<u8>, mime_type: String },
    /// Image present but the candidate is flagged by the safety filter
    SafetyBlocked { bytes: Vec<u8>, finish_reason: String },
    /// Model replies with text and no image
    TextOnly(String),
    /// Fixed error status with a Google error body
    Status { code: u16, status: String, message: String },
    /// Sleep before answering with a single-encoded image
    Delay { delay: Duration, bytes: Vec<u8> },
}

/// Mock Google backend that returns predictable responses
pub struct MockGoogle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockGoogleState>,
}

struct MockGoogleState {
    request_count: AtomicU32,
    /// Number of requests to fail with 503 before applying `behavior`
    fail_count: AtomicU32,
    behavior: Behavior,
    last_request: Mutex<Option<RecordedRequest>>,
}

/// What the last request looked like
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model_call: String,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

impl MockGoogle {
    /// Start the mock server, returning immediately
    pub async fn start(behavior: Behavior) -> anyhow::Result<Self> {
        Self::start_failing(0, behavior).await
    }

    /// Start a mock server that fails the first `n` requests with 503
    pub async fn start_failing(n: u32, behavior: Behavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockGoogleState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(n),
            behavior,
            last_request: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1beta/models/{model_call}", routing::post(handle_model_call))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Number of requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.last_request.lock().unwrap().clone()
    }
}

impl Drop for MockGoogle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Handlers --

async fn handle_model_call(
    State(state): State<Arc<MockGoogleState>>,
    Path(model_call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    *state.last_request.lock().unwrap() = Some(RecordedRequest {
        model_call: model_call.clone(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body,
    });

    // If fail_count > 0, decrement and return 503
    let remaining = state.fail_count.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return google_error(503, "UNAVAILABLE", "The model is overloaded. Please try again later.");
    }

    let imagen = model_call.ends_with(":predict");

    match &state.behavior {
        Behavior::SingleBase64 { bytes, mime_type } => image_reply(imagen, STANDARD.encode(bytes), mime_type, "STOP"),
        Behavior::DoubleBase64 { bytes, mime_type } => {
            image_reply(imagen, STANDARD.encode(STANDARD.encode(bytes)), mime_type, "STOP")
        }
        Behavior::SafetyBlocked { bytes, finish_reason } => {
            if imagen {
                Json(serde_json::json!({
                    "predictions": [{ "raiFilteredReason": finish_reason }]
                }))
                .into_response()
            } else {
                image_reply(false, STANDARD.encode(bytes), "image/png", finish_reason)
            }
        }
        Behavior::TextOnly(text) => Json(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        Behavior::Status { code, status, message } => google_error(*code, status, message),
        Behavior::Delay { delay, bytes } => {
            tokio::time::sleep(*delay).await;
            image_reply(imagen, STANDARD.encode(bytes), "image/png", "STOP")
        }
    }
}

fn image_reply(imagen: bool, data: String, mime_type: &str, finish_reason: &str) -> Response {
    let body = if imagen {
        serde_json::json!({
            "predictions": [{ "bytesBase64Encoded": data, "mimeType": mime_type }]
        })
    } else {
        serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here is the image you asked for." },
                        { "inlineData": { "mimeType": mime_type, "data": data } }
                    ]
                },
                "finishReason": finish_reason,
                "index": 0
            }],
            "usageMetadata": { "promptTokenCount": 12, "totalTokenCount": 1302 }
        })
    };

    Json(body).into_response()
}

fn google_error(code: u16, status: &str, message: &str) -> Response {
    let status_code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status_code,
        Json(serde_json::json!({
            "error": { "code": code, "message": message, "status": status }
        })),
    )
        .into_response()
}
