// src/test_utils/mock_completion_server.rs
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Scripted upstream behavior for one request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with a well-formed completion carrying this text
    Text(String),
    /// Non-success status with a raw body
    Status(u16, String),
    /// 200 with an arbitrary JSON body
    Raw(Value),
    /// 200 with a non-JSON body
    RawText(String),
    /// Well-formed completion sent after a delay
    Delayed(Duration, String),
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Text(content.into())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockServerState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": "mock",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn chat_completions_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    state.requests.lock().unwrap().push(RecordedRequest {
        authorization,
        body,
    });

    let next = state.replies.lock().unwrap().pop_front();
    match next {
        Some(MockReply::Text(content)) => Json(completion_body(&content)).into_response(),
        Some(MockReply::Status(code, body)) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        }
        Some(MockReply::Raw(value)) => Json(value).into_response(),
        Some(MockReply::RawText(text)) => (StatusCode::OK, text).into_response(),
        Some(MockReply::Delayed(delay, content)) => {
            tokio::time::sleep(delay).await;
            Json(completion_body(&content)).into_response()
        }
        None => {
            log::error!("Mock completion server ran out of replies!");
            (StatusCode::SERVICE_UNAVAILABLE, "no scripted reply").into_response()
        }
    }
}

pub struct MockCompletionServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    recorded_requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockCompletionServer {
    pub async fn start(replies: Vec<MockReply>) -> Self {
        let state = MockServerState {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let recorded_requests = state.requests.clone();

        let app = Router::new()
            .route("/openai/v1/chat/completions", post(chat_completions_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock completion server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock completion server error: {}", e);
                });
        });

        MockCompletionServer {
            addr,
            shutdown_tx,
            recorded_requests,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL to hand to `OpenAIClient::with_api_base`.
    pub fn api_base(&self) -> String {
        format!("{}/openai/v1", self.address())
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock completion server already stopped.");
        }
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.recorded_requests.lock().unwrap().clone()
    }
}
