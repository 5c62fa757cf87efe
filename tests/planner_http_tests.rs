use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use planner_widget::error::TransportError;
use planner_widget::message::{ChatEntry, PlannerRequest, Role};
use planner_widget::services::controller::{ChatController, OverlapPolicy, SubmitOutcome};
use planner_widget::services::planner::{HttpPlanner, PlannerBackend, PlannerReply};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

/// Stand-in for the agent-planner backend: fails when the last user
/// message is "fail", otherwise echoes it back in bold.
async fn agent_planner(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    captured.content_types.lock().unwrap().push(content_type);
    captured.bodies.lock().unwrap().push(body.clone());

    let last = body["session_chat_history"]
        .as_array()
        .and_then(|h| h.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    if last == "fail" {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Internal server error: boom" })))
    } else {
        (StatusCode::OK, Json(json!({ "assistant": format!("**{last}**") })))
    }
}

async fn spawn_stub() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/agent-planner", post(agent_planner))
        .route("/not-json", post(|| async { "plain text" }))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

fn request(content: &str) -> PlannerRequest {
    PlannerRequest {
        session_id: "session_http".into(),
        session_chat_history: vec![ChatEntry::new(Role::User, content)],
        user_id: "user123".into(),
    }
}

#[tokio::test]
async fn posts_the_contract_as_json() {
    let (base, captured) = spawn_stub().await;
    let planner = HttpPlanner::new(format!("{base}/agent-planner")).unwrap();

    let raw = planner.plan(&request("hello")).await.unwrap();
    assert_eq!(PlannerReply::classify(raw), PlannerReply::Text("**hello**".into()));

    let body = captured.bodies.lock().unwrap()[0].clone();
    assert_eq!(
        body,
        json!({
            "session_id": "session_http",
            "session_chat_history": [{ "role": "user", "content": "hello" }],
            "user_id": "user123",
        })
    );
    assert!(captured.content_types.lock().unwrap()[0].starts_with("application/json"));
}

#[tokio::test]
async fn error_status_is_a_failure_reply() {
    let (base, _) = spawn_stub().await;
    let planner = HttpPlanner::new(format!("{base}/agent-planner")).unwrap();

    let raw = planner.plan(&request("fail")).await.unwrap();
    assert_eq!(
        PlannerReply::classify(raw),
        PlannerReply::Failure("Internal server error: boom".into())
    );
}

#[tokio::test]
async fn non_json_body_is_a_transport_error() {
    let (base, _) = spawn_stub().await;
    let planner = HttpPlanner::new(format!("{base}/not-json")).unwrap();

    let err = planner.plan(&request("hello")).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn unreachable_backend_is_rendered_as_error() {
    // Grab a free port, then close it so the connection is refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let planner = HttpPlanner::new(format!("http://{addr}/agent-planner")).unwrap();
    let chat = ChatController::new("session_http", "user123", Arc::new(planner), OverlapPolicy::default());

    assert_eq!(chat.submit("hello").await, SubmitOutcome::TransportError);
    let history = chat.history().await;
    assert!(history[1].content.starts_with("Error: "));
}

#[tokio::test]
async fn controller_round_trip_over_http() {
    let (base, captured) = spawn_stub().await;
    let planner = HttpPlanner::new(format!("{base}/agent-planner")).unwrap();
    let chat = ChatController::new("session_http", "user123", Arc::new(planner), OverlapPolicy::default());

    assert_eq!(chat.submit("hi").await, SubmitOutcome::Answered);
    assert_eq!(chat.submit("fail").await, SubmitOutcome::BackendError);

    let rendered = chat.transcript().rendered().await;
    assert!(rendered[1].html.contains("<strong>hi</strong>"));
    assert_eq!(rendered[3].content, "Error: Internal server error: boom");

    // The second request carried the first exchange.
    let second = captured.bodies.lock().unwrap()[1].clone();
    assert_eq!(second["session_chat_history"].as_array().unwrap().len(), 3);
}
