//! Realtime subscription against an in-process WebSocket feed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use dataco_events::{RealtimeHub, RealtimeSubscription, ReconnectConfig, Table};

type Received = Arc<Mutex<Vec<String>>>;

async fn feed(State(received): State<Received>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_feed(socket, received))
}

async fn serve_feed(mut socket: WebSocket, received: Received) {
    if let Some(Ok(Message::Text(text))) = socket.recv().await {
        received.lock().unwrap().push(text.to_string());
    }

    let frames = [
        json!({"table": "subtasks", "eventType": "INSERT", "new": {"_id": "s9"}, "old": {}}),
        json!({"table": "nope", "eventType": "INSERT"}),
        json!({"table": "tasks", "eventType": "DELETE", "new": {}, "old": {"_id": "t1"}}),
    ];
    for frame in frames {
        if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn spawn_feed() -> (String, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/realtime", get(feed))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("ws://{addr}/realtime"), received)
}

#[tokio::test]
async fn frames_are_forwarded_to_the_hub() {
    let (url, received) = spawn_feed().await;
    let hub = Arc::new(RealtimeHub::default());
    let mut rx = hub.subscribe();

    let subscription = RealtimeSubscription::new(url, hub.clone());
    subscription.connect_and_forward().await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.table, Table::Subtasks);
    assert_eq!(first.change.event_type, "INSERT");

    // The frame with an unknown table is skipped, not fatal.
    let second = rx.recv().await.unwrap();
    assert_eq!(second.table, Table::Tasks);
    assert_eq!(second.change.old.unwrap()["_id"], "t1");

    let subscribe: serde_json::Value =
        serde_json::from_str(&received.lock().unwrap()[0]).unwrap();
    assert_eq!(subscribe["type"], "subscribe");
    assert_eq!(subscribe["tables"], json!(["tasks", "subtasks"]));
}

#[tokio::test]
async fn run_stops_when_cancelled_while_backing_off() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let subscription = RealtimeSubscription::new(
        format!("ws://{addr}/realtime"),
        Arc::new(RealtimeHub::default()),
    )
    .with_reconnect(ReconnectConfig {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(50),
        multiplier: 2.0,
    });

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        stopper.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), subscription.run(cancel))
        .await
        .expect("run should return after cancellation");
}
