//! End-to-end tests against a local device stub.
//!
//! The stub serves `/auth` and an echo WebSocket at `/ws`; sending `bye`
//! makes it close the socket.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use devlink_core::{
    HttpAuthProbe, LinkClient, LinkError, Notification, NotificationBoard, ReloadScheduler,
    SessionEvent, SessionTiming, WsConnector, PING_ACTION,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

async fn auth() -> StatusCode {
    StatusCode::OK
}

async fn ws(upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(echo)
}

async fn echo(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) if text.as_str() == "bye" => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            Message::Text(text) => {
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            _ => {}
        }
    }
}

async fn spawn_device() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/auth", get(auth)).route("/ws", get(ws));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

struct Harness {
    client: LinkClient,
    notifications: Arc<Mutex<Vec<Notification>>>,
    reloads: mpsc::UnboundedReceiver<devlink_core::ReloadRequest>,
    events: broadcast::Receiver<SessionEvent>,
}

fn harness(location: Url, timing: SessionTiming) -> Harness {
    let notifications = Arc::new(Mutex::new(Vec::new()));
    let board = {
        let notifications = notifications.clone();
        NotificationBoard::new(move |n| notifications.lock().push(n.clone()))
    };
    let (reloader, reloads) = ReloadScheduler::new();

    let client = LinkClient::new(
        location,
        Arc::new(WsConnector),
        Arc::new(HttpAuthProbe::new()),
        Arc::new(board),
        Arc::new(reloader),
        timing,
    )
    .unwrap();
    let events = client.session().subscribe();

    Harness {
        client,
        notifications,
        reloads,
        events,
    }
}

async fn wait_for_event<F>(events: &mut broadcast::Receiver<SessionEvent>, predicate: F)
where
    F: Fn(&SessionEvent) -> bool,
{
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.unwrap();
            if predicate(&event) {
                return;
            }
        }
    })
    .await
    .expect("session event not seen in time");
}

#[tokio::test]
async fn test_round_trip_and_peer_close() {
    let root = spawn_device().await;
    let mut h = harness(root, SessionTiming::default());

    let (tx, mut inbound) = mpsc::unbounded_channel();
    h.client
        .bridge()
        .connect(move |text| {
            let _ = tx.send(text);
        })
        .unwrap();

    wait_for_event(&mut h.events, |e| matches!(e, SessionEvent::Opened { .. })).await;
    assert!(h.client.session().connected());

    h.client
        .bridge()
        .send_action("dbgcmd", json!({"command": "info"}))
        .unwrap();
    let echoed = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
    assert_eq!(echoed, r#"{"action":"dbgcmd","data":{"command":"info"}}"#);

    h.client.bridge().send("bye").unwrap();
    wait_for_event(&mut h.events, |e| matches!(e, SessionEvent::Closed { .. })).await;

    assert!(!h.client.session().connected());
    assert!(matches!(
        h.client.bridge().send("late"),
        Err(LinkError::NotConnected)
    ));
    assert!(h.notifications.lock().is_empty());
}

#[tokio::test]
async fn test_keepalive_reaches_device() {
    let root = spawn_device().await;
    let timing = SessionTiming {
        keepalive_interval: Duration::from_millis(100),
        ..SessionTiming::default()
    };
    let mut h = harness(root, timing);

    let (tx, mut inbound) = mpsc::unbounded_channel();
    h.client
        .bridge()
        .connect(move |text| {
            let _ = tx.send(text);
        })
        .unwrap();
    wait_for_event(&mut h.events, |e| matches!(e, SessionEvent::Opened { .. })).await;

    // The stub echoes every frame, pings included.
    let echoed = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
    let frame: Value = serde_json::from_str(&echoed).unwrap();
    assert_eq!(frame, json!({"action": PING_ACTION, "data": {}}));
}

#[tokio::test]
async fn test_rejected_auth_notifies_and_reloads() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let root = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let timing = SessionTiming {
        reload_delay: Duration::from_millis(50),
        ..SessionTiming::default()
    };
    let mut h = harness(root, timing);

    h.client.bridge().connect(|_| {}).unwrap();
    let request = timeout(WAIT, h.reloads.recv()).await.unwrap().unwrap();
    assert_eq!(request.delay, Duration::from_millis(50));

    let notifications = h.notifications.lock();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].text.contains("503"));
    assert!(notifications[0]
        .text
        .contains(&format!("{}/auth", mock_server.uri())));
    assert_eq!(h.client.session().generation(), 0);
}

#[tokio::test]
async fn test_unreachable_device_notifies_and_reloads() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let root = Url::parse(&format!("http://{}/", addr)).unwrap();
    let timing = SessionTiming {
        reload_delay: Duration::from_millis(50),
        ..SessionTiming::default()
    };
    let mut h = harness(root, timing);

    h.client.bridge().connect(|_| {}).unwrap();
    timeout(WAIT, h.reloads.recv()).await.unwrap().unwrap();

    let notifications = h.notifications.lock();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].text.starts_with("TransportFailure"));
    assert!(!notifications[0].text.contains("status code"));
    assert_eq!(h.client.session().generation(), 0);
}
