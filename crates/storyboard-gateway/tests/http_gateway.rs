//! HTTP gateway against a local stub backend.

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use storyboard_gateway::{
    DocumentId, GatewayConfig, HttpGateway, PersistenceError, PersistenceGateway, RecordId,
    StoreRequest,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

type Respond = fn(&Seen) -> (u16, String);

struct Backend {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    async fn start(respond: Respond) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    let (status, body) = respond(&request);
                    log.lock().push(request);
                    let reply = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    socket.write_all(reply.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                });
            }
        });
        Self {
            base_url: format!("http://{addr}/api"),
            seen,
        }
    }

    fn gateway(&self) -> HttpGateway {
        HttpGateway::new(
            &GatewayConfig::new()
                .with_base_url(&self.base_url)
                .with_bearer_token("t0ken"),
        )
        .unwrap()
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.seen
            .lock()
            .iter()
            .map(|s| (s.method.clone(), s.path.clone()))
            .collect()
    }
}

async fn read_request(socket: &mut TcpStream) -> Seen {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client hung up mid-request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split_whitespace();
    let method = request_line.next().unwrap().to_string();
    let path = request_line.next().unwrap().to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap(),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client hung up mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).into_owned();

    Seen {
        method,
        path,
        authorization,
        body,
    }
}

fn board() -> DocumentId {
    DocumentId::parse("board").unwrap()
}

#[tokio::test]
async fn missing_record_is_none_and_carries_bearer() {
    let backend = Backend::start(|_| (404, json!({"error": "Storyboard not found"}).to_string())).await;

    let fetched = backend.gateway().fetch_latest(&board()).await.unwrap();

    assert_eq!(fetched, None);
    let seen = backend.seen.lock()[0].clone();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/api/storyboards/board");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer t0ken"));
}

#[tokio::test]
async fn stored_record_is_fetched_with_numeric_id() {
    let backend = Backend::start(|_| {
        let record = json!({
            "id": 7,
            "title": "Board",
            "data": "cipher",
            "updated_at": "2024-03-01T10:00:00Z"
        });
        (200, record.to_string())
    })
    .await;

    let blob = backend
        .gateway()
        .fetch_latest(&board())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blob.record_id, RecordId("7".into()));
    assert_eq!(blob.data, "cipher");
    assert!(blob.updated_at.is_some());
}

#[tokio::test]
async fn error_status_maps_to_status_error() {
    let backend = Backend::start(|_| (500, json!({"error": "db down"}).to_string())).await;
    let gateway = backend.gateway();

    let fetch = gateway.fetch_latest(&board()).await.unwrap_err();
    let PersistenceError::Status { status, message } = fetch else {
        panic!("expected status error, got {fetch:?}");
    };
    assert_eq!(status, 500);
    assert!(message.contains("db down"));

    let store = gateway
        .store(&board(), StoreRequest::new("Board", "cipher"))
        .await
        .unwrap_err();
    assert!(matches!(store, PersistenceError::Status { status: 500, .. }));
    assert!(store.is_transient());
}

#[tokio::test]
async fn first_store_creates_record_then_updates_it() {
    let backend = Backend::start(|seen| match (seen.method.as_str(), seen.path.as_str()) {
        ("PUT", "/api/storyboards/board") => (404, json!({"error": "Storyboard not found"}).to_string()),
        ("POST", "/api/storyboards") => (201, json!({"id": 42, "title": "Board", "data": "cipher-1"}).to_string()),
        ("PUT", "/api/storyboards/42") => (200, json!({"id": 42, "title": "Board", "data": "cipher-2"}).to_string()),
        ("GET", "/api/storyboards/42") => (200, json!({"id": 42, "data": "cipher-2"}).to_string()),
        _ => (400, json!({"error": "unexpected"}).to_string()),
    })
    .await;
    let gateway = backend.gateway();

    let created = gateway
        .store(&board(), StoreRequest::new("Board", "cipher-1"))
        .await
        .unwrap();
    let updated = gateway
        .store(&board(), StoreRequest::new("Board", "cipher-2"))
        .await
        .unwrap();
    let latest = gateway.fetch_latest(&board()).await.unwrap().unwrap();

    assert_eq!(created, RecordId("42".into()));
    assert_eq!(updated, created);
    assert_eq!(latest.data, "cipher-2");
    assert_eq!(
        backend.requests(),
        vec![
            ("PUT".to_string(), "/api/storyboards/board".to_string()),
            ("POST".to_string(), "/api/storyboards".to_string()),
            ("PUT".to_string(), "/api/storyboards/42".to_string()),
            ("GET".to_string(), "/api/storyboards/42".to_string()),
        ]
    );

    let posted: serde_json::Value = serde_json::from_str(&backend.seen.lock()[1].body).unwrap();
    assert_eq!(posted, json!({"title": "Board", "data": "cipher-1"}));
}
