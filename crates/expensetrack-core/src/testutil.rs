//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.
//!
//! [`MockServer`] is a tiny HTTP/1.1 responder on a random local port. It
//! records every request and answers from a per-route script.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiGateway, GatewayConfig};
use crate::auth::{AuthFlow, MemorySessionStore, Navigator, SessionStore};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Reply { status: u16, body: String },
    Hang,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<(String, String), MockResponse>,
    requests: Vec<RecordedRequest>,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(MockState::default()));

        let accept_state = state.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle_connection(stream, accept_state.clone()));
            }
        });

        Self { addr, state, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer `method path` with `status` and a JSON body from now on.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.set_route(method, path, MockResponse::Reply { status, body: body.to_string() });
    }

    /// Accept `method path` but never answer.
    pub fn hang(&self, method: &str, path: &str) {
        self.set_route(method, path, MockResponse::Hang);
    }

    fn set_route(&self, method: &str, path: &str, response: MockResponse) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method.to_string(), path.to_string()), response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn handle_connection(mut stream: TcpStream, state: Arc<Mutex<MockState>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();

    let response = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            headers,
            body,
        });
        state.routes.get(&(method, path)).cloned()
    };

    let (status, body) = match response {
        Some(MockResponse::Reply { status, body }) => (status, body),
        Some(MockResponse::Hang) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return;
        }
        None => (404, r#"{"message":"not found"}"#.to_string()),
    };

    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let reply = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Gateway pointed at `server` that bypasses any system proxy.
pub fn test_gateway(server: &MockServer) -> ApiGateway {
    test_gateway_with_timeout(server, 2000)
}

pub fn test_gateway_with_timeout(server: &MockServer, timeout_ms: u64) -> ApiGateway {
    let mut config = GatewayConfig::new(server.url(), timeout_ms);
    config.use_system_proxy = false;
    ApiGateway::configure(&config).unwrap()
}

/// Records navigation triggers instead of routing anywhere.
#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn to_authentication(&self) {
        self.events.lock().unwrap().push("authentication");
    }

    fn to_home(&self) {
        self.events.lock().unwrap().push("home");
    }
}

/// Everything an auth or screen test needs, wired against `server`.
pub struct TestHarness {
    pub gateway: Arc<ApiGateway>,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub flow: Arc<AuthFlow>,
}

impl TestHarness {
    pub fn new(server: &MockServer) -> Self {
        let gateway = Arc::new(test_gateway(server));
        let store = Arc::new(MemorySessionStore::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let flow = Arc::new(AuthFlow::new(
            ApiClient::new(gateway.clone()),
            store.clone() as Arc<dyn SessionStore>,
            navigator.clone() as Arc<dyn Navigator>,
        ));
        Self { gateway, store, navigator, flow }
    }
}
