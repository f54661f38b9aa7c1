//! Local HTTP server answering canned responses, for exercising the client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Reset timestamp sent with every canned rate limit (2024-01-01T00:00:00Z).
pub const RESET: u64 = 1_704_067_200;

#[derive(Debug, Clone)]
pub struct Canned {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
    delay: Option<Duration>,
}

impl Canned {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
            delay: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn rate_limit(self, remaining: u64) -> Self {
        self.header("x-ratelimit-limit", "60")
            .header("x-ratelimit-remaining", remaining.to_string())
            .header("x-ratelimit-reset", RESET.to_string())
    }

    pub fn delay(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct Hit {
    pub target: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, Canned>,
    hits: Vec<Hit>,
}

pub struct TestServer {
    pub url: String,
    state: Arc<Mutex<State>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(State::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, shared.clone()));
            }
        });

        Self { url, state }
    }

    /// Answer `target` (path, optionally with query) with `response`.
    pub fn route(&self, target: &str, response: Canned) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(target.to_string(), response);
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.lock().unwrap().hits.clone()
    }

    pub fn hit_count(&self, target: &str) -> usize {
        self.hits().iter().filter(|hit| hit.target == target).count()
    }
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<State>>) {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&raw).to_string();
    let mut lines = head.lines();
    let target = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let authorization = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("authorization")
            .then(|| value.trim().to_string())
    });

    let canned = {
        let mut state = state.lock().unwrap();
        state.hits.push(Hit {
            target: target.clone(),
            authorization,
        });
        let path = target.split('?').next().unwrap_or("/");
        state
            .routes
            .get(&target)
            .or_else(|| state.routes.get(path))
            .cloned()
            .unwrap_or_else(|| Canned::json(404, r#"{"message":"Not Found"}"#))
    };

    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }

    let reason = match canned.status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Error",
    };
    let mut response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
        canned.status,
        reason,
        canned.body.len()
    );
    for (name, value) in &canned.headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(&canned.body);

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
