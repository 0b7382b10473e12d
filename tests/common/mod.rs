//! Stub analysis backend shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use empathy_view::web::parse_head;

pub const WORKED_EXAMPLE: &str = r#"{
    "emotional_trend": "improving",
    "emotion_distribution": {"joy": 1, "sadness": 1},
    "timeline": [
        {"text": "I am happy", "emotion": "joy", "score": 0.9},
        {"text": "I am sad", "emotion": "sadness", "score": 0.3}
    ]
}"#;

/// A request as the stub saw it.
#[derive(Debug)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub struct StubBackend {
    pub base: String,
    pub requests: mpsc::UnboundedReceiver<Captured>,
}

impl StubBackend {
    pub fn endpoint(&self) -> String {
        format!("{}/analyze-chat", self.base)
    }
}

/// Serve every request with `status` and `body`, after `delay`.
pub async fn spawn_backend(status: u16, body: &str, delay: Duration) -> StubBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::unbounded_channel();
    let body = body.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let tx = tx.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let head = loop {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Ok(Some(head)) = parse_head(&buf) {
                        break head;
                    }
                };
                while buf.len() < head.header_len + head.content_length {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                let content_type = header_value(&buf[..head.header_len], "content-type");
                let req_body = buf[head.header_len..].to_vec();
                let _ = tx.send(Captured {
                    method: head.method.clone(),
                    path: head.path.clone(),
                    content_type,
                    body: req_body,
                });

                tokio::time::sleep(delay).await;
                let resp = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes()).await;
            });
        }
    });

    StubBackend {
        base: format!("http://{addr}"),
        requests: rx,
    }
}

fn header_value(head: &[u8], name: &str) -> Option<String> {
    String::from_utf8_lossy(head).lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim().to_string())
    })
}

/// A base URL where nothing is listening.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}/analyze-chat")
}
