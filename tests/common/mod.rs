//! Shared utilities for integration testing.

// Not every integration test uses every helper.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;

use couch_gateway::discovery::{Instancer, MembershipEvent};

/// Start a mock backend on an OS-assigned port.
///
/// The handler receives the request method and path and returns a status and
/// JSON body. Connections are closed after one exchange, which keeps the
/// protocol handling trivial.
pub async fn start_mock_backend<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        // Read until the headers are complete, then drain the
                        // announced body so the client never sees a reset
                        // while still writing.
                        let mut raw = Vec::new();
                        let mut buf = vec![0u8; 8192];
                        let header_end = loop {
                            let n = socket.read(&mut buf).await.unwrap_or(0);
                            if n == 0 {
                                return;
                            }
                            raw.extend_from_slice(&buf[..n]);
                            if let Some(pos) = find_header_end(&raw) {
                                break pos;
                            }
                        };
                        let request = String::from_utf8_lossy(&raw[..header_end]).into_owned();
                        let body_len = content_length(&request);
                        while raw.len() < header_end + 4 + body_len {
                            let n = socket.read(&mut buf).await.unwrap_or(0);
                            if n == 0 {
                                break;
                            }
                            raw.extend_from_slice(&buf[..n]);
                        }

                        let mut parts = request.split_whitespace();
                        let method = parts.next().unwrap_or("").to_string();
                        let path = parts.next().unwrap_or("").to_string();

                        let (status, body) = handler(method, path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Hand-driven membership source: tests emit events explicitly.
#[derive(Default)]
pub struct ManualInstancer {
    subscribers: Mutex<Vec<UnboundedSender<MembershipEvent>>>,
}

impl ManualInstancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: MembershipEvent) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl Instancer for ManualInstancer {
    fn register(&self, subscriber: UnboundedSender<MembershipEvent>) {
        self.subscribers.lock().unwrap().push(subscriber);
    }
}
