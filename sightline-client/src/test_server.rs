//! One-shot HTTP server for client tests
//!
//! Answers requests in arrival order with a fixed list of replies and records
//! what it received. Only understands `Content-Length` bodies, which is all
//! the client sends.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::TOKEN_HEADER;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub token: Option<String>,
    pub body: Vec<u8>,
}

pub struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body: body.to_vec(),
        }
    }

    pub fn status(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: message.as_bytes().to_vec(),
        }
    }
}

/// Starts the server and returns its base URL and the request record
pub async fn serve(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let record = recorded.clone();

    tokio::spawn(async move {
        let mut replies = replies.into_iter();
        while let Ok((stream, _)) = listener.accept().await {
            let mut reader = BufReader::new(stream);

            loop {
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                    break;
                }
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let target = parts.next().unwrap_or_default().to_string();

                let mut length = 0;
                let mut token = None;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).await.unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            length = value.trim().parse().unwrap();
                        } else if name.eq_ignore_ascii_case(TOKEN_HEADER) {
                            token = Some(value.trim().to_string());
                        }
                    }
                }

                let mut body = vec![0u8; length];
                reader.read_exact(&mut body).await.unwrap();
                record.lock().unwrap().push(Recorded {
                    method,
                    target,
                    token,
                    body,
                });

                let reply = replies
                    .next()
                    .unwrap_or_else(|| Reply::status(500, "no reply left"));
                let head = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
                    reply.status,
                    reply.content_type,
                    reply.body.len()
                );
                let stream = reader.get_mut();
                stream.write_all(head.as_bytes()).await.unwrap();
                stream.write_all(&reply.body).await.unwrap();
                stream.flush().await.unwrap();
            }
        }
    });

    (format!("http://{}", addr), recorded)
}
