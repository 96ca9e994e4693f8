use mrag_llama::{LlamaClient, LlamaError, ServerPool};
use mrag_vector_store::{Embedder, Summarizer};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

struct Reply {
    status: &'static str,
    body: &'static str,
}

/// Minimal HTTP/1.1 server: answers every request by path and forwards
/// `(path, body)` of each request to the returned channel.
async fn spawn_server(
    route: fn(&str) -> Reply,
) -> (String, mpsc::UnboundedReceiver<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some((path, body)) = handle(stream, route).await {
                    let _ = tx.send((path, body));
                }
            });
        }
    });
    (format!("http://{addr}"), rx)
}

async fn handle(mut stream: TcpStream, route: fn(&str) -> Reply) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let path = head.split_whitespace().nth(1)?.to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let reply = route(&path);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()?;
    Some((path, body))
}

fn healthy_server(path: &str) -> Reply {
    match path {
        "/health" => Reply {
            status: "200 OK",
            body: r#"{"status":"ok"}"#,
        },
        "/v1/embeddings" => Reply {
            status: "200 OK",
            body: r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.25,-0.5,1.0]}]}"#,
        },
        "/v1/chat/completions" => Reply {
            status: "200 OK",
            body: r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"**Cats** are mammals."}}]}"#,
        },
        _ => Reply {
            status: "404 Not Found",
            body: r#"{"error":{"code":404,"message":"File Not Found"}}"#,
        },
    }
}

fn loading_server(path: &str) -> Reply {
    match path {
        "/health" => Reply {
            status: "503 Service Unavailable",
            body: r#"{"error":{"code":503,"message":"Loading model"}}"#,
        },
        _ => Reply {
            status: "400 Bad Request",
            body: r#"{"error":{"code":400,"message":"input is too large"}}"#,
        },
    }
}

#[tokio::test]
async fn client_sends_requests_and_parses_replies() {
    let (url, mut requests) = spawn_server(healthy_server).await;
    let client = LlamaClient::new(&url)
        .unwrap()
        .embedding_model("test-embed")
        .max_tokens(Some(64));

    assert_eq!(client.embedding("hello").await.unwrap(), vec![0.25, -0.5, 1.0]);
    let (path, body) = requests.recv().await.unwrap();
    assert_eq!(path, "/v1/embeddings");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["model"], "test-embed");
    assert_eq!(body["input"], "hello");

    assert_eq!(client.chat("Summarize").await.unwrap(), "**Cats** are mammals.");
    let (path, body) = requests.recv().await.unwrap();
    assert_eq!(path, "/v1/chat/completions");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Summarize");
    assert_eq!(body["max_tokens"], 64);

    assert!(client.health().await);
}

#[tokio::test]
async fn error_bodies_surface_code_and_message() {
    let (url, _requests) = spawn_server(loading_server).await;
    let client = LlamaClient::new(&url).unwrap();

    match client.embedding("x").await {
        Err(LlamaError::Server { code, message }) => {
            assert_eq!(code, 400);
            assert_eq!(message, "input is too large");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert!(!client.health().await);
}

#[tokio::test]
async fn pool_skips_unhealthy_servers() {
    let (loading, _a) = spawn_server(loading_server).await;
    let (healthy, _b) = spawn_server(healthy_server).await;
    let pool = ServerPool::new(
        "embedding",
        vec![
            LlamaClient::new(&loading).unwrap(),
            LlamaClient::new(&healthy).unwrap(),
        ],
        Duration::from_secs(15),
    );

    assert_eq!(pool.healthy().await.unwrap().base_url(), healthy);
    assert_eq!(pool.embed("x").await.unwrap(), vec![0.25, -0.5, 1.0]);
    assert_eq!(
        pool.summarize("prompt").await.unwrap(),
        "**Cats** are mammals."
    );
}
