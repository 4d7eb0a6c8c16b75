//! Full `generateContent` exchanges against a local one-shot HTTP server.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vr_domain::config::LlmConfig;
use vr_domain::error::{Error, ErrorKind};
use vr_domain::media::AssetPayload;
use vr_providers::{Credential, GenerationBackend, GenerationRequest, GoogleBackend, RequestKind};

/// What the fake server saw.
struct Captured {
    request_line: String,
    body: Value,
}

/// Serve exactly one request with `status` and `body`, then hand back what
/// the client sent.
async fn serve_once(
    status: &'static str,
    body: String,
) -> (String, tokio::task::JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        Captured {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            body: serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null),
        }
    });

    (base_url, handle)
}

fn backend(base_url: &str) -> GoogleBackend {
    let cfg: LlmConfig = serde_json::from_value(json!({
        "base_url": base_url,
        "model": "gemini-test",
        "timeout_ms": 5000
    }))
    .unwrap();
    GoogleBackend::from_config(&cfg).unwrap()
}

fn request() -> GenerationRequest {
    GenerationRequest {
        kind: RequestKind::Analysis,
        payload: AssetPayload {
            mime_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        },
        instruction: "Deconstruct the attached media.".into(),
        response_schema: json!({"type": "OBJECT"}),
    }
}

#[tokio::test]
async fn successful_exchange_returns_candidate_text() {
    let reply = json!({
        "candidates": [{
            "content": {"parts": [{"text": "{\"vibe_title\":\"Neon Drift\"}"}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 258, "candidatesTokenCount": 40, "totalTokenCount": 298}
    });
    let (base_url, server) = serve_once("200 OK", reply.to_string()).await;

    let credential = Credential::new("AIza-test-key").unwrap();
    let resp = backend(&base_url).generate(&request(), &credential).await.unwrap();

    assert_eq!(resp.text, "{\"vibe_title\":\"Neon Drift\"}");
    assert_eq!(resp.model, "gemini-test");
    assert_eq!(resp.usage.unwrap().total_tokens, 298);

    let seen = server.await.unwrap();
    assert!(seen.request_line.starts_with("POST /v1beta/models/gemini-test:generateContent?key=AIza-test-key"));
    assert_eq!(seen.body["contents"][0]["parts"][0]["inlineData"]["data"], "aGVsbG8=");
    assert_eq!(seen.body["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn error_status_carries_backend_diagnostic() {
    let reply = json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}});
    let (base_url, server) = serve_once("400 Bad Request", reply.to_string()).await;

    let credential = Credential::new("bad-key").unwrap();
    let err = backend(&base_url).generate(&request(), &credential).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    match &err {
        Error::Backend { provider, message } => {
            assert_eq!(provider, "google");
            assert_eq!(message, "HTTP 400 - API key not valid. Please pass a valid API key.");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let credential = Credential::new("AIzaSUPERSECRET").unwrap();
    let err = backend(&format!("http://{addr}"))
        .generate(&request(), &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(!err.to_string().contains("AIzaSUPERSECRET"), "credential leaked: {err}");
}

#[tokio::test]
async fn timeout_error_does_not_carry_the_credential() {
    // Accept the connection but never answer.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hold = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        drop(socket);
    });

    let cfg: LlmConfig = serde_json::from_value(json!({
        "base_url": format!("http://{addr}"),
        "model": "gemini-test",
        "timeout_ms": 200
    }))
    .unwrap();
    let credential = Credential::new("AIzaSUPERSECRET").unwrap();
    let err = GoogleBackend::from_config(&cfg)
        .unwrap()
        .generate(&request(), &credential)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)), "expected timeout, got {err:?}");
    assert!(!err.to_string().contains("AIzaSUPERSECRET"), "credential leaked: {err}");
    hold.abort();
}
