//! Webhook HTTP(S) server: TCP listener, connection dispatch, routing.
//!
//! Routes `POST /validate` to the admission handler and `GET /healthz`
//! to a liveness probe. Requests are parsed with a bounded HTTP/1.1
//! reader; each connection serves one request and closes.

use std::fs::File;
use std::io::BufReader as StdBufReader;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::handler::{AdmissionHandler, BundlePuller, HandlerOutcome, MAX_BODY_BYTES};

/// Maximum total size of the request line plus headers (64 KiB).
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Start the webhook server and serve until the process exits.
pub async fn serve(cfg: WebhookConfig) -> Result<(), WebhookError> {
    let tls = build_tls_acceptor(&cfg)?;
    let listener = TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .map_err(|e| WebhookError::io(format!("bind port {}", cfg.port), e))?;
    tracing::info!(
        port = cfg.port,
        tls = tls.is_some(),
        "webhook listening"
    );

    let handler = Arc::new(AdmissionHandler::new(cfg));
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| WebhookError::io("accept connection", e))?;
        let handler = Arc::clone(&handler);
        let tls = tls.clone();
        tokio::spawn(async move {
            let served = match tls {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => handle_connection(tls_stream, &handler).await,
                    Err(e) => {
                        tracing::warn!(peer = %peer, error = %e, "TLS handshake failed");
                        return;
                    }
                },
                None => handle_connection(stream, &handler).await,
            };
            if let Err(e) = served {
                tracing::debug!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}

/// Serve a single HTTP/1.1 request on `stream`.
pub async fn handle_connection<S, P>(
    stream: S,
    handler: &AdmissionHandler<P>,
) -> Result<(), WebhookError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: BundlePuller,
{
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .map_err(|e| WebhookError::io("read request line", e))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let mut content_length = 0usize;
    let mut header_bytes = request_line.len();
    loop {
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| WebhookError::io("read header", e))?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
        header_bytes += n;
        if header_bytes > MAX_HEADER_BYTES {
            write_response(&mut reader, 431, "text/plain", b"header section too large").await?;
            return Ok(());
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    match (method.as_str(), path.as_str()) {
        ("GET", "/healthz") => {
            write_response(&mut reader, 200, "text/plain", b"ok").await?;
        }
        ("POST", "/validate") => {
            // The body is bounded; anything past the cap is cut off and
            // surfaces as a decode error under the fail-open policy.
            let mut body = vec![0u8; content_length.min(MAX_BODY_BYTES)];
            reader
                .read_exact(&mut body)
                .await
                .map_err(|e| WebhookError::io("read body", e))?;

            match handler.handle(&body).await {
                HandlerOutcome::Review(review) => {
                    let payload = serde_json::to_vec(&review)
                        .map_err(|e| WebhookError::Server(format!("encode response: {e}")))?;
                    write_response(&mut reader, 200, "application/json", &payload).await?;
                }
                HandlerOutcome::BadRequest(message) => {
                    write_response(&mut reader, 400, "text/plain", message.as_bytes()).await?;
                }
            }
        }
        _ => {
            write_response(&mut reader, 404, "text/plain", b"not found").await?;
        }
    }
    Ok(())
}

async fn write_response<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<(), WebhookError> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        431 => "Request Header Fields Too Large",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let inner = stream.get_mut();
    inner
        .write_all(head.as_bytes())
        .await
        .map_err(|e| WebhookError::io("write response head", e))?;
    inner
        .write_all(body)
        .await
        .map_err(|e| WebhookError::io("write response body", e))?;
    inner
        .flush()
        .await
        .map_err(|e| WebhookError::io("flush response", e))?;
    Ok(())
}

/// Build the TLS acceptor when both certificate and key are configured.
fn build_tls_acceptor(cfg: &WebhookConfig) -> Result<Option<TlsAcceptor>, WebhookError> {
    let (Some(cert_path), Some(key_path)) = (&cfg.tls_cert_path, &cfg.tls_key_path) else {
        return Ok(None);
    };

    let cert_file = File::open(cert_path)
        .map_err(|e| WebhookError::io(format!("open TLS cert {}", cert_path.display()), e))?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut StdBufReader::new(cert_file))
        .collect::<Result<_, _>>()
        .map_err(|e| WebhookError::Server(format!("parse TLS cert: {e}")))?;

    let key_file = File::open(key_path)
        .map_err(|e| WebhookError::io(format!("open TLS key {}", key_path.display()), e))?;
    let key = rustls_pemfile::private_key(&mut StdBufReader::new(key_file))
        .map_err(|e| WebhookError::Server(format!("parse TLS key: {e}")))?
        .ok_or_else(|| WebhookError::Server("TLS key file holds no private key".to_owned()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| WebhookError::Server(format!("build TLS config: {e}")))?;
    Ok(Some(TlsAcceptor::from(Arc::new(config))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_handler() -> AdmissionHandler<crate::handler::OciBundlePuller> {
        AdmissionHandler::new(WebhookConfig {
            registry_prefix: "ghcr.io/org/att".to_owned(),
            ..WebhookConfig::default()
        })
    }

    async fn roundtrip(request: &str) -> String {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let handler = plain_handler();

        let serve = tokio::spawn(async move {
            let _ = handle_connection(server, &handler).await;
        });

        let (mut read_half, mut write_half) = tokio::io::split(client);
        write_half
            .write_all(request.as_bytes())
            .await
            .expect("write request");
        drop(write_half);

        let mut response = Vec::new();
        read_half.read_to_end(&mut response).await.expect("read");
        serve.await.expect("join");
        String::from_utf8(response).expect("utf8")
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let response = roundtrip("GET /healthz HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("ok"));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = roundtrip("GET /metrics HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn unsupported_kind_becomes_400() {
        let body = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": { "uid": "u", "object": { "kind": "ConfigMap" } }
        })
        .to_string();
        let request = format!(
            "POST /validate HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let response = roundtrip(&request).await;
        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(response.contains("unsupported resource kind"));
    }

    #[tokio::test]
    async fn truncated_oversized_body_fails_decode() {
        // Advertise more than the cap but send exactly the cap; the
        // truncated body cannot decode and surfaces as a 400 when the
        // webhook is fail-closed.
        let padding = "x".repeat(MAX_BODY_BYTES);
        let request = format!(
            "POST /validate HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n{padding}",
            MAX_BODY_BYTES + 1
        );
        let response = roundtrip(&request).await;
        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(response.contains("decode admission review"));
    }

    #[tokio::test]
    async fn missing_tls_paths_disable_tls() {
        let acceptor = build_tls_acceptor(&WebhookConfig::default()).expect("build");
        assert!(acceptor.is_none());
    }
}
