//! Endpoint polling until the server answers on every configured interface.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};

/// Fixed delay between poll rounds.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Per-attempt timeout so one unresponsive endpoint cannot stall a round.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Block until every configured endpoint responds, or the token fires.
///
/// There is deliberately no retry bound: server startup time is
/// unpredictable, so the only way out of a server that never comes up is the
/// caller's cancellation, surfaced as [`Error::StartCancelled`]. Cancellation
/// aborts the wait only; the spawned process keeps running.
pub async fn wait_until_ready(endpoints: &Endpoints, token: &CancellationToken) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(Error::Probe)?;

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::StartCancelled),
        _ = poll_until_all_ready(&client, endpoints) => Ok(()),
    }
}

async fn poll_until_all_ready(client: &reqwest::Client, endpoints: &Endpoints) {
    loop {
        let mut all_ready = true;
        for (name, url) in endpoints.iter() {
            if !probe(client, url).await {
                tracing::debug!("endpoint {} not ready yet: {}", name, url);
                all_ready = false;
                break;
            }
        }
        if all_ready {
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// HTTP interfaces must answer a GET with a success status; anything else
/// (bolt) only needs to accept a TCP connection.
async fn probe(client: &reqwest::Client, url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => match client.get(url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        },
        _ => {
            let Some(host) = url.host_str() else {
                return false;
            };
            let Some(port) = url.port_or_known_default() else {
                return false;
            };
            matches!(
                tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await,
                Ok(Ok(_))
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal endpoint that always answers HTTP 200.
    async fn http_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 512];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                });
            }
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn ready_when_all_endpoints_answer() {
        let http = http_stub().await;

        // Bolt only needs a TCP accept, no HTTP response.
        let bolt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bolt = format!("bolt://{}", bolt_listener.local_addr().unwrap());
        tokio::spawn(async move {
            loop {
                let _ = bolt_listener.accept().await;
            }
        });

        let endpoints = Endpoints::parse(&http, Some(&bolt), None).unwrap();
        let token = CancellationToken::new();
        tokio::time::timeout(Duration::from_secs(5), wait_until_ready(&endpoints, &token))
            .await
            .expect("readiness should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn pre_cancelled_token_yields_start_cancelled() {
        let endpoints = Endpoints::parse("http://127.0.0.1:1/", None, None).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = wait_until_ready(&endpoints, &token).await.unwrap_err();
        assert!(matches!(err, Error::StartCancelled));
    }

    #[tokio::test]
    async fn cancellation_aborts_an_unready_wait() {
        // Nothing listens here; the wait can only end via the token.
        let endpoints = Endpoints::parse("http://127.0.0.1:1/", None, None).unwrap();
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
        let err = tokio::time::timeout(Duration::from_secs(5), wait_until_ready(&endpoints, &token))
            .await
            .expect("cancellation should end the wait")
            .unwrap_err();
        assert!(matches!(err, Error::StartCancelled));
    }
}
