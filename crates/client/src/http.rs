// Path: crates/client/src/http.rs

use crate::wire::{ThreatUpdate, UpdatesResponse};
use async_trait::async_trait;
use hma_api::feed::{FeedClient, FeedPage};
use hma_types::app::{Collaboration, Cursor, Update};
use hma_types::config::FeedEndpointConfig;
use hma_types::error::FeedError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Reads incremental updates from the remote feed's HTTP API.
pub struct HttpFeedClient {
    client: Client,
    base_url: String,
    app_id: u64,
    token: String,
}

impl HttpFeedClient {
    pub fn new(
        base_url: impl Into<String>,
        app_id: u64,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Permanent(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id,
            token: token.into(),
        })
    }

    /// Builds a client from configuration, reading the API token from the
    /// environment variable the configuration names.
    pub fn from_config(cfg: &FeedEndpointConfig) -> Result<Self, FeedError> {
        let token = std::env::var(&cfg.api_token_env).map_err(|_| {
            FeedError::Permanent(format!("API token variable {} is not set", cfg.api_token_env))
        })?;
        Self::new(
            cfg.base_url.clone(),
            cfg.app_id,
            token,
            Duration::from_secs(cfg.timeout_secs),
        )
    }
}

/// Sorts a non-success response into the three feed error classes.
pub(crate) fn classify_status(status: StatusCode, resume: Cursor, body: &str) -> FeedError {
    let snippet: String = body.trim().chars().take(160).collect();
    match status {
        StatusCode::GONE => FeedError::CursorExpired(resume),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            FeedError::Transient(format!("{}: {}", status, snippet))
        }
        s if s.is_server_error() => FeedError::Transient(format!("{}: {}", status, snippet)),
        _ => FeedError::Permanent(format!("{}: {}", status, snippet)),
    }
}

fn classify_transport(e: reqwest::Error) -> FeedError {
    if e.is_decode() || e.is_builder() {
        FeedError::Permanent(e.to_string())
    } else {
        FeedError::Transient(e.to_string())
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    fn app_id(&self) -> u64 {
        self.app_id
    }

    async fn fetch_incremental(
        &self,
        collaboration: &Collaboration,
        resume: Cursor,
        limit: usize,
    ) -> Result<FeedPage, FeedError> {
        let url = format!("{}/{}/threat_updates", self.base_url, collaboration.id);
        let resp = self
            .client
            .get(&url)
            .query(&[("start", resume.0.to_string()), ("limit", limit.to_string())])
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {}", self.token))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, resume, &body));
        }
        let page: UpdatesResponse = resp.json().await.map_err(classify_transport)?;

        let received = page.data.len();
        let updates: Vec<Update> = page
            .data
            .into_iter()
            .filter_map(ThreatUpdate::into_update)
            .collect();
        if updates.len() < received {
            tracing::debug!(
                target: "feed",
                collaboration = %collaboration.id,
                dropped = received - updates.len(),
                "dropped updates of unknown indicator types"
            );
        }
        Ok(FeedPage {
            updates,
            next_cursor: Cursor(page.next),
            reached_live_edge: page.live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hma_types::app::{SignalType, UpdateKind};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned response and returns the request line it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let resp = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            request
        });
        (base, handle)
    }

    fn collab() -> Collaboration {
        Collaboration::new(303636684709969, "Test", [SignalType::VideoMd5])
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":[{"id":"1","indicator":"aa","type":"HASH_VIDEO_MD5","position":41,"modified":true}],"next":41,"live":true}"#,
        )
        .await;
        let client = HttpFeedClient::new(base, 7, "secret", Duration::from_secs(5)).unwrap();

        let page = client.fetch_incremental(&collab(), Cursor(40), 100).await.unwrap();
        assert_eq!(page.updates.len(), 1);
        assert_eq!(page.updates[0].kind, UpdateKind::Modify);
        assert_eq!(page.next_cursor, Cursor(41));
        assert!(page.reached_live_edge);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /303636684709969/threat_updates?start=40&limit=100 "));
        assert!(request.to_ascii_lowercase().contains("authorization: oauth secret"));
    }

    #[tokio::test]
    async fn test_gone_means_cursor_expired() {
        let (base, _server) = serve_once("410 Gone", r#"{"error":"cursor too old"}"#).await;
        let client = HttpFeedClient::new(base, 7, "secret", Duration::from_secs(5)).unwrap();
        let err = client.fetch_incremental(&collab(), Cursor(5), 10).await.unwrap_err();
        assert_eq!(err, FeedError::CursorExpired(Cursor(5)));
    }

    #[test]
    fn test_status_classification() {
        let c = Cursor(1);
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, c, "").is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, c, "").is_transient());
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, c, "bad token"),
            FeedError::Permanent(ref m) if m.contains("bad token")
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, c, ""),
            FeedError::Permanent(_)
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            HttpFeedClient::new(format!("http://{}", addr), 7, "secret", Duration::from_secs(2)).unwrap();
        let err = client.fetch_incremental(&collab(), Cursor(0), 10).await.unwrap_err();
        assert!(err.is_transient());
    }
}
