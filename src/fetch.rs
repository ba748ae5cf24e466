//! Raw document retrieval for local and network locators.
//!
//! A locator starting with `file://` is read from disk; anything else is
//! fetched with an HTTP GET. Both paths are bounded by a byte ceiling. Every
//! failure surfaces as a [`FetchError`], which the pipeline logs and skips.

use async_trait::async_trait;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::config::FetchConfig;

/// Locator prefix selecting the local filesystem.
pub const FILE_SCHEME: &str = "file://";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("empty body")]
    Empty,
    #[error("body of {size} bytes reaches the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

/// Retrieves raw bytes for a locator.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `locator`, never returning `size_limit` bytes or more.
    async fn fetch(&self, locator: &str, size_limit: usize) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher: local files plus HTTP(S) via `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_remote(&self, url: &str, size_limit: usize) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::Empty);
        }
        if body.len() >= size_limit {
            return Err(FetchError::TooLarge {
                size: body.len(),
                limit: size_limit,
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &str, size_limit: usize) -> Result<Vec<u8>, FetchError> {
        match locator.strip_prefix(FILE_SCHEME) {
            Some(path) => read_bounded(Path::new(path), size_limit),
            None => self.fetch_remote(locator, size_limit).await,
        }
    }
}

/// Read at most `size_limit - 1` bytes of a local file.
///
/// Longer files are truncated at the ceiling with a warning.
pub fn read_bounded(path: &Path, size_limit: usize) -> Result<Vec<u8>, FetchError> {
    let io_err = |source| FetchError::Io {
        path: path.display().to_string(),
        source,
    };

    let cap = size_limit.saturating_sub(1);
    let file = std::fs::File::open(path).map_err(io_err)?;
    let mut buf = Vec::new();
    file.take(cap as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(io_err)?;

    if buf.len() > cap {
        warn!(
            path = %path.display(),
            limit = size_limit,
            "file exceeds size limit; truncated"
        );
        buf.truncate(cap);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tempfile::TempDir;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_local_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        std::fs::write(&path, "<p>hello</p>").unwrap();

        let locator = format!("file://{}", path.display());
        let bytes = fetcher(30).fetch(&locator, 1024).await.unwrap();
        assert_eq!(bytes, b"<p>hello</p>");
    }

    #[tokio::test]
    async fn test_local_file_truncated_below_limit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.txt");
        std::fs::write(&path, "0123456789").unwrap();

        let locator = format!("file://{}", path.display());
        let bytes = fetcher(30).fetch(&locator, 5).await.unwrap();
        assert_eq!(bytes, b"0123");
    }

    #[tokio::test]
    async fn test_local_missing_file() {
        let err = fetcher(30)
            .fetch("file:///definitely/not/here.html", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn test_remote_ok() {
        let base = serve(Router::new().route("/page", get(|| async { "<h1>ok</h1>" }))).await;
        let bytes = fetcher(30)
            .fetch(&format!("{}/page", base), 1024)
            .await
            .unwrap();
        assert_eq!(bytes, b"<h1>ok</h1>");
    }

    #[tokio::test]
    async fn test_remote_sends_user_agent() {
        let app = Router::new().route(
            "/ua",
            get(|headers: axum::http::HeaderMap| async move {
                headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );
        let base = serve(app).await;
        let bytes = fetcher(30)
            .fetch(&format!("{}/ua", base), 1024)
            .await
            .unwrap();
        assert_eq!(bytes, b"osdev-dataset-builder/1.0");
    }

    #[tokio::test]
    async fn test_remote_follows_redirect() {
        let app = Router::new()
            .route(
                "/old",
                get(|| async { axum::response::Redirect::temporary("/new") }),
            )
            .route("/new", get(|| async { "moved here" }));
        let base = serve(app).await;
        let bytes = fetcher(30)
            .fetch(&format!("{}/old", base), 1024)
            .await
            .unwrap();
        assert_eq!(bytes, b"moved here");
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let app = Router::new().route("/gone", get(|| async { (StatusCode::NOT_FOUND, "nope") }));
        let base = serve(app).await;
        let err = fetcher(30)
            .fetch(&format!("{}/gone", base), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s == StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_remote_empty_body() {
        let base = serve(Router::new().route("/empty", get(|| async { "" }))).await;
        let err = fetcher(30)
            .fetch(&format!("{}/empty", base), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Empty));
    }

    #[tokio::test]
    async fn test_remote_body_at_limit_rejected() {
        let base = serve(Router::new().route("/big", get(|| async { "x".repeat(16) }))).await;
        let err = fetcher(30)
            .fetch(&format!("{}/big", base), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { size: 16, limit: 16 }));

        let ok = fetcher(30)
            .fetch(&format!("{}/big", base), 17)
            .await
            .unwrap();
        assert_eq!(ok.len(), 16);
    }

    #[tokio::test]
    async fn test_remote_timeout() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = serve(app).await;
        let err = fetcher(1)
            .fetch(&format!("{}/slow", base), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = fetcher(5)
            .fetch(&format!("http://{}/", addr), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
