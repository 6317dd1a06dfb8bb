//! Release artifact fetching.
//!
//! One blocking request per URL, no retry. Callers decide which failures
//! are fatal; the only one that commonly is not is a 404 on the attestation
//! pointer.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use foundryup_schema::{ARTIFACT_NAME, Tag, Target};

/// A download failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection or non-404 HTTP failure.
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered 404.
    #[error("{0}: not found")]
    NotFound(String),

    /// Writing the download failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    fn http(url: &str, source: reqwest::Error) -> Self {
        if source.status() == Some(StatusCode::NOT_FOUND) {
            return Self::NotFound(url.to_string());
        }
        Self::Http {
            url: url.to_string(),
            source,
        }
    }
}

/// Transport for release artifacts.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Stream `url` into `dest`, returning the number of bytes written.
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;

    /// Fetch `url` as text.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Client with the foundryup user agent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        self.client
            .get(url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FetchError::http(url, e))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        tracing::debug!(url, dest = %dest.display(), "downloading");
        let response = self.get(url).await?;

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::http(url, e))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(downloaded)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "fetching");
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| FetchError::http(url, e))
    }
}

/// The three URLs published for one prebuilt release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseUrls {
    /// Binary archive (`.tar.gz`, or `.zip` on win32).
    pub archive: String,
    /// Text file whose first line links to the attestation artifact.
    pub attestation: String,
    /// Manual pages tarball.
    pub manuals: String,
}

impl ReleaseUrls {
    /// Build the URLs under `{base}/releases/download/{tag}/`.
    pub fn new(base: &str, tag: &Tag, version: &str, target: Target) -> Self {
        let release = format!("{}/releases/download/{tag}/", base.trim_end_matches('/'));
        let stem = format!(
            "{ARTIFACT_NAME}_{version}_{}_{}",
            target.platform, target.arch
        );

        Self {
            archive: format!("{release}{stem}.{}", target.platform.archive_ext()),
            attestation: format!("{release}{stem}.attestation.txt"),
            manuals: format!("{release}{ARTIFACT_NAME}_man_{version}.tar.gz"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundryup_schema::{Arch, Platform};
    use mockito::Server;

    #[test]
    fn release_urls_follow_template() {
        let urls = ReleaseUrls::new(
            "https://github.com/foundry-rs/foundry/",
            &Tag::from("v1.0.0"),
            "v1.0.0",
            Target::new(Platform::Linux, Arch::Amd64),
        );
        assert_eq!(
            urls.archive,
            "https://github.com/foundry-rs/foundry/releases/download/v1.0.0/foundry_v1.0.0_linux_amd64.tar.gz"
        );
        assert_eq!(
            urls.attestation,
            "https://github.com/foundry-rs/foundry/releases/download/v1.0.0/foundry_v1.0.0_linux_amd64.attestation.txt"
        );
        assert_eq!(
            urls.manuals,
            "https://github.com/foundry-rs/foundry/releases/download/v1.0.0/foundry_man_v1.0.0.tar.gz"
        );
    }

    #[test]
    fn windows_archive_is_zip() {
        let urls = ReleaseUrls::new(
            "https://example.com/r",
            &Tag::from("nightly"),
            "nightly",
            Target::new(Platform::Win32, Arch::Amd64),
        );
        assert!(urls.archive.ends_with("foundry_nightly_win32_amd64.zip"));
    }

    #[tokio::test]
    async fn fetch_text_returns_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/pointer.txt")
            .with_status(200)
            .with_body("https://example.com/attestations/1\n")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new();
        let body = fetcher
            .fetch_text(&format!("{}/pointer.txt", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "https://example.com/attestations/1\n");
    }

    #[tokio::test]
    async fn missing_resource_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let err = HttpFetcher::new()
            .fetch_text(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_is_http_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/boom")
            .with_status(500)
            .create_async()
            .await;

        let err = HttpFetcher::new()
            .fetch_text(&format!("{}/boom", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }

    #[tokio::test]
    async fn fetch_to_file_writes_bytes() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/archive.tar.gz")
            .with_status(200)
            .with_body(b"archive-bytes".as_slice())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("archive.tar.gz");
        let written = HttpFetcher::new()
            .fetch_to_file(&format!("{}/archive.tar.gz", server.url()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive-bytes");
    }
}
