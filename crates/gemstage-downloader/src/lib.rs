//! Gem downloading for gemstage.
//!
//! Downloads stream into a temporary file next to the destination and are
//! renamed into place only after the body has been fully received and, when
//! a checksum is known, verified. A failed download never leaves a partial
//! file under the destination name.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use futures::StreamExt;
use gemstage_core::{Checksum, ChecksumHasher, Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Download options.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Longest pause between reads; large bodies may take longer overall.
    pub read_timeout: Duration,
    /// Show progress bar.
    pub show_progress: bool,
    /// Verify against the expected checksum when one is given.
    pub verify_checksum: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            show_progress: false,
            verify_checksum: true,
        }
    }
}

/// Download result.
#[derive(Debug)]
pub struct DownloadResult {
    /// Path to downloaded file.
    pub path: PathBuf,
    /// SHA-256 of the received bytes.
    pub checksum: Checksum,
    /// Size in bytes.
    pub size: u64,
}

/// HTTP downloader with progress and checksum support.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    options: DownloadOptions,
}

impl Downloader {
    /// Create new downloader.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(options: DownloadOptions) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Registry(e.to_string()))?;

        Ok(Self { client, options })
    }

    /// Create with default options.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DownloadOptions::default())
    }

    /// Download `url` to `dest`, verifying against `expected` if given.
    ///
    /// There are no retries; a failure is reported to the caller as is.
    ///
    /// # Errors
    /// Returns [`Error::Registry`] on transport failure or a non-success
    /// status, [`Error::ChecksumMismatch`] if verification fails and
    /// [`Error::Io`] if the file cannot be written.
    pub async fn download(
        &self,
        url: &Url,
        dest: &Path,
        expected: Option<&Checksum>,
    ) -> Result<DownloadResult> {
        debug!(url = %url, dest = %dest.display(), "downloading");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::Registry(format!("downloading {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Registry(format!(
                "downloading {url}: HTTP {}",
                response.status()
            )));
        }

        let progress = self
            .options
            .show_progress
            .then(|| progress_bar(response.content_length()));

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| Error::io(&parent, e))?;

        // Must share a filesystem with `dest` for the final rename.
        let temp_file = NamedTempFile::new_in(&parent).map_err(|e| Error::io(&parent, e))?;
        let mut file =
            tokio::fs::File::from_std(temp_file.reopen().map_err(|e| Error::io(dest, e))?);
        let mut hasher = ChecksumHasher::new();
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Registry(format!("downloading {url}: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(dest, e))?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(ref pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush().await.map_err(|e| Error::io(dest, e))?;
        drop(file);

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let checksum = hasher.finalize();
        if self.options.verify_checksum
            && let Some(expected) = expected
            && *expected != checksum
        {
            return Err(Error::ChecksumMismatch {
                name: dest
                    .file_name()
                    .map_or_else(|| url.to_string(), |n| n.to_string_lossy().into_owned()),
                expected: expected.to_hex(),
                actual: checksum.to_hex(),
            });
        }

        temp_file
            .persist(dest)
            .map_err(|e| Error::io(dest, e.error))?;

        info!(url = %url, size = downloaded, sha256 = %checksum.short(), "download complete");

        Ok(DownloadResult {
            path: dest.to_path_buf(),
            checksum,
            size: downloaded,
        })
    }
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    let pb = ProgressBar::new(total.unwrap_or(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &[u8] = b"not really a gem";

    async fn serve(status: u16) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gems/demo-1.0.gem"))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(BODY.to_vec()))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/gems/demo-1.0.gem", server.uri())).unwrap();
        (server, url)
    }

    fn entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn download_options_default() {
        let opts = DownloadOptions::default();
        assert!(!opts.show_progress);
        assert!(opts.verify_checksum);
    }

    #[tokio::test]
    async fn downloads_and_verifies() {
        let (_server, url) = serve(200).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("demo-1.0.gem");
        let expected = Checksum::from_bytes(BODY);

        let result = Downloader::with_defaults()
            .unwrap()
            .download(&url, &dest, Some(&expected))
            .await
            .unwrap();

        assert_eq!(result.path, dest);
        assert_eq!(result.size, BODY.len() as u64);
        assert_eq!(result.checksum, expected);
        assert_eq!(std::fs::read(&dest).unwrap(), BODY);
        assert_eq!(entries(dir.path()), vec!["demo-1.0.gem".to_string()]);
    }

    #[tokio::test]
    async fn checksum_mismatch_leaves_nothing() {
        let (_server, url) = serve(200).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("demo-1.0.gem");
        let wrong = Checksum::from_bytes(b"something else");

        let err = Downloader::with_defaults()
            .unwrap()
            .download(&url, &dest, Some(&wrong))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ChecksumMismatch { ref name, .. } if name == "demo-1.0.gem"));
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn http_error_leaves_nothing() {
        let (_server, url) = serve(500).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("demo-1.0.gem");

        let err = Downloader::with_defaults()
            .unwrap()
            .download(&url, &dest, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Registry(ref m) if m.contains("500")));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn verification_can_be_disabled() {
        let (_server, url) = serve(200).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("demo-1.0.gem");
        let downloader = Downloader::new(DownloadOptions {
            verify_checksum: false,
            ..DownloadOptions::default()
        })
        .unwrap();

        downloader
            .download(&url, &dest, Some(&Checksum::from_bytes(b"other")))
            .await
            .unwrap();
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn stalled_server_hits_read_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(BODY.to_vec())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/gems/demo-1.0.gem", server.uri())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("demo-1.0.gem");
        let downloader = Downloader::new(DownloadOptions {
            read_timeout: Duration::from_millis(200),
            ..DownloadOptions::default()
        })
        .unwrap();

        let err = downloader.download(&url, &dest, None).await.unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
        assert!(entries(dir.path()).is_empty());
    }
}
