use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::http::{FetchError, get_bytes};
use crate::prelude::*;

/// Maps a remote image reference to the name the rendered document should link to.
///
/// Resolution never fails: implementations fall back to returning the
/// original reference so that the document links to the remote copy instead.
pub trait AssetResolver {
    async fn resolve(&self, src: &str) -> String;
}

/// The local name for an image: the last path segment, without any query string.
pub fn attachment_name(src: &str) -> &str {
    let without_query = src.split('?').next().unwrap_or_default();
    without_query.rsplit('/').next().unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
enum AttachmentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not save the attachment: {0}")]
    Write(#[from] std::io::Error),
}

/// Downloads images into an attachments directory, at most once per file name.
///
/// Files already present on disk from an earlier run are reused as-is, and
/// every name resolved during this run (including failures) is remembered so
/// that repeated references don't touch the disk or network again.
pub struct AttachmentDownloader {
    directory: PathBuf,
    client: reqwest::Client,
    resolved: Mutex<HashMap<String, String>>,
    failures: AtomicUsize,
}

impl AttachmentDownloader {
    pub fn new(directory: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            directory: directory.into(),
            client,
            resolved: Mutex::new(HashMap::new()),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The number of images which could not be saved and were linked remotely instead.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    fn remembered(&self, name: &str) -> Option<String> {
        self.resolved
            .lock()
            .ok()
            .and_then(|resolved| resolved.get(name).cloned())
    }

    fn remember(&self, name: &str, resolved: &str) {
        if let Ok(mut known) = self.resolved.lock() {
            known.insert(name.to_string(), resolved.to_string());
        }
    }

    async fn download(&self, src: &str, name: &str) -> Result<(), AttachmentError> {
        let path = self.directory.join(name);
        if tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            debug!("Attachment '{name}' already exists, skipping download.");
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.directory).await?;
        let content = get_bytes(&self.client, src).await?;
        tokio::fs::write(&path, content).await?;

        debug!("Saved attachment '{}'.", path.display());
        Ok(())
    }
}

impl AssetResolver for AttachmentDownloader {
    async fn resolve(&self, src: &str) -> String {
        let name = attachment_name(src);
        if name.is_empty() {
            return src.to_string();
        }

        if let Some(known) = self.remembered(name) {
            return known;
        }

        let resolved = match self.download(src, name).await {
            Ok(()) => name.to_string(),
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "{src} download failed, linking to the remote image instead.");
                src.to_string()
            }
        };

        self.remember(name, &resolved);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[rstest]
    #[case("https://pic1.zhimg.com/v2-abc_720w.jpg", "v2-abc_720w.jpg")]
    #[case("https://x/y/pic.png?x=1", "pic.png")]
    #[case("https://x/y/pic.png?source=a/b", "pic.png")]
    #[case("pic.png", "pic.png")]
    #[case("https://x/y/", "")]
    #[case("", "")]
    fn test_attachment_name(#[case] src: &str, #[case] expected: &str) {
        assert_eq!(attachment_name(src), expected);
    }

    #[tokio::test]
    async fn test_downloads_once_per_name() {
        let mock_server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/y/pic.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let downloader = AttachmentDownloader::new(
            dir.path().join("attachments"),
            reqwest::Client::new(),
        );

        let src = format!("{}/y/pic.png?x=1", mock_server.uri());
        assert_eq!(downloader.resolve(&src).await, "pic.png");
        assert_eq!(downloader.resolve(&src).await, "pic.png");

        let other_query = format!("{}/y/pic.png?x=2", mock_server.uri());
        assert_eq!(downloader.resolve(&other_query).await, "pic.png");

        let saved = std::fs::read(dir.path().join("attachments").join("pic.png")).unwrap();
        assert_eq!(saved, b"PNGDATA");
        assert_eq!(downloader.failures(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_is_not_downloaded() {
        let mock_server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cached.jpg"), b"OLD").unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"NEW".to_vec()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let downloader = AttachmentDownloader::new(dir.path(), reqwest::Client::new());
        let src = format!("{}/img/cached.jpg", mock_server.uri());

        assert_eq!(downloader.resolve(&src).await, "cached.jpg");
        assert_eq!(std::fs::read(dir.path().join("cached.jpg")).unwrap(), b"OLD");
    }

    #[tokio::test]
    async fn test_failed_download_falls_back_to_source() {
        let mock_server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let downloader = AttachmentDownloader::new(dir.path().join("attachments"), reqwest::Client::new());
        let src = format!("{}/img/missing.gif", mock_server.uri());

        assert_eq!(downloader.resolve(&src).await, src);
        assert_eq!(downloader.resolve(&src).await, src);
        assert_eq!(downloader.failures(), 1);
        assert!(!dir.path().join("attachments").join("missing.gif").exists());
    }

    #[tokio::test]
    async fn test_empty_source_is_not_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = AttachmentDownloader::new(dir.path(), reqwest::Client::new());

        assert_eq!(downloader.resolve("").await, "");
        assert_eq!(downloader.failures(), 0);
    }
}
