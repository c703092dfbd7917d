use super::CoverError;
use crate::model::{Cover, CoverSize, DownloadProgress};
use futures::Future;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::sync::watch;
use tower::Service;
use tracing::debug;
use tracing::debug_span;
use tracing::Instrument;

/// Upper bound on the up-front buffer reservation taken from `Content-Length`.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct CoverDownloader {
    client: reqwest::Client,
}

impl CoverDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Debug)]
pub struct CoverDownloadRequest {
    pub(crate) cover: Cover,
    pub(crate) path: Option<PathBuf>,
    pub(crate) size: CoverSize,
    pub(crate) progress: Option<watch::Sender<DownloadProgress>>,
}

impl CoverDownloadRequest {
    pub fn new(cover: Cover) -> Self {
        Self {
            cover,
            path: None,
            size: CoverSize::Original,
            progress: None,
        }
    }

    /// Directory the image is written into. Without it the bytes are only kept in the blob.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn size(mut self, size: CoverSize) -> Self {
        self.size = size;
        self
    }

    /// Receives the byte count after every chunk.
    pub fn progress(mut self, progress: watch::Sender<DownloadProgress>) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl Service<CoverDownloadRequest> for CoverDownloader {
    type Response = Cover;
    type Error = CoverError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CoverDownloadRequest) -> Self::Future {
        let span = debug_span!("cover_downloader", id = %req.cover.id());
        let client = self.client.clone();
        Box::pin(download_cover(client, req).instrument(span))
    }
}

fn report(progress: &Option<watch::Sender<DownloadProgress>>, state: DownloadProgress) {
    if let Some(tx) = progress {
        tx.send_replace(state);
    }
}

async fn download_cover(
    client: reqwest::Client,
    req: CoverDownloadRequest,
) -> Result<Cover, CoverError> {
    let CoverDownloadRequest {
        mut cover,
        path,
        size,
        progress,
    } = req;
    let url = size.apply(cover.url());
    debug!(%url, "download");

    let mut response = client.get(&url).send().await?.error_for_status()?;
    let mut state = DownloadProgress::new(response.content_length().unwrap_or(0));
    report(&progress, state);

    let mut blob = Vec::with_capacity((*state.total()).min(MAX_PREALLOC) as usize);
    while let Some(chunk) = response.chunk().await? {
        blob.extend_from_slice(&chunk);
        state.advance(chunk.len() as u64);
        report(&progress, state);
    }

    if let Some(dir) = path {
        fs::create_dir_all(&dir)?;
        let file = dir.join(cover.file_name_with(size));
        debug!("Write {}", file.display());
        fs::write(file, &blob)?;
    }

    cover.set_blob(blob);
    Ok(cover)
}
