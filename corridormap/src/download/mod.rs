//! Tile grid downloader.
//!
//! Computes the slippy-map tiles covering a corridor and fetches them into a
//! `{root}/{z}/{x}/{y}.png` cache with:
//!
//! - a fixed client-side delay before each request
//! - bounded concurrency (4 in flight per zoom level)
//! - resume by skipping non-empty cached files
//! - retry with status-dependent backoff ([`RetryPolicy`])
//!
//! The network layer is injected through [`TileTransport`].

mod downloader;
mod http;
mod progress;
mod retry;
mod state;

pub use downloader::{DownloaderConfig, TileDownloader, DEFAULT_BASE_URL, DEFAULT_WORKERS};
pub use http::{ReqwestTransport, TileTransport, TransportError, DEFAULT_TIMEOUT, USER_AGENT};
pub use progress::{ProgressCounter, DEFAULT_PROGRESS_INTERVAL};
pub use retry::{RetryDecision, RetryPolicy};
pub use state::{DownloadStats, TileOutcome};

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::coord::GeoBounds;

/// Errors that prevent a batch from starting.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to create HTTP transport: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Downloads a corridor from synchronous code.
///
/// Builds a multi-threaded tokio runtime and a [`ReqwestTransport`], then runs
/// [`TileDownloader::download_all`] to completion.
pub fn download_blocking(
    bounds: &GeoBounds,
    zoom_levels: &[u8],
    output_root: &Path,
    config: DownloaderConfig,
    timeout: Duration,
    cancel: Option<CancellationToken>,
) -> Result<DownloadStats, DownloadError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers.max(1))
        .enable_all()
        .build()?;

    let transport = ReqwestTransport::with_timeout(timeout)?;
    let mut downloader = TileDownloader::new(transport, config);
    if let Some(token) = cancel {
        downloader = downloader.with_cancellation(token);
    }

    Ok(runtime.block_on(downloader.download_all(bounds, zoom_levels, output_root)))
}
