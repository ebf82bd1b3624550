//! Concurrent, rate-limited, resumable tile downloader.

use std::path::{Path, PathBuf};

use futures::future;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::http::TileTransport;
use super::progress::{ProgressCounter, DEFAULT_PROGRESS_INTERVAL};
use super::retry::{RetryDecision, RetryPolicy};
use super::state::{DownloadStats, TileOutcome};
use crate::coord::{tile_bounds, CoordError, GeoBounds, TileCoord};

/// Default tile server.
pub const DEFAULT_BASE_URL: &str = "https://tile.openstreetmap.org";

/// Default number of concurrent fetches per zoom level.
pub const DEFAULT_WORKERS: usize = 4;

/// Downloader settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloaderConfig {
    /// Server root; tiles are fetched from `{base_url}/{z}/{x}/{y}.png`
    pub base_url: String,
    /// Concurrent fetches per zoom level
    pub workers: usize,
    /// Completions between progress log lines
    pub progress_interval: usize,
    pub retry: RetryPolicy,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            workers: DEFAULT_WORKERS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches slippy-map tiles into a `{root}/{z}/{x}/{y}.png` cache.
pub struct TileDownloader<T: TileTransport> {
    transport: T,
    config: DownloaderConfig,
    cancel: Option<CancellationToken>,
}

impl<T: TileTransport> TileDownloader<T> {
    pub fn new(transport: T, config: DownloaderConfig) -> Self {
        Self {
            transport,
            config,
            cancel: None,
        }
    }

    /// Attaches a token checked before each tile is dispatched.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Every tile in the inclusive range covering `bounds` at `zoom`.
    pub fn tiles_for(&self, bounds: &GeoBounds, zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
        Ok(tile_bounds(bounds, zoom)?.tiles().collect())
    }

    /// Fetches a single tile into `output_root`.
    ///
    /// A non-empty file already at the target path is reported as
    /// [`TileOutcome::Cached`] without touching the network.
    pub async fn fetch_one(&self, tile: TileCoord, output_root: &Path) -> TileOutcome {
        let path = output_root.join(tile.relative_path());
        if is_cached(&path).await {
            debug!(tile = %tile, "Tile already cached");
            return TileOutcome::Cached;
        }

        let url = tile.url(&self.config.base_url);
        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            tokio::time::sleep(policy.rate_limit_delay).await;

            let error = match self.transport.get(&url).await {
                Ok(bytes) => {
                    return match write_tile(&path, &bytes).await {
                        Ok(()) => {
                            debug!(tile = %tile, bytes = bytes.len(), "Tile downloaded");
                            TileOutcome::Downloaded
                        }
                        Err(e) => {
                            warn!(
                                tile = %tile,
                                path = %path.display(),
                                error = %e,
                                "Failed to write tile"
                            );
                            TileOutcome::Failed
                        }
                    };
                }
                Err(e) => e,
            };

            match policy.classify(&error, attempt) {
                RetryDecision::Retry { after } => {
                    debug!(
                        tile = %tile,
                        attempt = attempt + 1,
                        error = %error,
                        backoff_ms = after.as_millis() as u64,
                        "Retrying tile"
                    );
                    if !after.is_zero() {
                        tokio::time::sleep(after).await;
                    }
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    warn!(tile = %tile, attempts = attempt + 1, error = %error, "Tile failed");
                    return TileOutcome::Failed;
                }
            }
        }
    }

    /// Downloads every tile covering `bounds` at each zoom level.
    ///
    /// Zoom levels run one after another; within a level up to `workers`
    /// fetches are in flight. Tile failures never abort the batch, and an
    /// invalid zoom level is logged and skipped.
    pub async fn download_all(
        &self,
        bounds: &GeoBounds,
        zoom_levels: &[u8],
        output_root: &Path,
    ) -> DownloadStats {
        let mut stats = DownloadStats::default();

        for &zoom in zoom_levels {
            if self.is_cancelled() {
                info!(zoom, "Download cancelled before zoom level");
                break;
            }

            let tiles = match self.tiles_for(bounds, zoom) {
                Ok(tiles) => tiles,
                Err(e) => {
                    warn!(zoom, error = %e, "Skipping zoom level");
                    continue;
                }
            };

            info!(zoom, tiles = tiles.len(), "Downloading zoom level");
            let level = self.download_level(tiles, output_root).await;
            info!(
                zoom,
                success = level.success,
                failed = level.failed,
                skipped = level.skipped,
                "Zoom level complete"
            );
            stats.merge(&level);
        }

        stats
    }

    async fn download_level(&self, tiles: Vec<TileCoord>, output_root: &Path) -> DownloadStats {
        let progress = ProgressCounter::new(tiles.len(), self.config.progress_interval);
        let mut stats = DownloadStats::default();

        let mut results = stream::iter(tiles)
            .take_while(|_| future::ready(!self.is_cancelled()))
            .map(|tile| self.fetch_one(tile, output_root))
            .buffer_unordered(self.config.workers.max(1));

        while let Some(outcome) = results.next().await {
            stats.record(outcome);
            if let Some(done) = progress.record() {
                info!(
                    completed = done,
                    total = progress.total(),
                    percent = format_args!("{:.1}", progress.percent()),
                    "Tile progress"
                );
            }
        }

        stats
    }
}

async fn is_cached(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Writes to `{y}.png.tmp` and renames it into place, so an interrupted
/// write never leaves a partial tile that would later count as cached.
async fn write_tile(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path(path);
    let written = match tokio::fs::write(&temp_path, bytes).await {
        Ok(()) => tokio::fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    written
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
