//! Download outcome accounting.

use serde::Serialize;

/// Result of fetching one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    /// Fetched from the server and written to disk.
    Downloaded,
    /// Already present on disk; no request was made.
    Cached,
    /// Not found upstream, or retries were exhausted.
    Failed,
}

impl TileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded | Self::Cached)
    }
}

/// Aggregate counts across a batch.
///
/// `skipped` counts tiles that were already cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadStats {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl DownloadStats {
    /// Records one tile outcome.
    pub fn record(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Downloaded => self.success += 1,
            TileOutcome::Cached => self.skipped += 1,
            TileOutcome::Failed => self.failed += 1,
        }
    }

    /// Adds another batch's counts.
    pub fn merge(&mut self, other: &DownloadStats) {
        self.success += other.success;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    /// Total tiles accounted for.
    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
