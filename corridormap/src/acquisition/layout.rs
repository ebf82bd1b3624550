//! On-disk layout of acquired and processed data.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Directory tree under a data root:
///
/// ```text
/// <root>/raw/tiles
/// <root>/raw/dem
/// <root>/raw/osm
/// <root>/processed/heightmaps
/// <root>/processed/vectors
/// <root>/processed/vectors/unreal
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn tiles_dir(&self) -> PathBuf {
        self.raw_dir().join("tiles")
    }

    pub fn dem_dir(&self) -> PathBuf {
        self.raw_dir().join("dem")
    }

    pub fn osm_dir(&self) -> PathBuf {
        self.raw_dir().join("osm")
    }

    pub fn heightmaps_dir(&self) -> PathBuf {
        self.processed_dir().join("heightmaps")
    }

    pub fn vectors_dir(&self) -> PathBuf {
        self.processed_dir().join("vectors")
    }

    pub fn unreal_vectors_dir(&self) -> PathBuf {
        self.vectors_dir().join("unreal")
    }

    /// Every leaf directory of the layout.
    pub fn directories(&self) -> [PathBuf; 6] {
        [
            self.tiles_dir(),
            self.dem_dir(),
            self.osm_dir(),
            self.heightmaps_dir(),
            self.vectors_dir(),
            self.unreal_vectors_dir(),
        ]
    }

    /// Creates every directory. Safe to call repeatedly.
    pub fn ensure(&self) -> io::Result<()> {
        for dir in self.directories() {
            fs::create_dir_all(&dir)?;
        }
        debug!(root = %self.root.display(), "Data directories ready");
        Ok(())
    }
}
