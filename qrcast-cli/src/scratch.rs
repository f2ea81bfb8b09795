//! Per-run scratch directory
//!
//! Each run gets its own uniquely named directory, so concurrent runs never
//! share intermediate images. It is removed when the run ends unless the
//! caller asked to keep it.

use qrcast_core::constants::{FRAMES_DIR_NAME, RENDER_DIR_NAME};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// Scratch space for one encode or decode run
#[derive(Debug)]
pub struct Scratch {
    // Dropping the guard removes the directory
    _guard: Option<TempDir>,
    root: PathBuf,
}

impl Scratch {
    /// Create a fresh scratch directory under `base` (or the system temp dir)
    pub fn create(base: Option<&Path>, keep: bool) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("qrcast-");
        let dir = match base {
            Some(base) => {
                fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };

        fs::create_dir(dir.path().join(RENDER_DIR_NAME))?;
        fs::create_dir(dir.path().join(FRAMES_DIR_NAME))?;

        if keep {
            let root = dir.keep();
            info!("Keeping scratch directory {}", root.display());
            return Ok(Self { _guard: None, root });
        }

        Ok(Self {
            root: dir.path().to_path_buf(),
            _guard: Some(dir),
        })
    }

    /// Root of the scratch directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where rendered barcode images go
    pub fn render_dir(&self) -> PathBuf {
        self.root.join(RENDER_DIR_NAME)
    }

    /// Where frames extracted from a video go
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join(FRAMES_DIR_NAME)
    }
}
