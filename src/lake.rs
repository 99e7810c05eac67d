//! Price lake layout on disk
//!
//! Observations are stored as parquet files laid out hive-style under a
//! single root: `<root>/ticker=<TICKER>/date=<YYYY-MM-DD>/*.parquet`. This
//! module only knows about the directory tree; the SQL that reads and writes
//! the files lives in the db layer.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle on the lake root directory.
#[derive(Debug, Clone)]
pub struct PriceLake {
    root: PathBuf,
}

impl PriceLake {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Recursive glob covering every partition file under the root.
    pub fn glob(&self) -> PathBuf {
        self.root.join("**").join("*.parquet")
    }

    /// Every partition file currently in the lake, sorted by path.
    ///
    /// A root that does not exist yet reads as an empty lake rather than an
    /// error, so first-run queries degrade instead of failing.
    pub fn parquet_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            collect_parquet(&self.root, &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

fn collect_parquet(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_parquet(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "parquet") {
            out.push(path);
        }
    }
    Ok(())
}
