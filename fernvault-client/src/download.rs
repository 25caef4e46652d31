//! Destinations for downloaded results.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Receives the bytes of a finished submission under its download name.
pub trait DownloadSink: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> impl Future<Output = io::Result<PathBuf>> + Send;
}

/// Writes downloads into a directory, overwriting files of the same name.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let name = safe_filename(filename).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unusable download name {filename:?}"),
            )
        })?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        debug!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Keeps only the final path component of a server-supplied name.
///
/// Returns `None` for names that reduce to nothing (`""`, `".."`, `"dir/"`).
pub fn safe_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}
