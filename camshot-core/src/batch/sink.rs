//! Where per-sequence artifacts go.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{BatchError, BatchResult};

/// Output location reserved for one source sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTarget {
    pub id: String,
    pub dir: PathBuf,
}

#[async_trait]
pub trait ArtifactSink: Send {
    /// Reserve a fresh location named after `id`; never reuses an existing one.
    async fn create_target(&mut self, id: &str) -> BatchResult<SequenceTarget>;

    async fn write(&mut self, target: &SequenceTarget, name: &str, data: &[u8]) -> BatchResult<()>;

    /// Locations present in the output, including earlier runs.
    async fn target_count(&self) -> BatchResult<usize>;
}

/// Writes each sequence into its own folder below `root`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> BatchError {
    let path = path.to_path_buf();
    move |source| BatchError::Write { path, source }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn create_target(&mut self, id: &str) -> BatchResult<SequenceTarget> {
        // A name clash gets underscores appended until it is free.
        let mut name = id.to_string();
        while tokio::fs::try_exists(self.root.join(&name)).await.map_err(write_err(&self.root))? {
            name.push('_');
        }
        let dir = self.root.join(&name);
        tokio::fs::create_dir_all(&dir).await.map_err(write_err(&dir))?;
        debug!(target_dir = %dir.display(), "created output folder");
        Ok(SequenceTarget { id: name, dir })
    }

    async fn write(&mut self, target: &SequenceTarget, name: &str, data: &[u8]) -> BatchResult<()> {
        let path = target.dir.join(name);
        tokio::fs::write(&path, data).await.map_err(write_err(&path))
    }

    async fn target_count(&self) -> BatchResult<usize> {
        if !self.root.exists() { return Ok(0); }
        let read_err = |source| BatchError::Read { path: self.root.clone(), source };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(read_err)?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            if entry.file_type().await.map_err(read_err)?.is_dir() { count += 1; }
        }
        Ok(count)
    }
}
