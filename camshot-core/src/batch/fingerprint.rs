//! Identity of already-processed camera files.
//!
//! The output tree keeps a copy of each processed `camera.vmd`; the set of
//! their fingerprints is rebuilt from disk at the start of every run, so a
//! crashed or cancelled run resumes without any checkpoint file.
//!
//! Notes
//! - `ByteLength` is weak: two different cameras of equal size collide and
//!   the second is skipped. It stays the default so existing output trees
//!   keep deduplicating the same way.
//! - `Sha256` hashes the file contents instead.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::scan::CAMERA_FILE;
use crate::error::{BatchError, BatchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FingerprintMode {
    #[default]
    ByteLength,
    Sha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    ByteLength(u64),
    Sha256([u8; 32]),
}

impl FingerprintMode {
    pub fn of_bytes(self, data: &[u8]) -> Fingerprint {
        match self {
            FingerprintMode::ByteLength => Fingerprint::ByteLength(data.len() as u64),
            FingerprintMode::Sha256 => Fingerprint::Sha256(Sha256::digest(data).into()),
        }
    }

    /// Byte-length fingerprints only stat the file.
    pub async fn of_file(self, path: &Path) -> BatchResult<Fingerprint> {
        let read_err = |source| BatchError::Read { path: path.to_path_buf(), source };
        match self {
            FingerprintMode::ByteLength => Ok(Fingerprint::ByteLength(tokio::fs::metadata(path).await.map_err(read_err)?.len())),
            FingerprintMode::Sha256 => Ok(self.of_bytes(&tokio::fs::read(path).await.map_err(read_err)?)),
        }
    }
}

/// Append-only during a run.
#[derive(Debug, Clone)]
pub struct FingerprintSet {
    mode: FingerprintMode,
    seen: HashSet<Fingerprint>,
}

impl FingerprintSet {
    pub fn new(mode: FingerprintMode) -> Self { Self { mode, seen: HashSet::new() } }

    /// Fingerprints of every `camera.vmd` anywhere under `root`. A missing
    /// root is an empty set: nothing has been processed yet.
    pub async fn from_output_tree(root: &Path, mode: FingerprintMode) -> BatchResult<Self> {
        let mut set = Self::new(mode);
        if !root.exists() { return Ok(set); }

        let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let read_err = |source| BatchError::Read { path: dir.clone(), source };
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(read_err)?;
            while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
                let path = entry.path();
                let kind = entry.file_type().await.map_err(read_err)?;
                if kind.is_dir() {
                    pending.push(path);
                } else if entry.file_name() == CAMERA_FILE {
                    set.insert(mode.of_file(&path).await?);
                }
            }
        }
        Ok(set)
    }

    pub fn mode(&self) -> FingerprintMode { self.mode }
    pub fn contains(&self, fp: &Fingerprint) -> bool { self.seen.contains(fp) }
    /// `false` if it was already present.
    pub fn insert(&mut self, fp: Fingerprint) -> bool { self.seen.insert(fp) }
    pub fn len(&self) -> usize { self.seen.len() }
    pub fn is_empty(&self) -> bool { self.seen.is_empty() }
}
