//! Source discovery and per-sequence artifact layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BatchError, BatchResult};

pub const MOTION_FILE: &str = "motion.vmd";
pub const CAMERA_FILE: &str = "camera.vmd";
pub const AUDIO_FILE: &str = "music.wav";
pub const METADATA_FILE: &str = "metadata.json";

/// Every file a source folder must hold before it can be processed.
pub const REQUIRED_FILES: [&str; 4] = [MOTION_FILE, CAMERA_FILE, AUDIO_FILE, METADATA_FILE];

/// One candidate source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSequence {
    /// Folder name; also names the output folder.
    pub id: String,
    pub dir: PathBuf,
}

impl SourceSequence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let id = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self { id, dir }
    }

    pub fn motion_path(&self) -> PathBuf { self.dir.join(MOTION_FILE) }
    pub fn camera_path(&self) -> PathBuf { self.dir.join(CAMERA_FILE) }
    pub fn audio_path(&self) -> PathBuf { self.dir.join(AUDIO_FILE) }
    pub fn metadata_path(&self) -> PathBuf { self.dir.join(METADATA_FILE) }

    /// First required file that is missing, as a fatal error.
    pub fn check_complete(&self) -> BatchResult<()> {
        match REQUIRED_FILES.iter().find(|f| !self.dir.join(f).is_file()) {
            Some(file) => Err(BatchError::MissingArtifact { folder: self.dir.clone(), file: *file }),
            None => Ok(()),
        }
    }
}

/// All folders below `root` (not `root` itself) that hold a motion file,
/// sorted by path. Only the motion file marks a candidate; completeness is
/// checked later so that a half-copied folder stops the run.
pub async fn scan_sources(root: &Path) -> BatchResult<Vec<SourceSequence>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(read_err(&dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(read_err(&dir))? {
            let path = entry.path();
            if !entry.file_type().await.map_err(read_err(&path))?.is_dir() { continue; }
            if path.join(MOTION_FILE).is_file() {
                found.push(path.clone());
            }
            pending.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().map(SourceSequence::new).collect())
}

fn read_err(path: &Path) -> impl FnOnce(std::io::Error) -> BatchError {
    let path = path.to_path_buf();
    move |source| BatchError::Read { path, source }
}

/// Sidecar written upstream by triage. Unknown fields are carried through
/// untouched when the sidecar is copied to the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceMetadata {
    #[serde(default)]
    pub music_offset: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub async fn load_metadata(path: &Path) -> BatchResult<SequenceMetadata> {
    let data = tokio::fs::read(path).await.map_err(read_err(path))?;
    serde_json::from_slice(&data).map_err(|source| BatchError::Metadata { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, files: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for f in files {
            fs::write(dir.join(f), b"x").unwrap();
        }
    }

    #[tokio::test]
    async fn finds_nested_motion_folders_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("b"), &[MOTION_FILE]);
        touch(&tmp.path().join("a/inner"), &[MOTION_FILE, CAMERA_FILE]);
        touch(&tmp.path().join("c"), &[CAMERA_FILE]);
        touch(tmp.path(), &[MOTION_FILE]);

        let found = scan_sources(tmp.path()).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["inner", "b"]);
        assert_eq!(found[0].camera_path(), tmp.path().join("a/inner/camera.vmd"));
    }

    #[tokio::test]
    async fn missing_root_is_a_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = scan_sources(&tmp.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, BatchError::Read { .. }));
    }

    #[test]
    fn completeness_names_the_first_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("song");
        touch(&dir, &[MOTION_FILE, CAMERA_FILE, METADATA_FILE]);
        let seq = SourceSequence::new(&dir);
        match seq.check_complete() {
            Err(BatchError::MissingArtifact { file, folder }) => {
                assert_eq!(file, AUDIO_FILE);
                assert_eq!(folder, dir);
            }
            other => panic!("unexpected {:?}", other),
        }
        touch(&dir, &[AUDIO_FILE]);
        assert!(seq.check_complete().is_ok());
    }

    #[tokio::test]
    async fn metadata_keeps_unknown_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(METADATA_FILE);
        fs::write(&path, br#"{"music_offset":1.5,"title":"song"}"#).unwrap();
        let meta = load_metadata(&path).await.unwrap();
        assert_eq!(meta.music_offset, 1.5);
        assert_eq!(meta.fps, None);
        assert_eq!(meta.extra["title"], "song");

        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(load_metadata(&path).await, Err(BatchError::Metadata { .. })));
    }
}
