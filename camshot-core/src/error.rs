use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or sampling a keyframe curve.
#[derive(Debug, Error)]
pub enum CurveError {
    #[error("curve has no keyframes")] Empty,
    #[error("frame {frame} precedes the first keyframe at {first}")] OutOfRange { frame: f32, first: u32 },
    #[error("keyframes are not strictly ascending at index {index}")] Unsorted { index: usize },
    #[error("unexpected end of data while reading {what}")] Truncated { what: &'static str },
    #[error("not a VMD file: {0}")] BadHeader(String),
}

/// Failures surfaced by the batch driver and its collaborators.
///
/// Only [`BatchError::is_fatal`] errors end a run; everything else is scoped to
/// the sequence being processed and the driver moves on to the next one.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{file} not found in {}", folder.display())]
    MissingArtifact { folder: PathBuf, file: &'static str },
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid metadata in {}: {source}", path.display())]
    Metadata { path: PathBuf, source: serde_json::Error },
    #[error("failed to serialize shots: {0}")]
    Json(#[from] serde_json::Error),
    #[error("playback engine: {0}")]
    Engine(String),
}

impl BatchError {
    /// Missing source artifacts and failed writes stop the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BatchError::MissingArtifact { .. } | BatchError::Write { .. })
    }
}

pub type BatchResult<T> = Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_precondition_and_write_failures_are_fatal() {
        let missing = BatchError::MissingArtifact { folder: PathBuf::from("a"), file: "music.wav" };
        let write = BatchError::Write { path: PathBuf::from("a/shots_0.json"), source: std::io::ErrorKind::Other.into() };
        let read = BatchError::Read { path: PathBuf::from("a/camera.vmd"), source: std::io::ErrorKind::NotFound.into() };
        assert!(missing.is_fatal());
        assert!(write.is_fatal());
        assert!(!read.is_fatal());
        assert!(!BatchError::Curve(CurveError::Empty).is_fatal());
        assert!(!BatchError::Engine("not ready".into()).is_fatal());
    }

    #[test]
    fn messages_name_the_offending_file() {
        let e = BatchError::MissingArtifact { folder: PathBuf::from("songs/a"), file: "camera.vmd" };
        assert_eq!(e.to_string(), "camera.vmd not found in songs/a");
    }
}
