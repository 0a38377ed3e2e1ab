//! Batch driver: turns a tree of source folders into augmented shot files.
//!
//! A run moves through `Scanning`, then for each candidate `Validating`,
//! `Extracting` and `Augmenting`, and ends in `Done`.
//!
//! Notes
//! - A candidate missing a required file, or any failed write, ends the run.
//!   Output already on disk stays; the next run skips it by fingerprint.
//! - Any other failure is logged and reported, and the run moves on.
//! - A fingerprint is recorded before the candidate is processed, so a
//!   candidate the quality gate rejects is not retried within the run.
//!   Nothing is written for it, and fingerprints are rebuilt from the output
//!   tree, so the next run checks it again.
//! - Cancellation is checked between candidates only.

pub mod fingerprint;
pub mod progress;
pub mod scan;
pub mod sink;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::anchor::PlaybackEngine;
use crate::augment;
use crate::config::BatchConfig;
use crate::error::{BatchError, BatchResult};
use crate::rig::CameraRig;
use crate::shot::{segment, GateVerdict, SegmentOptions};
pub use fingerprint::{Fingerprint, FingerprintMode, FingerprintSet};
pub use progress::{ProgressSink, TracingProgress};
pub use scan::{scan_sources, SourceSequence};
pub use sink::{ArtifactSink, DirectorySink, SequenceTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Scanning,
    Validating,
    Extracting,
    Augmenting,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    /// Sequences written this run.
    pub processed: usize,
    pub already_processed: usize,
    pub gated: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// Folders in the output tree after the run, earlier runs included.
    pub output_folders: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Processed {} folders.", self.output_folders)
    }
}

/// Result of one candidate that did not fail.
#[derive(Debug)]
enum Outcome {
    Written { target: SequenceTarget, shots: usize },
    Gated(GateVerdict),
}

/// Count candidate folders without processing them.
pub async fn scan(config: &BatchConfig) -> BatchResult<usize> {
    Ok(scan_sources(&config.source_root).await?.len())
}

pub fn scan_message(count: usize) -> String { format!("Found {} folders. Ready to process.", count) }

pub struct BatchDriver<E, S, P> {
    config: BatchConfig,
    engine: E,
    sink: S,
    progress: P,
    cancel: Arc<AtomicBool>,
    phase: RunPhase,
}

impl<E, S, P> BatchDriver<E, S, P>
where
    E: PlaybackEngine,
    S: ArtifactSink,
    P: ProgressSink,
{
    pub fn new(config: BatchConfig, engine: E, sink: S, progress: P) -> Self {
        Self { config, engine, sink, progress, cancel: Arc::new(AtomicBool::new(false)), phase: RunPhase::Scanning }
    }

    /// Set to stop the run before the next candidate.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> { self.cancel.clone() }

    pub fn phase(&self) -> RunPhase { self.phase }

    pub fn config(&self) -> &BatchConfig { &self.config }

    pub async fn run(&mut self) -> BatchResult<RunSummary> {
        self.phase = RunPhase::Scanning;
        let candidates = scan_sources(&self.config.source_root).await?;
        let mut seen = FingerprintSet::from_output_tree(&self.config.output_root, self.config.fingerprint).await?;
        info!(candidates = candidates.len(), known = seen.len(), "scan complete");

        let total = candidates.len();
        let mut summary = RunSummary { candidates: total, ..Default::default() };
        for (index, source) in candidates.iter().enumerate() {
            if self.config.first_only && index > 0 { break; }
            if self.cancel.load(Ordering::SeqCst) {
                info!(index, total, "run cancelled");
                summary.cancelled = true;
                break;
            }
            self.progress.report_progress(index, total);

            self.phase = RunPhase::Validating;
            if let Err(e) = source.check_complete() {
                return Err(self.fail(e));
            }
            let fp = match self.config.fingerprint.of_file(&source.camera_path()).await {
                Ok(fp) => fp,
                Err(e) => {
                    self.skip(&source.id, &e);
                    summary.failed += 1;
                    continue;
                }
            };
            if !seen.insert(fp) {
                debug!(sequence = %source.id, "already processed");
                summary.already_processed += 1;
                continue;
            }

            match self.process(source).await {
                Ok(Outcome::Written { target, shots }) => {
                    info!(sequence = %source.id, target = %target.dir.display(), shots, "sequence written");
                    summary.processed += 1;
                }
                Ok(Outcome::Gated(verdict)) => {
                    warn!(sequence = %source.id, %verdict, "skipping sequence");
                    summary.gated += 1;
                }
                Err(e) if e.is_fatal() => return Err(self.fail(e)),
                Err(e) => {
                    self.skip(&source.id, &e);
                    summary.failed += 1;
                }
            }
        }

        self.phase = RunPhase::Done;
        summary.output_folders = self.sink.target_count().await?;
        self.progress.report_done(&summary.to_string());
        Ok(summary)
    }

    async fn process(&mut self, source: &SourceSequence) -> BatchResult<Outcome> {
        let mut metadata = scan::load_metadata(&source.metadata_path()).await?;
        let frame_rate = metadata.fps.map(|fps| fps as f32).unwrap_or(self.config.frame_rate);
        let curve = self.engine.load(source).await?;

        let verdict = self.config.gate.check(&curve, frame_rate);
        if !verdict.accepted() {
            return Ok(Outcome::Gated(verdict));
        }

        self.phase = RunPhase::Extracting;
        let options = SegmentOptions { frame_rate, include_final_pair: self.config.include_final_pair, rig: CameraRig::MMD };
        let shots = segment(&mut self.engine, &curve, &source.id, &options).await?;
        debug!(sequence = %source.id, shots = shots.len(), cuts = curve.jump_cuts(), "extracted");

        self.phase = RunPhase::Augmenting;
        let camera = tokio::fs::read(source.camera_path())
            .await
            .map_err(|e| BatchError::Read { path: source.camera_path(), source: e })?;
        metadata.fps.get_or_insert(frame_rate.round() as u32);
        let metadata = serde_json::to_vec(&metadata)?;

        let target = self.sink.create_target(&source.id).await?;
        self.sink.write(&target, scan::CAMERA_FILE, &camera).await?;
        self.sink.write(&target, scan::METADATA_FILE, &metadata).await?;
        for (variant, seq) in augment::variants(&shots) {
            self.sink.write(&target, &variant.file_name(), &seq.to_json()?).await?;
            if self.config.write_yield {
                tokio::task::yield_now().await;
            }
        }
        Ok(Outcome::Written { target, shots: shots.len() })
    }

    fn skip(&mut self, id: &str, e: &BatchError) {
        error!(sequence = id, error = %e, "sequence failed; skipping");
        self.progress.report_error(&format!("{}: {}", id, e));
    }

    fn fail(&mut self, e: BatchError) -> BatchError {
        error!(error = %e, "run aborted");
        self.progress.report_error(&e.to_string());
        self.phase = RunPhase::Done;
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::progress::{ProgressEvent, RecordingProgress};
    use crate::shot::segment::tests::{keys, ScriptedEngine};
    use crate::shot::QualityGate;
    use std::fs;
    use std::path::Path;

    fn source(root: &Path, name: &str, camera_len: usize) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(scan::MOTION_FILE), b"m").unwrap();
        fs::write(dir.join(scan::CAMERA_FILE), vec![7u8; camera_len]).unwrap();
        fs::write(dir.join(scan::AUDIO_FILE), b"w").unwrap();
        fs::write(dir.join(scan::METADATA_FILE), br#"{"music_offset":0.0}"#).unwrap();
    }

    fn config(root: &Path) -> BatchConfig {
        BatchConfig {
            source_root: root.join("in"),
            output_root: root.join("out"),
            gate: QualityGate::DISABLED,
            write_yield: false,
            ..Default::default()
        }
    }

    fn driver(cfg: BatchConfig, frames: &[u32]) -> BatchDriver<ScriptedEngine, DirectorySink, RecordingProgress> {
        let engine = ScriptedEngine { curve: keys(frames), ..Default::default() };
        let sink = DirectorySink::new(&cfg.output_root);
        BatchDriver::new(cfg, engine, sink, RecordingProgress::default())
    }

    #[tokio::test]
    async fn writes_variants_and_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "song", 100);
        let mut d = driver(config(tmp.path()), &[0, 30, 90, 120]);
        let summary = d.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.to_string(), "Processed 1 folders.");
        assert_eq!(d.phase(), RunPhase::Done);
        let out = tmp.path().join("out/song");
        assert_eq!(fs::read_dir(&out).unwrap().count(), 74);
        assert_eq!(fs::read(out.join("camera.vmd")).unwrap(), vec![7u8; 100]);
        let meta: serde_json::Value = serde_json::from_slice(&fs::read(out.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(meta["fps"], 30);
        let shots: Vec<serde_json::Value> = serde_json::from_slice(&fs::read(out.join("shots_flip_350.json")).unwrap()).unwrap();
        assert_eq!(shots.len(), 2);
    }

    #[tokio::test]
    async fn second_run_skips_by_fingerprint() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        source(&tmp.path().join("in"), "b", 200);
        let summary = driver(config(tmp.path()), &[0, 30, 90]).run().await.unwrap();
        assert_eq!(summary.processed, 2);

        let again = driver(config(tmp.path()), &[0, 30, 90]).run().await.unwrap();
        assert_eq!(again.processed, 0);
        assert_eq!(again.already_processed, 2);
        assert_eq!(again.output_folders, 2);
    }

    #[tokio::test]
    async fn equal_sizes_collide_unless_hashed() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        source(&tmp.path().join("in"), "b", 100);
        fs::write(tmp.path().join("in/b/camera.vmd"), vec![8u8; 100]).unwrap();

        let summary = driver(config(tmp.path()), &[0, 30, 90]).run().await.unwrap();
        assert_eq!((summary.processed, summary.already_processed), (1, 1));

        let cfg = BatchConfig { fingerprint: FingerprintMode::Sha256, output_root: tmp.path().join("hashed"), ..config(tmp.path()) };
        let summary = driver(cfg, &[0, 30, 90]).run().await.unwrap();
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test]
    async fn missing_artifact_stops_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        source(&tmp.path().join("in"), "b", 200);
        source(&tmp.path().join("in"), "c", 300);
        fs::remove_file(tmp.path().join("in/b/music.wav")).unwrap();

        let mut d = driver(config(tmp.path()), &[0, 30, 90]);
        let err = d.run().await.unwrap_err();
        assert!(matches!(err, BatchError::MissingArtifact { file: "music.wav", .. }));
        assert!(tmp.path().join("out/a").is_dir());
        assert!(!tmp.path().join("out/c").exists());
        assert!(matches!(d.progress.events().last(), Some(ProgressEvent::Error(_))));
    }

    #[tokio::test]
    async fn gated_sequences_are_skipped_and_remembered() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        source(&tmp.path().join("in"), "b", 100);
        let cfg = BatchConfig { gate: QualityGate::default(), ..config(tmp.path()) };
        let summary = driver(cfg, &[0, 30, 90]).run().await.unwrap();
        // "a" is gated out; "b" shares its fingerprint and is not retried.
        assert_eq!(summary.gated, 1);
        assert_eq!(summary.already_processed, 1);
        assert_eq!(summary.output_folders, 0);
    }

    #[tokio::test]
    async fn gated_sequences_are_checked_again_next_run() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        let cfg = BatchConfig { gate: QualityGate::default(), ..config(tmp.path()) };
        let first = driver(cfg.clone(), &[0, 30, 90]).run().await.unwrap();
        assert_eq!(first.gated, 1);

        let second = driver(cfg, &[0, 30, 90]).run().await.unwrap();
        assert_eq!(second.gated, 1);
        assert_eq!(second.already_processed, 0);
        assert!(!tmp.path().join("out/a").exists());
    }

    #[tokio::test]
    async fn bad_metadata_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        source(&tmp.path().join("in"), "b", 200);
        fs::write(tmp.path().join("in/a/metadata.json"), b"nope").unwrap();

        let mut d = driver(config(tmp.path()), &[0, 30, 90]);
        let summary = d.run().await.unwrap();
        assert_eq!((summary.failed, summary.processed), (1, 1));
        let events = d.progress.events();
        assert!(events.contains(&ProgressEvent::Progress { index: 1, total: 2 }));
        assert!(events.iter().any(|e| matches!(e, ProgressEvent::Error(m) if m.starts_with("a: "))));
        assert_eq!(events.last(), Some(&ProgressEvent::Done("Processed 1 folders.".into())));
    }

    #[tokio::test]
    async fn sidecar_fps_overrides_frame_rate() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        fs::write(tmp.path().join("in/a/metadata.json"), br#"{"music_offset":0.5,"fps":60}"#).unwrap();
        driver(config(tmp.path()), &[0, 30, 90]).run().await.unwrap();
        let shots: Vec<serde_json::Value> = serde_json::from_slice(&fs::read(tmp.path().join("out/a/shots_0.json")).unwrap()).unwrap();
        assert_eq!(shots[0]["duration"], 0.5);
    }

    #[tokio::test]
    async fn first_only_and_cancel() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 100);
        source(&tmp.path().join("in"), "b", 200);
        let cfg = BatchConfig { first_only: true, ..config(tmp.path()) };
        assert_eq!(driver(cfg, &[0, 30, 90]).run().await.unwrap().processed, 1);

        let mut d = driver(config(tmp.path()), &[0, 30, 90]);
        d.cancel_flag().store(true, Ordering::SeqCst);
        let summary = d.run().await.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.processed, 0);
    }

    #[tokio::test]
    async fn scan_counts_candidates() {
        let tmp = tempfile::tempdir().unwrap();
        source(&tmp.path().join("in"), "a", 1);
        source(&tmp.path().join("in/nested"), "b", 1);
        assert_eq!(scan(&config(tmp.path())).await.unwrap(), 2);
        assert_eq!(scan_message(2), "Found 2 folders. Ready to process.");
    }
}
