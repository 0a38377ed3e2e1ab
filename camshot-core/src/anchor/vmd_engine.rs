//! Playback engine that evaluates motion files directly.
//!
//! Without a skinned character there are no bone transforms to read, so the
//! anchor follows the root ("center") bone track: its eased position scaled to
//! world units, lifted by the configured neck height, and its yaw. A motion with
//! no root track anchors at the origin facing +Z.

use std::path::Path;

use async_trait::async_trait;
use glam::{EulerRot, Vec3};
use tracing::debug;

use super::{AnchorConfig, CharacterAnchorSample, PlaybackEngine};
use crate::batch::scan::SourceSequence;
use crate::curve::sampler::lerp;
use crate::curve::vmd::{self, BoneKeyframe, VmdMotion, CENTER_BONE};
use crate::curve::CameraCurve;
use crate::error::{BatchError, BatchResult};
use crate::rig::MMD_TO_WORLD;
use crate::shot::wrap_degrees;

#[derive(Debug, Default)]
pub struct VmdEngine {
    config: AnchorConfig,
    track: Vec<BoneKeyframe>,
    frame: u32,
}

impl VmdEngine {
    pub fn new(config: AnchorConfig) -> Self { Self { config, track: Vec::new(), frame: 0 } }

    /// Engine with an already loaded root track; mostly for tests.
    pub fn with_track(config: AnchorConfig, track: Vec<BoneKeyframe>) -> Self { Self { config, track, frame: 0 } }

    fn anchor_at(&self, frame: f32) -> CharacterAnchorSample {
        let lift = Vec3::new(0.0, self.config.neck_height, 0.0);
        let Some(first) = self.track.first() else { return CharacterAnchorSample::new(lift, 0.0) };

        let index = self.track.partition_point(|k| k.frame as f32 <= frame).saturating_sub(1);
        let key = if frame < first.frame as f32 { first } else { &self.track[index] };
        let (position, rotation) = match self.track.get(index + 1) {
            Some(next) if frame > key.frame as f32 => {
                // Bone easing lives on the keyframe that ends the segment.
                let t = (frame - key.frame as f32) / (next.frame - key.frame) as f32;
                let i = &next.interpolation;
                let position = Vec3::new(
                    lerp(key.position.x, next.position.x, i.x.evaluate(t)),
                    lerp(key.position.y, next.position.y, i.y.evaluate(t)),
                    lerp(key.position.z, next.position.z, i.z.evaluate(t)),
                );
                (position, key.rotation.slerp(next.rotation, i.rotation.evaluate(t)))
            }
            _ => (key.position, key.rotation),
        };

        let (yaw, _, _) = rotation.normalize().to_euler(EulerRot::YXZ);
        CharacterAnchorSample::new(position * MMD_TO_WORLD + lift, wrap_degrees(yaw.to_degrees()))
    }
}

#[async_trait]
impl PlaybackEngine for VmdEngine {
    async fn load(&mut self, source: &SourceSequence) -> BatchResult<CameraCurve> {
        let motion = read_motion(&source.motion_path()).await?;
        self.track = motion.bone_track(CENTER_BONE);
        if self.track.is_empty() {
            debug!(sequence = %source.id, "motion has no root bone track; anchoring at origin");
        }
        let camera = read_motion(&source.camera_path()).await?;
        self.frame = 0;
        Ok(camera.camera)
    }

    async fn seek_and_settle(&mut self, frame: u32) -> BatchResult<()> {
        self.frame = frame;
        // Poses are computed on read; one scheduler tick stands in for the engine update.
        tokio::task::yield_now().await;
        Ok(())
    }

    fn current_frame(&self) -> f32 { self.frame as f32 }

    fn sample_anchor(&self) -> CharacterAnchorSample { self.anchor_at(self.frame as f32) }
}

pub async fn read_motion(path: &Path) -> BatchResult<VmdMotion> {
    let data = tokio::fs::read(path).await.map_err(|source| BatchError::Read { path: path.to_path_buf(), source })?;
    Ok(vmd::parse(&data)?)
}
