//! Character anchor sampling through a playback engine handle.
//!
//! The engine owns a single "current frame". Every pose read must follow a
//! `seek_and_settle` for that frame; taking the engine by `&mut` keeps seeks
//! for a sequence strictly ordered and rules out sharing one engine between
//! concurrently processed sequences.

pub mod vmd_engine;

use async_trait::async_trait;
use glam::Quat;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::batch::scan::SourceSequence;
use crate::curve::CameraCurve;
use crate::error::BatchResult;
pub use vmd_engine::VmdEngine;

/// Character world position and yaw at one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CharacterAnchorSample {
    pub position: Vec3,
    /// Degrees about +Y.
    pub rotation_y: f32,
}

impl CharacterAnchorSample {
    pub fn new(position: Vec3, rotation_y: f32) -> Self { Self { position, rotation_y } }

    /// Yaw-only rotation (no pitch or roll).
    pub fn rotation(&self) -> Quat { Quat::from_rotation_y(self.rotation_y.to_radians()) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Added to the root position so the anchor sits near the neck, in world units.
    pub neck_height: f32,
}

impl Default for AnchorConfig {
    fn default() -> Self { Self { neck_height: 0.0 } }
}

/// Handle to the animation engine that plays a sequence's motion and camera.
#[async_trait]
pub trait PlaybackEngine: Send {
    /// Load a sequence and return its camera keyframes.
    async fn load(&mut self, source: &SourceSequence) -> BatchResult<CameraCurve>;

    /// Move to `frame` and wait until poses reflect it.
    async fn seek_and_settle(&mut self, frame: u32) -> BatchResult<()>;

    /// Frame the engine last settled on (fractional while playing).
    fn current_frame(&self) -> f32;

    /// Anchor pose at [`PlaybackEngine::current_frame`].
    fn sample_anchor(&self) -> CharacterAnchorSample;
}
