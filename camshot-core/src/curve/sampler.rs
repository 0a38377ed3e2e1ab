//! Channel values at an arbitrary (possibly fractional) frame.

use glam::Vec3;

use super::{CameraKeyframe, Channel};
use crate::error::CurveError;

/// Interpolated camera channels at one instant, still in source units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    pub position: Vec3,
    pub rotation: Vec3,
    pub distance: f32,
    pub fov: f32,
}

impl From<&CameraKeyframe> for CameraSample {
    fn from(k: &CameraKeyframe) -> Self {
        Self { position: k.position, rotation: k.rotation, distance: k.distance, fov: k.fov }
    }
}

/// Sample `keyframes` (strictly ascending) at `frame`.
///
/// The segment is located by the last keyframe at or before `frame`. Holding
/// segments return that keyframe untouched: the final keyframe, and any keyframe
/// whose successor is one frame later (a hard cut). Otherwise each channel is
/// eased by its own curve. The first segment is measured from frame 0 rather
/// than from its keyframe, matching how the playback engine times it.
pub fn sample(keyframes: &[CameraKeyframe], frame: f32) -> Result<CameraSample, CurveError> {
    let first = keyframes.first().ok_or(CurveError::Empty)?;
    if frame.is_nan() || frame < first.frame as f32 {
        return Err(CurveError::OutOfRange { frame, first: first.frame });
    }

    let index = keyframes.partition_point(|k| k.frame as f32 <= frame) - 1;
    let key = &keyframes[index];
    let Some(next) = keyframes.get(index + 1) else { return Ok(key.into()) };
    if next.frame == key.frame + 1 {
        return Ok(key.into());
    }

    let begin = if index == 0 { 0.0 } else { key.frame as f32 };
    let end = next.frame as f32;
    let t = ((frame - begin) / (end - begin)).clamp(0.0, 1.0);
    let w = |c: Channel| key.interpolation.weight(c, t);

    let position = Vec3::new(
        lerp(key.position.x, next.position.x, w(Channel::X)),
        lerp(key.position.y, next.position.y, w(Channel::Y)),
        lerp(key.position.z, next.position.z, w(Channel::Z)),
    );
    let r = w(Channel::Rotation);
    let rotation = Vec3::new(
        lerp(key.rotation.x, next.rotation.x, r),
        lerp(key.rotation.y, next.rotation.y, r),
        lerp(key.rotation.z, next.rotation.z, r),
    );
    Ok(CameraSample {
        position,
        rotation,
        distance: lerp(key.distance, next.distance, w(Channel::Distance)),
        fov: lerp(key.fov, next.fov, w(Channel::Fov)),
    })
}

// Exact at w == 0 (returns `a` bit-for-bit).
#[inline]
pub(crate) fn lerp(a: f32, b: f32, w: f32) -> f32 { a + (b - a) * w }
