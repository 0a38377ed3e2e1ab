//! Shot segmentation: one shot per non-cut keyframe interval.
//!
//! Boundaries are captured in strict seek → settle → sample order against the
//! engine handle; both ends of a shot are read from the same engine and the
//! same rig so every offset is a difference within one frame of reference.

use tracing::debug;

use super::{wrap_degrees_f64, CameraShot, ShotSequence};
use crate::anchor::{CharacterAnchorSample, PlaybackEngine};
use crate::curve::CameraCurve;
use crate::error::BatchResult;
use crate::rig::{CameraPose, CameraRig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOptions {
    /// Frames per second of the curve.
    pub frame_rate: f32,
    /// Also emit a shot for the last keyframe pair. Off by default: the final
    /// keyframe of a recording is normally a hold until the song ends.
    pub include_final_pair: bool,
    pub rig: CameraRig,
}

impl Default for SegmentOptions {
    fn default() -> Self { Self { frame_rate: 30.0, include_final_pair: false, rig: CameraRig::MMD } }
}

/// Everything read at one shot boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Boundary {
    anchor: CharacterAnchorSample,
    camera: CameraPose,
    distance: f32,
    fov: f32,
}

pub async fn segment<E>(engine: &mut E, curve: &CameraCurve, source: &str, options: &SegmentOptions) -> BatchResult<ShotSequence>
where
    E: PlaybackEngine + ?Sized,
{
    let keys = curve.keyframes();
    let pairs = if options.include_final_pair { keys.len().saturating_sub(1) } else { keys.len().saturating_sub(2) };

    let mut shots = Vec::with_capacity(pairs);
    for i in 0..pairs {
        let (from, to) = (&keys[i], &keys[i + 1]);
        if to.frame - from.frame == 1 {
            debug!(sequence = source, frame = from.frame, "jump cut");
            continue;
        }
        let start = capture(engine, curve, from.frame, &options.rig).await?;
        let end = capture(engine, curve, to.frame, &options.rig).await?;
        let duration = (to.frame - from.frame) as f32 / options.frame_rate;
        shots.push(shot_between(duration, &start, &end));
    }
    debug!(sequence = source, shots = shots.len(), keyframes = keys.len(), "segmented");
    Ok(ShotSequence::new(source, shots))
}

async fn capture<E>(engine: &mut E, curve: &CameraCurve, frame: u32, rig: &CameraRig) -> BatchResult<Boundary>
where
    E: PlaybackEngine + ?Sized,
{
    engine.seek_and_settle(frame).await?;
    let anchor = engine.sample_anchor();
    let sample = curve.sample(engine.current_frame())?;
    let camera = rig.project(sample.position, sample.rotation, sample.distance, &anchor);
    Ok(Boundary { anchor, camera, distance: sample.distance * rig.unit_scale, fov: sample.fov })
}

fn shot_between(duration: f32, start: &Boundary, end: &Boundary) -> CameraShot {
    let rot_y = wrap_degrees_f64(start.anchor.rotation_y as f64);
    CameraShot {
        duration,
        character_pos: start.anchor.position,
        character_pos_offset: end.anchor.position - start.anchor.position,
        character_rot_y: rot_y,
        character_rot_y_offset: wrap_degrees_f64(end.anchor.rotation_y as f64) - rot_y,
        camera_pos: start.camera.position,
        camera_pos_offset: end.camera.position - start.camera.position,
        camera_rot: start.camera.rotation.as_dvec3(),
        camera_rot_offset: end.camera.rotation.as_dvec3() - start.camera.rotation.as_dvec3(),
        camera_distance: start.distance,
        camera_distance_offset: end.distance - start.distance,
        camera_fov: start.fov,
        camera_fov_offset: end.fov - start.fov,
    }
}
