//! Camera rig: from sampled camera channels plus a character anchor to a
//! world-space camera pose.
//!
//! The rig is a three-level hierarchy:
//! - root at the anchor, rotated by the anchor's yaw;
//! - look-at target offset from the root, rotated by the camera's Euler angles
//!   (yaw inverted, source files use the opposite handedness for Y);
//! - the camera itself, turned 180° about Y so it faces the target, and moved
//!   `distance` along the rig's +Z, which the turn makes its backward axis.
//!
//! Angles are Euler degrees applied Z, then X, then Y.

use glam::{EulerRot, Quat, Vec3};

use crate::anchor::CharacterAnchorSample;
use crate::shot::{wrap_degrees, CameraShot};

/// Motion-file units to world metres.
pub const MMD_TO_WORLD: f32 = 0.08;

/// Default resolution of [`reconstruct_trajectory`].
pub const TRAJECTORY_STEPS: u32 = 100;

// Exactly 180° about Y; from_rotation_y(PI) leaves a ~1e-8 w component.
const YAW_FLIP: Quat = Quat::from_xyzw(0.0, 1.0, 0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    /// Euler degrees, each component in [0, 360).
    pub rotation: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Applied to the target offset and the pull-back distance.
    pub unit_scale: f32,
}

impl CameraRig {
    /// For channels sampled straight from motion files.
    pub const MMD: Self = Self { unit_scale: MMD_TO_WORLD };
    /// For values already in world units, e.g. stored shot records.
    pub const WORLD: Self = Self { unit_scale: 1.0 };

    pub fn project(&self, offset: Vec3, euler_degrees: Vec3, distance: f32, anchor: &CharacterAnchorSample) -> CameraPose {
        let target = offset * self.unit_scale;
        let root = anchor.rotation();
        let local = euler_to_quat(Vec3::new(euler_degrees.x, -euler_degrees.y, euler_degrees.z));
        let combined = root * local * YAW_FLIP;

        let position = anchor.position + root * target + combined * Vec3::new(0.0, 0.0, distance * self.unit_scale);
        CameraPose { position, rotation: wrap_euler(quat_to_euler(combined)) }
    }
}

/// Sample the camera path of a stored shot at `steps + 1` evenly spaced
/// instants, re-running the rig with every field moved linearly by its offset.
/// A debugging aid; shot records keep the rotation of the flipped camera, so
/// the result is not expected to retrace the extraction exactly.
pub fn reconstruct_trajectory(shot: &CameraShot, steps: u32) -> Vec<CameraPose> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            let anchor = CharacterAnchorSample::new(
                shot.character_pos + shot.character_pos_offset * t,
                (shot.character_rot_y + shot.character_rot_y_offset * t as f64) as f32,
            );
            CameraRig::WORLD.project(
                shot.camera_pos + shot.camera_pos_offset * t,
                (shot.camera_rot + shot.camera_rot_offset * t as f64).as_vec3(),
                shot.camera_distance + shot.camera_distance_offset * t,
                &anchor,
            )
        })
        .collect()
}

pub fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, degrees.y.to_radians(), degrees.x.to_radians(), degrees.z.to_radians())
}

pub fn quat_to_euler(q: Quat) -> Vec3 {
    let (y, x, z) = q.to_euler(EulerRot::YXZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

pub fn wrap_euler(degrees: Vec3) -> Vec3 {
    Vec3::new(wrap_degrees(degrees.x), wrap_degrees(degrees.y), wrap_degrees(degrees.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3, eps: f32) -> bool { (a - b).abs().max_element() < eps }

    #[test]
    fn identity_rig_pulls_straight_back() {
        for d in [0.0, 1.0, -45.0, 37.5, 1e4] {
            let pose = CameraRig::MMD.project(Vec3::ZERO, Vec3::ZERO, d, &CharacterAnchorSample::default());
            assert_eq!(pose.position, Vec3::new(0.0, 0.0, -d * MMD_TO_WORLD));
            assert!(close(pose.rotation, Vec3::new(0.0, 180.0, 0.0), 1e-4));
        }
    }

    #[test]
    fn offset_is_scaled_and_follows_anchor_yaw() {
        let anchor = CharacterAnchorSample::new(Vec3::new(1.0, 0.0, 2.0), 90.0);
        let pose = CameraRig::MMD.project(Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO, 0.0, &anchor);
        // (0, 0.8, 0.8) yawed 90° puts +Z on +X.
        assert!(close(pose.position, Vec3::new(1.8, 0.8, 2.0), 1e-5));
        assert!(close(pose.rotation, Vec3::new(0.0, 270.0, 0.0), 1e-3));
    }

    #[test]
    fn source_yaw_is_inverted() {
        let pose = CameraRig::WORLD.project(Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0), 0.0, &CharacterAnchorSample::default());
        assert!(close(pose.rotation, Vec3::new(0.0, 150.0, 0.0), 1e-3));
    }

    #[test]
    fn pull_back_follows_camera_pitch() {
        // Motion files use negative distances: the camera sits on +Z facing the target.
        let level = CameraRig::WORLD.project(Vec3::ZERO, Vec3::ZERO, -2.0, &CharacterAnchorSample::default());
        assert_eq!(level.position, Vec3::new(0.0, 0.0, 2.0));
        // Pitched 60° it swings below the target and keeps looking at it.
        let pose = CameraRig::WORLD.project(Vec3::ZERO, Vec3::new(60.0, 0.0, 0.0), -2.0, &CharacterAnchorSample::default());
        assert!(close(pose.position, Vec3::new(0.0, -3f32.sqrt(), 1.0), 1e-5));
        let forward = euler_to_quat(pose.rotation) * Vec3::Z;
        assert!(close(forward, (Vec3::ZERO - pose.position).normalize(), 1e-5));
    }

    #[test]
    fn euler_round_trip_is_zxy() {
        let e = Vec3::new(20.0, 70.0, -15.0);
        let q = euler_to_quat(e);
        let manual = Quat::from_rotation_y(70f32.to_radians())
            * Quat::from_rotation_x(20f32.to_radians())
            * Quat::from_rotation_z(-15f32.to_radians());
        assert!(q.abs_diff_eq(manual, 1e-6));
        assert!(close(wrap_euler(quat_to_euler(q)), Vec3::new(20.0, 70.0, 345.0), 1e-3));
    }

    #[test]
    fn trajectory_spans_both_ends() {
        let shot = CameraShot {
            duration: 1.0,
            character_pos: Vec3::ZERO,
            character_pos_offset: Vec3::new(2.0, 0.0, 0.0),
            character_rot_y: 0.0,
            character_rot_y_offset: 0.0,
            camera_pos: Vec3::ZERO,
            camera_pos_offset: Vec3::ZERO,
            camera_rot: glam::DVec3::ZERO,
            camera_rot_offset: glam::DVec3::ZERO,
            camera_distance: 3.0,
            camera_distance_offset: 1.0,
            camera_fov: 30.0,
            camera_fov_offset: 0.0,
        };
        let path = reconstruct_trajectory(&shot, TRAJECTORY_STEPS);
        assert_eq!(path.len(), 101);
        assert!(close(path[0].position, Vec3::new(0.0, 0.0, -3.0), 1e-6));
        assert!(close(path[100].position, Vec3::new(2.0, 0.0, -4.0), 1e-5));
        assert_eq!(reconstruct_trajectory(&shot, 0).len(), 2);
    }
}
