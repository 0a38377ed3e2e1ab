//! Dataset augmentation: global yaw rotations and the X mirror.
//!
//! Each sequence fans out to 72 variants: 36 rotations in 10° steps, each of
//! the original and of its mirror image. Rotation turns the whole scene about
//! world +Y; the mirror negates X and maps each yaw `a` to `180 - a`.
//!
//! Angle fields are `f64`, so both transforms and their inverses are exact
//! for angles that started as `f32`.

use glam::{DVec3, Quat, Vec3};

use crate::shot::{wrap_degrees_f64, CameraShot, ShotSequence};

pub const ROTATION_STEP_DEGREES: u32 = 10;
pub const VARIANT_COUNT: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AugmentationVariant {
    pub rotation_degrees: u32,
    pub mirrored: bool,
}

impl AugmentationVariant {
    /// All variants in emission order: for each rotation, plain then mirrored.
    pub fn all() -> impl Iterator<Item = AugmentationVariant> {
        (0..360).step_by(ROTATION_STEP_DEGREES as usize).flat_map(|rotation_degrees| {
            [false, true].into_iter().map(move |mirrored| AugmentationVariant { rotation_degrees, mirrored })
        })
    }

    pub fn file_name(&self) -> String {
        if self.mirrored { format!("shots_flip_{}.json", self.rotation_degrees) } else { format!("shots_{}.json", self.rotation_degrees) }
    }

    /// Mirror first, then rotate.
    pub fn apply(&self, seq: &ShotSequence) -> ShotSequence {
        let angle = self.rotation_degrees as f32;
        seq.map(|shot| {
            let base = if self.mirrored { mirror_shot(shot) } else { *shot };
            rotate_shot(&base, angle)
        })
    }
}

/// Turn every shot of `seq` by `degrees` about world +Y.
pub fn rotate(seq: &ShotSequence, degrees: f32) -> ShotSequence { seq.map(|s| rotate_shot(s, degrees)) }

/// Reflect every shot of `seq` across the YZ plane.
pub fn mirror(seq: &ShotSequence) -> ShotSequence { seq.map(mirror_shot) }

/// Position fields turn with the scene; absolute yaw angles gain `degrees`.
/// Offsets of angles and scalars are unchanged.
pub fn rotate_shot(shot: &CameraShot, degrees: f32) -> CameraShot {
    let q = Quat::from_rotation_y(degrees.to_radians());
    let turn = degrees as f64;
    CameraShot {
        character_pos: q * shot.character_pos,
        character_pos_offset: q * shot.character_pos_offset,
        character_rot_y: wrap_degrees_f64(shot.character_rot_y + turn),
        camera_pos: q * shot.camera_pos,
        camera_pos_offset: q * shot.camera_pos_offset,
        camera_rot: DVec3::new(shot.camera_rot.x, wrap_degrees_f64(shot.camera_rot.y + turn), shot.camera_rot.z),
        ..*shot
    }
}

/// X is negated on positions; a yaw `a` becomes `180 - a` and yaw offsets
/// flip sign. Pitch, roll, distance and field of view are untouched.
pub fn mirror_shot(shot: &CameraShot) -> CameraShot {
    let flip_x = |v: Vec3| Vec3::new(-v.x, v.y, v.z);
    CameraShot {
        character_pos: flip_x(shot.character_pos),
        character_pos_offset: flip_x(shot.character_pos_offset),
        character_rot_y: wrap_degrees_f64(180.0 - shot.character_rot_y),
        character_rot_y_offset: -shot.character_rot_y_offset,
        camera_pos: flip_x(shot.camera_pos),
        camera_pos_offset: flip_x(shot.camera_pos_offset),
        camera_rot: DVec3::new(shot.camera_rot.x, wrap_degrees_f64(180.0 - shot.camera_rot.y), shot.camera_rot.z),
        camera_rot_offset: DVec3::new(shot.camera_rot_offset.x, -shot.camera_rot_offset.y, shot.camera_rot_offset.z),
        ..*shot
    }
}

/// All 72 variants of `seq`, paired with their file names, in emission order.
pub fn variants(seq: &ShotSequence) -> Vec<(AugmentationVariant, ShotSequence)> {
    let mirrored = mirror(seq);
    AugmentationVariant::all()
        .map(|v| {
            let base = if v.mirrored { &mirrored } else { seq };
            (v, rotate(base, v.rotation_degrees as f32))
        })
        .collect()
}
