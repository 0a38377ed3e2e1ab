//! Shot records: the unit of the training dataset.

pub mod gate;
pub mod segment;

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

pub use gate::{GateVerdict, QualityGate};
pub use segment::{segment, SegmentOptions};

/// Pose delta between two consecutive non-cut camera keyframes.
///
/// Every `*_offset` is end minus start in the frame of its base field.
/// Absolute angles are wrapped to [0, 360); offsets never are, so a pan across
/// north keeps its sign and size. Angles are held in `f64` so that mirroring
/// and rotating stay exact for any angle that started as `f32`; they are
/// written out as `f32` like every other field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraShot {
    /// Seconds.
    pub duration: f32,
    #[serde(with = "xyz")]
    pub character_pos: Vec3,
    #[serde(with = "xyz")]
    pub character_pos_offset: Vec3,
    #[serde(with = "degrees")]
    pub character_rot_y: f64,
    #[serde(with = "degrees")]
    pub character_rot_y_offset: f64,
    #[serde(with = "xyz")]
    pub camera_pos: Vec3,
    #[serde(with = "xyz")]
    pub camera_pos_offset: Vec3,
    #[serde(with = "euler")]
    pub camera_rot: DVec3,
    #[serde(with = "euler")]
    pub camera_rot_offset: DVec3,
    pub camera_distance: f32,
    pub camera_distance_offset: f32,
    pub camera_fov: f32,
    pub camera_fov_offset: f32,
}

/// Shots extracted from one source, in keyframe order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSequence {
    source: String,
    shots: Vec<CameraShot>,
}

impl ShotSequence {
    pub fn new(source: impl Into<String>, shots: Vec<CameraShot>) -> Self { Self { source: source.into(), shots } }

    pub fn source(&self) -> &str { &self.source }
    pub fn shots(&self) -> &[CameraShot] { &self.shots }
    pub fn len(&self) -> usize { self.shots.len() }
    pub fn is_empty(&self) -> bool { self.shots.is_empty() }

    /// Same source, every shot passed through `f`.
    pub fn map(&self, f: impl Fn(&CameraShot) -> CameraShot) -> Self {
        Self { source: self.source.clone(), shots: self.shots.iter().map(f).collect() }
    }

    /// Compact JSON array of shot objects.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> { serde_json::to_vec(&self.shots) }

    pub fn from_json(source: impl Into<String>, bytes: &[u8]) -> serde_json::Result<Self> {
        Ok(Self::new(source, serde_json::from_slice(bytes)?))
    }
}

/// Bring an angle into [0, 360) by whole turns. Non-finite input is returned as is.
pub fn wrap_degrees(mut angle: f32) -> f32 {
    if !angle.is_finite() { return angle; }
    // Adding 360 to a tiny negative angle can round up to exactly 360.
    loop {
        if angle >= 360.0 {
            angle -= 360.0;
        } else if angle < 0.0 {
            angle += 360.0;
        } else {
            return angle;
        }
    }
}

/// [`wrap_degrees`] for shot angles.
pub fn wrap_degrees_f64(mut angle: f64) -> f64 {
    if !angle.is_finite() { return angle; }
    loop {
        if angle >= 360.0 {
            angle -= 360.0;
        } else if angle < 0.0 {
            angle += 360.0;
        } else {
            return angle;
        }
    }
}

/// Vectors as `{"x":..,"y":..,"z":..}` objects.
mod xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz { x: f32, y: f32, z: f32 }

    pub fn serialize<S: Serializer>(v: &Vec3, s: S) -> Result<S::Ok, S::Error> {
        Xyz { x: v.x, y: v.y, z: v.z }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec3, D::Error> {
        let Xyz { x, y, z } = Xyz::deserialize(d)?;
        Ok(Vec3::new(x, y, z))
    }
}

/// Euler angles as `{"x":..,"y":..,"z":..}` in `f32`.
mod euler {
    use glam::DVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz { x: f32, y: f32, z: f32 }

    pub fn serialize<S: Serializer>(v: &DVec3, s: S) -> Result<S::Ok, S::Error> {
        Xyz { x: v.x as f32, y: v.y as f32, z: v.z as f32 }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DVec3, D::Error> {
        let Xyz { x, y, z } = Xyz::deserialize(d)?;
        Ok(DVec3::new(x as f64, y as f64, z as f64))
    }
}

mod degrees {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> { (*v as f32).serialize(s) }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> { Ok(f32::deserialize(d)? as f64) }
}
