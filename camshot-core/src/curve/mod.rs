//! Camera keyframe curves: storage, easing and sampling.

pub mod bezier;
pub mod sampler;
pub mod vmd;

use glam::Vec3;

use crate::error::CurveError;
pub use bezier::BezierCurve;
pub use sampler::CameraSample;

/// Independently eased camera channels, in the order they are stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel { X, Y, Z, Rotation, Distance, Fov }

impl Channel {
    pub const ALL: [Channel; 6] = [Channel::X, Channel::Y, Channel::Z, Channel::Rotation, Channel::Distance, Channel::Fov];

    fn index(self) -> usize {
        match self {
            Channel::X => 0,
            Channel::Y => 1,
            Channel::Z => 2,
            Channel::Rotation => 3,
            Channel::Distance => 4,
            Channel::Fov => 5,
        }
    }
}

/// Per-channel easing curves of one keyframe; they shape the segment that
/// starts at this keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraInterpolation {
    pub curves: [BezierCurve; 6],
}

impl CameraInterpolation {
    pub fn uniform(curve: BezierCurve) -> Self { Self { curves: [curve; 6] } }

    pub fn curve(&self, channel: Channel) -> &BezierCurve { &self.curves[channel.index()] }

    pub fn set(&mut self, channel: Channel, curve: BezierCurve) { self.curves[channel.index()] = curve; }

    pub fn weight(&self, channel: Channel, t: f32) -> f32 { self.curve(channel).evaluate(t) }
}

/// One camera control point. `rotation` is Euler degrees in the source
/// convention (yaw not yet inverted); `position` is in source units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraKeyframe {
    pub frame: u32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub distance: f32,
    pub fov: f32,
    pub interpolation: CameraInterpolation,
}

impl CameraKeyframe {
    /// Linear keyframe, mostly useful for fixtures.
    pub fn linear(frame: u32, position: Vec3, rotation: Vec3, distance: f32, fov: f32) -> Self {
        Self { frame, position, rotation, distance, fov, interpolation: CameraInterpolation::default() }
    }
}

/// Keyframes of one camera track, strictly ascending by frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraCurve {
    keyframes: Vec<CameraKeyframe>,
}

impl CameraCurve {
    /// Accepts keyframes that are already strictly ascending.
    pub fn new(keyframes: Vec<CameraKeyframe>) -> Result<Self, CurveError> {
        if let Some(index) = keyframes.windows(2).position(|w| w[1].frame <= w[0].frame) {
            return Err(CurveError::Unsorted { index: index + 1 });
        }
        Ok(Self { keyframes })
    }

    /// Sorts by frame; when a frame repeats, the record that came last wins.
    pub fn from_unsorted(mut keyframes: Vec<CameraKeyframe>) -> Self {
        keyframes.reverse();
        keyframes.sort_by_key(|k| k.frame);
        keyframes.dedup_by_key(|k| k.frame);
        Self { keyframes }
    }

    pub fn keyframes(&self) -> &[CameraKeyframe] { &self.keyframes }
    pub fn len(&self) -> usize { self.keyframes.len() }
    pub fn is_empty(&self) -> bool { self.keyframes.is_empty() }
    pub fn last_frame(&self) -> Option<u32> { self.keyframes.last().map(|k| k.frame) }

    /// Number of adjacent keyframe pairs exactly one frame apart.
    pub fn jump_cuts(&self) -> usize {
        self.keyframes.windows(2).filter(|w| w[1].frame - w[0].frame == 1).count()
    }

    pub fn sample(&self, frame: f32) -> Result<CameraSample, CurveError> { sampler::sample(&self.keyframes, frame) }
}
