//! Keyframe-count heuristics that reject recordings unfit for extraction.

use serde::{Deserialize, Serialize};

use crate::curve::CameraCurve;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGate {
    pub enabled: bool,
    /// A curve needs strictly more keyframes than this.
    pub min_keyframes_exclusive: usize,
    /// Denser cutting than this average shot length suggests a multi-subject
    /// or corrupted recording.
    pub min_average_shot_seconds: f32,
}

impl Default for QualityGate {
    fn default() -> Self { Self { enabled: true, min_keyframes_exclusive: 10, min_average_shot_seconds: 0.5 } }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateVerdict {
    Accept,
    TooMany { count: usize, limit: f32 },
    TooFew { count: usize, min_exclusive: usize },
}

impl GateVerdict {
    pub fn accepted(&self) -> bool { matches!(self, GateVerdict::Accept) }
}

impl std::fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateVerdict::Accept => write!(f, "accepted"),
            GateVerdict::TooMany { count, limit } => write!(f, "too many camera keyframes ({} > {:.1})", count, limit),
            GateVerdict::TooFew { count, min_exclusive } => write!(f, "too few camera keyframes ({} <= {})", count, min_exclusive),
        }
    }
}

impl QualityGate {
    pub const DISABLED: Self = Self { enabled: false, min_keyframes_exclusive: 0, min_average_shot_seconds: 0.0 };

    /// Judge a curve by its keyframe count against the length of the recording
    /// (last keyframe frame over `frame_rate`).
    pub fn check(&self, curve: &CameraCurve, frame_rate: f32) -> GateVerdict {
        if !self.enabled { return GateVerdict::Accept; }
        let count = curve.len();
        let seconds = curve.last_frame().unwrap_or(0) as f32 / frame_rate;
        let limit = seconds / self.min_average_shot_seconds;
        if count as f32 > limit {
            return GateVerdict::TooMany { count, limit };
        }
        if count <= self.min_keyframes_exclusive {
            return GateVerdict::TooFew { count, min_exclusive: self.min_keyframes_exclusive };
        }
        GateVerdict::Accept
    }
}
