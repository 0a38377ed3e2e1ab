//! Camera shot extraction from dance motion recordings.
//!
//! Camera keyframe curves are segmented into shots relative to the dancing
//! character, then augmented by rotation and mirroring into a training set.

pub mod anchor;
pub mod augment;
pub mod batch;
pub mod config;
pub mod curve;
pub mod error;
pub mod rig;
pub mod shot;

pub use error::{BatchError, BatchResult, CurveError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
