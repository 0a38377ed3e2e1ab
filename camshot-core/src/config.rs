use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::anchor::AnchorConfig;
use crate::batch::fingerprint::FingerprintMode;
use crate::shot::QualityGate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Triaged source folders, each with motion, camera, audio and metadata.
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    /// Used when a sequence's metadata carries no `fps`.
    pub frame_rate: f32,
    pub first_only: bool,
    pub fingerprint: FingerprintMode,
    pub gate: QualityGate,
    pub include_final_pair: bool,
    pub anchor: AnchorConfig,
    /// Yield to the scheduler between artifact writes.
    pub write_yield: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("mmd_filtered"),
            output_root: PathBuf::from("mmd_processed"),
            frame_rate: 30.0,
            first_only: false,
            fingerprint: FingerprintMode::ByteLength,
            gate: QualityGate::default(),
            include_final_pair: false,
            anchor: AnchorConfig::default(),
            write_yield: true,
        }
    }
}

pub fn load_from_yaml_str(s: &str) -> Result<BatchConfig> {
    let cfg: BatchConfig = serde_yaml::from_str(s)?;
    anyhow::ensure!(cfg.frame_rate > 0.0, "frame_rate must be positive, got {}", cfg.frame_rate);
    Ok(cfg)
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<BatchConfig> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    load_from_yaml_str(&data).with_context(|| format!("parsing {}", path.display()))
}
