use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use camshot_core::anchor::VmdEngine;
use camshot_core::batch::{self, BatchDriver, DirectorySink, FingerprintMode, TracingProgress};
use camshot_core::config::{self, BatchConfig};
use camshot_core::curve::vmd;
use camshot_core::rig::{reconstruct_trajectory, TRAJECTORY_STEPS};
use camshot_core::shot::{QualityGate, ShotSequence};
use camshot_core::VERSION;

#[derive(Parser, Debug)]
#[command(name = "camshot", version = VERSION, about = "Extract augmented camera shots from dance motion data")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count source folders ready for processing
    Scan {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Extract and augment shots for every unprocessed source folder
    Process {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        first_only: bool,
        /// Deduplicate by content hash instead of file size
        #[arg(long)]
        sha256: bool,
    },
    /// Summarize a camera motion file
    Inspect {
        path: PathBuf,
        #[arg(long, default_value_t = 30.0)]
        fps: f32,
    },
    /// Print the reconstructed camera path of one shot
    Trace {
        path: PathBuf,
        #[arg(long)]
        shot: usize,
        #[arg(long, default_value_t = TRAJECTORY_STEPS)]
        steps: u32,
    },
}

fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT").map(|v| v.to_lowercase() == "json").unwrap_or(false);
    let env_filter = EnvFilter::from_default_env()
        .add_directive("camshot=info".parse()?)
        .add_directive("camshot_core=info".parse()?);

    if use_json {
        tracing_subscriber::registry().with(fmt::layer().json()).with(env_filter).init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(false))
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<BatchConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => Ok(BatchConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    match cli.cmd {
        Command::Scan { config, source } => {
            let mut cfg = load_config(config.as_ref())?;
            if let Some(s) = source { cfg.source_root = s; }
            let count = batch::scan(&cfg).await?;
            println!("{}", batch::scan_message(count));
        }
        Command::Process { config, source, output, first_only, sha256 } => {
            let mut cfg = load_config(config.as_ref())?;
            if let Some(s) = source { cfg.source_root = s; }
            if let Some(o) = output { cfg.output_root = o; }
            cfg.first_only |= first_only;
            if sha256 { cfg.fingerprint = FingerprintMode::Sha256; }
            info!(source = %cfg.source_root.display(), output = %cfg.output_root.display(), "starting run");

            let engine = VmdEngine::new(cfg.anchor.clone());
            let sink = DirectorySink::new(&cfg.output_root);
            let mut driver = BatchDriver::new(cfg, engine, sink, TracingProgress);

            let cancel = driver.cancel_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received; stopping after the current folder");
                    cancel.store(true, Ordering::SeqCst);
                }
            });

            let summary = driver.run().await?;
            println!("{}", summary);
            println!(
                "  written: {}  already processed: {}  gated: {}  failed: {}{}",
                summary.processed,
                summary.already_processed,
                summary.gated,
                summary.failed,
                if summary.cancelled { "  (cancelled)" } else { "" }
            );
        }
        Command::Inspect { path, fps } => {
            if fps <= 0.0 { bail!("--fps must be positive"); }
            let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let motion = vmd::parse(&data).with_context(|| format!("parsing {}", path.display()))?;
            let camera = &motion.camera;
            println!("{}", path.display());
            println!("  camera keyframes: {}", camera.len());
            println!("  jump cuts: {}", camera.jump_cuts());
            if let Some(last) = camera.last_frame() {
                println!("  last frame: {} ({:.2}s)", last, last as f32 / fps);
            }
            println!("  bone keyframes: {}", motion.bones.len());
            println!("  quality gate: {}", QualityGate::default().check(camera, fps));
        }
        Command::Trace { path, shot, steps } => {
            let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let seq = ShotSequence::from_json(path.display().to_string(), &data)?;
            let Some(s) = seq.shots().get(shot) else {
                bail!("shot {} out of range ({} shots)", shot, seq.len());
            };
            let poses = reconstruct_trajectory(s, steps);
            let last = poses.len().saturating_sub(1).max(1) as f32;
            for (i, pose) in poses.iter().enumerate() {
                let (p, r) = (pose.position, pose.rotation);
                println!(
                    "{:.3}\t{:.4} {:.4} {:.4}\t{:.2} {:.2} {:.2}",
                    i as f32 / last * s.duration,
                    p.x, p.y, p.z,
                    r.x, r.y, r.z
                );
            }
        }
    }
    Ok(())
}
