//! Command-line front end: ingest samples from files or synthetic scenes,
//! segment them, and write the exports.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rangescan_io::PlyFormat;
use rangescan_service::{ScanService, ServiceConfig};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rangescan")]
#[command(
    about = "Accumulate rangefinder samples and segment them into a base plane and objects",
    version
)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment samples read from PLY or JSON files
    Segment {
        /// Input files; `.ply` is read as PLY, anything else as a JSON sample list
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write the segmentation JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Merge input files into one cloud and write it out
    Export {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },

    /// Generate a synthetic cloud and segment it
    Demo {
        #[arg(value_enum, default_value_t = DemoKind::Scene)]
        kind: DemoKind,

        /// Number of points for the random cloud
        #[arg(short = 'n', long, default_value_t = 1000)]
        points: usize,

        /// Seed for the random cloud
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Also write the raw cloud as PLY
        #[arg(long)]
        ply: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for individual config fields.
#[derive(clap::Args, Default)]
struct Tuning {
    /// Plane inlier distance
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of plane hypotheses
    #[arg(long)]
    max_trials: Option<usize>,

    /// Seed for the plane sampler
    #[arg(long)]
    plane_seed: Option<u64>,

    /// Neighbour distance for object clustering
    #[arg(long)]
    radius: Option<f64>,

    /// Smallest object size in points
    #[arg(long)]
    min_points: Option<usize>,
}

impl Tuning {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(v) = self.threshold {
            config.plane.distance_threshold = v;
        }
        if let Some(v) = self.max_trials {
            config.plane.max_trials = v;
        }
        if let Some(v) = self.plane_seed {
            config.plane.seed = v;
        }
        if let Some(v) = self.radius {
            config.cluster.radius = v;
        }
        if let Some(v) = self.min_points {
            config.cluster.min_points = v;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Ply,
    PlyBinary,
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoKind {
    /// Uniform points in a cube
    Random,
    /// Rangefinder sweep over the default boxes and sphere
    Scene,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    match path {
        Some(path) => {
            let config = ServiceConfig::from_yaml(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            info!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(ServiceConfig::default()),
    }
}

fn ingest(service: &ScanService, inputs: &[PathBuf]) -> Result<()> {
    for path in inputs {
        let is_ply = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"));
        let added = if is_ply {
            service.load_ply(path)
        } else {
            service.load_samples_json(path)
        }
        .with_context(|| format!("failed to ingest {}", path.display()))?;
        info!(path = %path.display(), added, "ingested");
    }
    if service.is_empty() {
        warn!("no samples were ingested");
    }
    Ok(())
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

async fn segment_and_report(service: &ScanService, output: Option<&Path>) -> Result<()> {
    let export = service.segment_async().await?;
    eprintln!(
        "{} points, {} objects, plane: {}",
        export.points.len(),
        export.objects.len(),
        match &export.plane {
            Some(p) => format!("n = {:?}, d = {:.4}", p.normal, p.d),
            None => "none".to_string(),
        }
    );
    for obj in &export.objects {
        eprintln!(
            "  object {:>3}: {:>6} points, min {:?}, max {:?}",
            obj.label, obj.num_points, obj.bbox_min, obj.bbox_max
        );
    }
    write_json(&export, output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Segment {
            inputs,
            output,
            tuning,
        } => {
            tuning.apply(&mut config);
            let service = ScanService::new(config);
            ingest(&service, &inputs)?;
            segment_and_report(&service, output.as_deref()).await?;
        }
        Commands::Export {
            inputs,
            output,
            format,
        } => {
            let service = ScanService::new(config);
            ingest(&service, &inputs)?;
            match format {
                ExportFormat::Json => write_json(&service.export_json(), Some(&output))?,
                ExportFormat::Ply => fs::write(&output, service.export_ply(PlyFormat::Ascii))?,
                ExportFormat::PlyBinary => fs::write(
                    &output,
                    service.export_ply(PlyFormat::BinaryLittleEndian),
                )?,
            }
            info!(path = %output.display(), points = service.len(), "cloud written");
        }
        Commands::Demo {
            kind,
            points,
            seed,
            ply,
            output,
            tuning,
        } => {
            tuning.apply(&mut config);
            let service = ScanService::new(config);
            match kind {
                DemoKind::Random => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    service.demo_random_cloud_with_rng(points, &mut rng)?;
                }
                DemoKind::Scene => {
                    if service.scan_scene()? == 0 {
                        bail!("scanner configuration produced no readings");
                    }
                }
            }
            if let Some(path) = ply {
                fs::write(&path, service.export_ply(PlyFormat::Ascii))
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            segment_and_report(&service, output.as_deref()).await?;
        }
        Commands::Config => {
            print!("{}", config.to_yaml_string()?);
        }
    }

    Ok(())
}
