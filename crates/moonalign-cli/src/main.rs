//! moonalign CLI — register Moon photographs against a reference map.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "moonalign")]
#[command(about = "Register Moon photographs against a reference map (disk detection, feature matching, homography warp)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an uploaded photo and emit both artifacts.
    Register(CliRegisterArgs),

    /// Locate the lunar disk in a photo without registering it.
    LocateDisk {
        /// Path to the input photo.
        #[arg(long)]
        image: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliRegisterArgs {
    /// Filename of the uploaded photo (resolved under --uploads-dir).
    #[arg(long)]
    filename: String,

    /// Directory holding uploaded photos.
    #[arg(long)]
    uploads_dir: PathBuf,

    /// Directory holding the reference map tiles.
    #[arg(long)]
    reference_dir: PathBuf,

    /// Directory receiving the output artifacts.
    #[arg(long)]
    processed_dir: PathBuf,

    /// Path to write the registration report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Crop margin around the detected disk in pixels.
    #[arg(long, default_value = "15")]
    crop_margin: u32,

    /// FAST corner threshold for feature detection.
    #[arg(long, default_value = "20")]
    fast_threshold: u8,

    /// Maximum keypoints kept per image.
    #[arg(long, default_value = "800")]
    max_keypoints: usize,

    /// Lowe ratio for match filtering.
    #[arg(long, default_value = "0.75")]
    match_ratio: f32,

    /// RANSAC inlier threshold in pixels for homography fitting.
    #[arg(long, default_value = "5.0")]
    ransac_thresh_px: f64,

    /// Maximum RANSAC iterations for homography.
    #[arg(long, default_value = "2000")]
    ransac_iters: usize,
}

impl CliRegisterArgs {
    fn to_config(&self) -> moonalign::RegisterConfig {
        let mut config = moonalign::RegisterConfig::default();
        config.frame.margin_px = self.crop_margin;
        config.features.fast_threshold = self.fast_threshold;
        config.features.max_keypoints = self.max_keypoints;
        config.features.ratio = self.match_ratio;
        config.ransac.inlier_threshold = self.ransac_thresh_px;
        config.ransac.max_iters = self.ransac_iters;
        config
    }

    fn to_dirs(&self) -> moonalign::Dirs {
        moonalign::Dirs {
            uploads: self.uploads_dir.clone(),
            reference: self.reference_dir.clone(),
            processed: self.processed_dir.clone(),
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register(args) => run_register(&args),
        Commands::LocateDisk { image } => run_locate_disk(&image),
    }
}

// ── register ───────────────────────────────────────────────────────────

fn run_register(args: &CliRegisterArgs) -> CliResult<()> {
    let config = args.to_config();
    let dirs = args.to_dirs();

    let report = moonalign::run_request(&args.filename, &dirs, &config)?;

    tracing::info!(
        "registered {}: tier {} (ppd {}), {}/{} correspondences inlying",
        report.filename,
        report.tier,
        report.ppd,
        report.ransac.n_inliers,
        report.ransac.n_candidates,
    );
    tracing::info!(
        "reprojection error: mean={:.2}px, p95={:.2}px",
        report.ransac.mean_err_px,
        report.ransac.p95_err_px,
    );

    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

// ── locate-disk ────────────────────────────────────────────────────────

fn run_locate_disk(image_path: &PathBuf) -> CliResult<()> {
    let img = image::open(image_path)
        .map_err(|e| -> CliError {
            format!("Failed to open image {}: {}", image_path.display(), e).into()
        })?
        .to_rgb8();
    let (w, h) = img.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let circle = moonalign::locate_disk(
        &img,
        &moonalign::DiskConfig::default(),
        &moonalign::SmoothingConfig::default(),
    )
    .ok_or_else(|| -> CliError { "no disk detected".into() })?;

    println!("{}", serde_json::to_string_pretty(&circle)?);
    Ok(())
}
