//! ovalscan CLI — detect elliptical objects in binary edge images.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ovalscan::{ContourMethod, DetectConfig, DetectionPipeline, ErrorMethod, MaskTracer};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ovalscan")]
#[command(about = "Detect elliptical objects in edge images by constrained conic fitting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect ellipses in a binary edge image.
    Detect(CliDetectArgs),
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the binary edge image (nonzero pixels are foreground).
    #[arg(long)]
    edges: PathBuf,

    /// Path to write detection results (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Contour retrieval mode.
    #[arg(long, value_enum, default_value_t = ContourMethodArg::External)]
    contour_method: ContourMethodArg,

    /// Fit-error metric.
    #[arg(long, value_enum, default_value_t = ErrorMethodArg::Algebraic)]
    error_method: ErrorMethodArg,

    /// Mantissa of the maximum accepted fit error.
    #[arg(long, default_value = "1.0")]
    error_factor: f64,

    /// Decimal exponent of the maximum accepted fit error
    /// (bound = error_factor / 10^exponent).
    #[arg(long, default_value = "4.0")]
    error_exponent: f64,

    /// Minimum accepted ellipse area in square pixels.
    #[arg(long, default_value = "50.0")]
    min_area: f64,

    /// Maximum major/minor axis ratio; 0 disables the check.
    #[arg(long, default_value = "2.0")]
    max_aspect_ratio: f64,

    /// Maximum relative contour/ellipse area mismatch; 0 disables the check.
    #[arg(long, default_value = "0.0")]
    area_error: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContourMethodArg {
    External,
    All,
}

impl ContourMethodArg {
    fn to_core(self) -> ContourMethod {
        match self {
            Self::External => ContourMethod::External,
            Self::All => ContourMethod::All,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorMethodArg {
    Algebraic,
    Geometric,
    GeometricSimple,
}

impl ErrorMethodArg {
    fn to_core(self) -> ErrorMethod {
        match self {
            Self::Algebraic => ErrorMethod::Algebraic,
            Self::Geometric => ErrorMethod::Geometric,
            Self::GeometricSimple => ErrorMethod::GeometricSimple,
        }
    }
}

impl CliDetectArgs {
    fn to_config(&self) -> DetectConfig {
        DetectConfig {
            contour_method: self.contour_method.to_core(),
            error_method: self.error_method.to_core(),
            error_factor: self.error_factor,
            error_exponent: self.error_exponent,
            min_area: self.min_area,
            max_aspect_ratio: self.max_aspect_ratio,
            area_error: self.area_error,
            ..DetectConfig::default()
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
        Commands::Detect(args) => run_detect(&args),
    }
}

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    tracing::info!("Loading edge image: {}", args.edges.display());

    let img = image::open(&args.edges).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.edges.display(), e).into()
    })?;
    let edges = img.to_luma8();
    let (w, h) = edges.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let config = args.to_config();
    let mut pipeline = DetectionPipeline::new();
    let result = pipeline.detect(&edges, &MaskTracer, &config);

    tracing::info!(
        "Detected {} ellipses from {} contours",
        result.ellipses.len(),
        result.contours.len(),
    );

    let json = serde_json::to_string_pretty(&result)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    Ok(())
}
