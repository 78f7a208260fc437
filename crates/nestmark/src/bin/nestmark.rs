//! nestmark CLI: detect nested-square patterns and score them against labels.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::info;
use nestmark::core::level_from_verbosity;
use nestmark::eval::EvalConfig;
use nestmark::extract::ImageprocExtractor;
use nestmark::run::{detect_file, run_directory, run_evaluation, RunOptions};
use nestmark::{PatternDetector, PatternParams};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "nestmark")]
#[command(about = "Detect nested-square fiducial patterns and evaluate them against labeled boxes")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect patterns in a single image.
    Detect {
        /// Path to the input image.
        #[arg(long)]
        image: PathBuf,

        /// Path to write the detection (JSON). Prints a summary when omitted.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Path to write a copy of the image with outlines drawn.
        #[arg(long)]
        annotate: Option<PathBuf>,

        #[command(flatten)]
        params: ParamsArgs,
    },

    /// Run a labeled evaluation described by a JSON config.
    Evaluate {
        /// Path to the evaluation config (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Directory for annotated copies of the evaluated images.
        #[arg(long)]
        annotate_dir: Option<PathBuf>,
    },

    /// Detect patterns in every image of a directory.
    RunDir {
        /// Directory with input images.
        #[arg(long)]
        dir: PathBuf,

        /// Path to write the detection report (JSON).
        #[arg(long)]
        out: PathBuf,

        /// Directory for annotated copies of the images.
        #[arg(long)]
        annotate_dir: Option<PathBuf>,

        #[command(flatten)]
        params: ParamsArgs,
    },
}

#[derive(Debug, Clone, Args)]
struct ParamsArgs {
    /// Pattern parameters (JSON); missing fields keep their defaults.
    #[arg(long)]
    params: Option<PathBuf>,
}

impl ParamsArgs {
    fn detector(&self) -> CliResult<PatternDetector> {
        let params = match &self.params {
            Some(path) => serde_json::from_str::<PatternParams>(&fs::read_to_string(path)?)?,
            None => PatternParams::default(),
        };
        Ok(PatternDetector::new(params))
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    // The subscriber may install its own bridge; either one is fine.
    let _ = tracing_log::LogTracer::init_with_filter(level_from_verbosity(cli.verbose));
    nestmark::core::init_tracing(level_from_verbosity(cli.verbose), cli.log_json);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    nestmark::core::init_with_level(level_from_verbosity(cli.verbose))?;
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Detect {
            image,
            out,
            annotate,
            params,
        } => run_detect(&image, out.as_deref(), annotate.as_deref(), &params),
        Commands::Evaluate {
            config,
            annotate_dir,
        } => run_evaluate(&config, annotate_dir),
        Commands::RunDir {
            dir,
            out,
            annotate_dir,
            params,
        } => run_dir(&dir, &out, annotate_dir, &params),
    }
}

fn run_detect(
    image_path: &Path,
    out_path: Option<&Path>,
    annotate_path: Option<&Path>,
    params: &ParamsArgs,
) -> CliResult<()> {
    let detector = params.detector()?;
    let detection = detect_file(image_path, &detector, &ImageprocExtractor)?;

    if let Some(path) = annotate_path {
        nestmark::annotate::write_annotated(image_path, &detection, path)?;
        info!("annotated image written to {}", path.display());
    }

    match out_path {
        Some(path) => {
            fs::write(path, serde_json::to_string_pretty(&detection)?)?;
            info!("detection written to {}", path.display());
        }
        None => {
            println!("patterns: {}", detection.patterns.len());
            for pattern in &detection.patterns {
                let b = pattern.bbox;
                println!(
                    "  contour {}: x=[{}, {}] y=[{}, {}]",
                    pattern.candidate.node, b.xmin, b.xmax, b.ymin, b.ymax
                );
            }
        }
    }
    Ok(())
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

fn run_evaluate(config_path: &Path, annotate_dir: Option<PathBuf>) -> CliResult<()> {
    let config = EvalConfig::load_json(config_path)?;
    let options = RunOptions { annotate_dir };
    let report = run_evaluation(&config, &ImageprocExtractor, &options)?;

    let m = &report.metrics;
    println!("images = {}", m.images);
    println!("precision = {}", fmt_ratio(m.precision));
    println!("recall = {}", fmt_ratio(m.recall));
    match m.mean_latency_ms {
        Some(ms) => println!("avg_time = {:.3} sec per image", ms / 1e3),
        None => println!("avg_time = n/a"),
    }
    info!("report written to {}", config.output_path().display());
    Ok(())
}

fn run_dir(
    dir: &Path,
    out_path: &Path,
    annotate_dir: Option<PathBuf>,
    params: &ParamsArgs,
) -> CliResult<()> {
    let detector = params.detector()?;
    let options = RunOptions { annotate_dir };
    let report = run_directory(dir, &detector, &ImageprocExtractor, &options)?;
    report.write_json(out_path)?;
    println!(
        "images = {}, detections = {}",
        report.images.len(),
        report.num_detections()
    );
    Ok(())
}
