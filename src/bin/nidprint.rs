//! nidprint CLI: enroll a fingerprint gallery and identify scans against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nidprint::{
    DescriptorMeta, EnrollmentSource, IdentificationService, JsonProfileDirectory, LoggingConfig,
    NidprintConfig, ProfileDirectory, TemplateStore, enroll,
};

#[derive(Parser)]
#[command(name = "nidprint")]
#[command(about = "Fingerprint identification against an enrolled national-ID gallery")]
#[command(version)]
struct Cli {
    /// YAML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overrides `logging.level`. `RUST_LOG` wins over both.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the gallery from an image directory and print the enrollment report.
    Enroll(EnrollArgs),

    /// Identify a single scan.
    Identify(IdentifyArgs),
}

#[derive(Debug, Clone, Args)]
struct GalleryArgs {
    /// Enrollment image directory.
    #[arg(long)]
    dir: Option<PathBuf>,

    /// First key of the enrollment range.
    #[arg(long)]
    first: Option<u64>,

    /// Last key of the enrollment range (inclusive).
    #[arg(long)]
    last: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct EnrollArgs {
    #[command(flatten)]
    gallery: GalleryArgs,

    /// Write the gallery to this snapshot file.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct IdentifyArgs {
    /// Query scan.
    image: PathBuf,

    /// Load the gallery from a snapshot instead of enrolling from images.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[command(flatten)]
    gallery: GalleryArgs,

    /// JSON profile directory, overrides `profiles` in the config.
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Acceptance threshold, overrides `matcher.threshold`.
    #[arg(long)]
    threshold: Option<f64>,

    /// Print the N closest gallery entries instead of a decision.
    #[arg(long)]
    candidates: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => NidprintConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NidprintConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json |= cli.json_logs;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Enroll(args) => run_enroll(&mut config, args),
        Commands::Identify(args) => run_identify(&mut config, args),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_gallery_args(source: &mut EnrollmentSource, args: &GalleryArgs) -> Result<()> {
    if let Some(dir) = &args.dir {
        source.directory = dir.clone();
    }
    if let Some(first) = args.first {
        source.first_key = first;
    }
    if let Some(last) = args.last {
        source.last_key = last;
    }
    source.validate().context("invalid enrollment range")?;
    if !source.directory.is_dir() {
        bail!(
            "enrollment directory {} does not exist",
            source.directory.display()
        );
    }
    Ok(())
}

fn run_enroll(config: &mut NidprintConfig, args: EnrollArgs) -> Result<()> {
    apply_gallery_args(&mut config.enrollment, &args.gallery)?;
    let pipeline = config.pipeline();
    let (store, report) = enroll(&pipeline, &config.enrollment)?;
    if let Some(path) = &args.snapshot {
        store
            .save_snapshot(path, &config.snapshot)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), templates = store.len(), "snapshot_written");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_gallery(config: &mut NidprintConfig, args: &IdentifyArgs) -> Result<TemplateStore> {
    if let Some(path) = &args.snapshot {
        let expected = DescriptorMeta::for_config(&config.perceptual);
        return TemplateStore::load_snapshot(path, &expected)
            .with_context(|| format!("reading snapshot {}", path.display()));
    }
    apply_gallery_args(&mut config.enrollment, &args.gallery)?;
    let (store, _) = enroll(&config.pipeline(), &config.enrollment)?;
    Ok(store)
}

fn load_profiles(path: &Path) -> Result<JsonProfileDirectory> {
    JsonProfileDirectory::from_file(path)
        .with_context(|| format!("reading profiles {}", path.display()))
}

fn run_identify(config: &mut NidprintConfig, args: IdentifyArgs) -> Result<()> {
    if let Some(threshold) = args.threshold {
        config.matcher = config.matcher.clone().with_threshold(threshold);
    }
    let store = load_gallery(config, &args)?;
    let service = IdentificationService::new(config.pipeline(), Arc::new(store), config.matcher.clone())?;

    let bytes =
        fs::read(&args.image).with_context(|| format!("reading {}", args.image.display()))?;

    if let Some(k) = args.candidates {
        let candidates = service.candidates(&bytes, k)?;
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    let profiles = match args.profiles.as_ref().or(config.profiles.as_ref()) {
        Some(path) => Some(load_profiles(path)?),
        None => None,
    };
    let response = service.respond(
        &bytes,
        profiles.as_ref().map(|p| p as &dyn ProfileDirectory),
    )?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
