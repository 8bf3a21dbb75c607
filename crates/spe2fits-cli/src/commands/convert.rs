use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use spe2fits_core::config::{load_config, ConvertConfig, OutputLayout};
use spe2fits_core::convert::{convert_batch_with, convert_file, find_spe_files};
use tracing::debug;

use crate::summary::{print_batch_summary, print_conversion};

#[derive(Args)]
pub struct ConvertArgs {
    /// Input SPE file(s)
    #[arg(required_unless_present = "all")]
    pub files: Vec<PathBuf>,

    /// Convert every .spe file in DIR (current directory if omitted)
    #[arg(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = ".",
        conflicts_with = "files"
    )]
    pub all: Option<PathBuf>,

    /// Overwrite existing FITS files
    #[arg(short, long)]
    pub force: bool,

    /// Write one 2-D FITS file per frame instead of a cube
    #[arg(long)]
    pub per_frame: bool,

    /// Output directory (defaults to next to each input)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML conversion config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Leave out SPEFNAME/ORIGIN provenance cards
    #[arg(long)]
    pub no_provenance: bool,

    /// Also copy every other recorded WinView header field into its own card
    #[arg(long)]
    pub header_fields: bool,
}

fn build_config(args: &ConvertArgs) -> Result<ConvertConfig> {
    let mut config = match args.config {
        Some(ref path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConvertConfig::default(),
    };
    if args.force {
        config.overwrite = true;
    }
    if args.per_frame {
        config.layout = OutputLayout::PerFrame;
    }
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir.clone();
    }
    if args.no_provenance {
        config.provenance = false;
    }
    if args.header_fields {
        config.header_fields = true;
    }
    if let Some(ref dir) = config.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    Ok(config)
}

pub fn run(args: &ConvertArgs) -> Result<()> {
    let config = build_config(args)?;
    debug!(layout = %config.layout, overwrite = config.overwrite, "conversion config");

    match args.all {
        Some(ref dir) => run_batch(dir, &config),
        None => run_files(&args.files, &config),
    }
}

fn run_files(files: &[PathBuf], config: &ConvertConfig) -> Result<()> {
    let mut failed = 0;
    for file in files {
        match convert_file(file, config) {
            Ok(report) => print_conversion(&report),
            Err(err) => {
                eprintln!("{}: {}", file.display(), err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed to convert", failed, files.len());
    }
    Ok(())
}

fn run_batch(dir: &Path, config: &ConvertConfig) -> Result<()> {
    let inputs = find_spe_files(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    if inputs.is_empty() {
        println!("No .spe files found in {}", dir.display());
        return Ok(());
    }

    let start = Instant::now();
    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Converting [{bar:40}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let report = convert_batch_with(&inputs, config, |input, _| {
        if let Some(name) = input.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
    });
    pb.finish_and_clear();

    print_batch_summary(&report, start.elapsed());

    if !report.is_success() {
        bail!(
            "{} of {} file(s) failed to convert",
            report.failed.len(),
            inputs.len()
        );
    }
    Ok(())
}
