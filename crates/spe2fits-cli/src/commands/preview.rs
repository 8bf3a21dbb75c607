use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use spe2fits_core::preview::save_preview;
use spe2fits_core::spe::SpeReader;

#[derive(Args)]
pub struct PreviewArgs {
    /// Input SPE file
    pub file: PathBuf,

    /// Frame index (0-based)
    #[arg(long, default_value = "0")]
    pub frame: usize,

    /// Output PNG path (default: <input>_preview.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &PreviewArgs) -> Result<()> {
    let reader = SpeReader::open(&args.file)?;
    let frame = reader.read_frame(args.frame)?;

    let output = match args.output {
        Some(ref path) => path.clone(),
        None => {
            let stem = args
                .file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "frame".to_string());
            args.file.with_file_name(format!("{stem}_preview.png"))
        }
    };

    save_preview(&frame, &output)
        .with_context(|| format!("Failed to save preview to {}", output.display()))?;
    println!(
        "Frame {} of {} ({}x{}) saved to {}",
        args.frame,
        reader.frame_count(),
        frame.width(),
        frame.height(),
        output.display()
    );
    Ok(())
}
