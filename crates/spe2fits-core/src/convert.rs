//! SPE → FITS conversion for single files and whole directories.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{ConvertConfig, OutputLayout};
use crate::error::{Result, SpeError};
use crate::fits::writer::write_fits_set;
use crate::fits::keywords::header_field_cards;
use crate::fits::{map_metadata, Card, FitsOutput, FitsValue};
use crate::frame::Frame;
use crate::spe::{HeaderLayout, SpeReader, SpeVersion};

pub const TOOL_NAME: &str = concat!("spe2fits ", env!("CARGO_PKG_VERSION"));

/// Outcome of converting one SPE file.
#[derive(Clone, Debug)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub version: SpeVersion,
    pub frames: usize,
    pub outputs: Vec<PathBuf>,
    /// Metadata problems that were skipped over.
    pub warnings: Vec<String>,
}

/// Outcome of a batch run. Failures do not stop the other files.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConversionReport>,
    pub failed: Vec<(PathBuf, SpeError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Output file names for `input`, in frame order.
pub fn output_paths(input: &Path, frame_count: usize, config: &ConvertConfig) -> Vec<PathBuf> {
    let dir = match config.output_dir {
        Some(ref dir) => dir.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    match config.layout {
        OutputLayout::Cube => vec![dir.join(format!("{stem}.fits"))],
        OutputLayout::PerFrame => (0..frame_count)
            .map(|i| dir.join(format!("{stem}_x{i:03}.fits")))
            .collect(),
    }
}

/// Decode every frame and build the FITS outputs for `reader`.
///
/// Nothing is written here; any structural error surfaces before output
/// files are touched.
pub fn build_outputs<B: AsRef<[u8]>>(
    reader: &SpeReader<B>,
    source_name: &str,
    config: &ConvertConfig,
) -> Result<Vec<FitsOutput>> {
    let frames: Vec<Frame> = reader.frames().collect::<Result<_>>()?;
    let mut cards = map_metadata(&reader.header);
    if config.header_fields && reader.header.layout == HeaderLayout::Legacy {
        cards.extend(header_field_cards(reader.as_bytes())?);
    }
    if config.provenance {
        cards.push(
            Card::new("SPEFNAME", FitsValue::Text(source_name.to_string()))
                .with_comment("original SPE filename"),
        );
        cards.push(Card::new("ORIGIN", FitsValue::Text(TOOL_NAME.to_string())));
    }

    match config.layout {
        OutputLayout::Cube => Ok(vec![FitsOutput::from_frames(&frames, cards)?]),
        OutputLayout::PerFrame => {
            let cards: Vec<Card> = cards.into_iter().filter(|c| c.keyword != "NAXIS3").collect();
            frames
                .into_iter()
                .map(|frame| {
                    let mut frame_cards = cards.clone();
                    if config.provenance {
                        frame_cards.push(
                            Card::new("FRAMENUM", FitsValue::Integer(frame.index as i64))
                                .with_comment("frame index in source file"),
                        );
                    }
                    FitsOutput::from_frames(std::slice::from_ref(&frame), frame_cards)
                })
                .collect()
        }
    }
}

/// Convert one SPE file according to `config`.
pub fn convert_file(input: &Path, config: &ConvertConfig) -> Result<ConversionReport> {
    let reader = SpeReader::open_with(input, &config.sentinels)?;
    let header = &reader.header;
    for warning in &header.warnings {
        warn!(file = %input.display(), "{warning}");
    }

    let paths = output_paths(input, reader.frame_count(), config);
    if !config.overwrite {
        if let Some(existing) = paths.iter().find(|p| p.exists()) {
            return Err(SpeError::OutputExists(existing.clone()));
        }
    }

    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let outputs = build_outputs(&reader, &source_name, config)?;
    let targets: Vec<(&Path, &FitsOutput)> = paths.iter().map(PathBuf::as_path).zip(&outputs).collect();
    write_fits_set(&targets, config.overwrite)?;

    info!(
        file = %input.display(),
        version = %header.version,
        frames = reader.frame_count(),
        outputs = paths.len(),
        "converted"
    );

    Ok(ConversionReport {
        input: input.to_path_buf(),
        version: header.version,
        frames: reader.frame_count(),
        outputs: paths,
        warnings: header.warnings.clone(),
    })
}

/// Convert many files in parallel. Existing outputs are overwritten.
pub fn convert_batch(inputs: &[PathBuf], config: &ConvertConfig) -> BatchReport {
    convert_batch_with(inputs, config, |_, _| {})
}

/// Like [`convert_batch`], calling `on_done` as each file finishes.
pub fn convert_batch_with<F>(inputs: &[PathBuf], config: &ConvertConfig, on_done: F) -> BatchReport
where
    F: Fn(&Path, &Result<ConversionReport>) + Sync,
{
    let config = ConvertConfig {
        overwrite: true,
        ..config.clone()
    };

    let results: Vec<(PathBuf, Result<ConversionReport>)> = inputs
        .par_iter()
        .map(|input| {
            let result = convert_file(input, &config);
            if let Err(ref err) = result {
                warn!(file = %input.display(), "conversion failed: {err}");
            }
            on_done(input, &result);
            (input.clone(), result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(converted) => report.converted.push(converted),
            Err(err) => report.failed.push((input, err)),
        }
    }
    report
}

/// All `.spe` files in `dir` (extension matched case-insensitively), sorted.
pub fn find_spe_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_spe = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("spe"));
        if is_spe && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
