use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported SPE header version {0}")]
    UnsupportedVersion(f32),

    #[error("Invalid SPE header: {0}")]
    InvalidHeader(String),

    #[error("Unknown pixel type code {0}")]
    UnknownPixelType(i16),

    #[error("Truncated data: need {needed} bytes, file has {available}")]
    TruncatedData { needed: usize, available: usize },

    #[error("Field read out of bounds: {length} bytes at offset {offset} (buffer is {buffer_len})")]
    Decode {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("Malformed XML footer: {0}")]
    FooterParse(String),

    #[error("Malformed {field} field: {raw:?}")]
    MalformedField { field: &'static str, raw: String },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("FITS error: {0}")]
    Fits(#[from] fitsio_pure::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(String),
}

impl SpeError {
    /// Metadata problems degrade the output instead of aborting the conversion.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpeError::FooterParse(_) | SpeError::MalformedField { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpeError>;
