use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SpeError};
use crate::io::field::{read_i16, read_i32, read_u16, read_u64};
use crate::spe::layout::{
    DATATYPE, HEADER_SIZE, LAST_VALUE, LAST_VALUE_MAGIC, NUM_FRAMES, XDIM, XML_OFFSET, YDIM,
};
use crate::spe::legacy::{self, SentinelPolicy};
use crate::spe::version::{header_version, SpeVersion};
use crate::spe::footer;

/// Numeric encoding of the stored samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    Float32,
    Int32,
    Int16,
    UInt16,
    UInt32,
}

impl PixelType {
    pub fn from_code(code: i16) -> Result<Self> {
        match code {
            0 => Ok(PixelType::Float32),
            1 => Ok(PixelType::Int32),
            2 => Ok(PixelType::Int16),
            3 => Ok(PixelType::UInt16),
            8 => Ok(PixelType::UInt32),
            other => Err(SpeError::UnknownPixelType(other)),
        }
    }

    pub fn code(self) -> i16 {
        match self {
            PixelType::Float32 => 0,
            PixelType::Int32 => 1,
            PixelType::Int16 => 2,
            PixelType::UInt16 => 3,
            PixelType::UInt32 => 8,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelType::Int16 | PixelType::UInt16 => 2,
            PixelType::Float32 | PixelType::Int32 | PixelType::UInt32 => 4,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelType::Float32 => "float32",
            PixelType::Int32 => "int32",
            PixelType::Int16 => "int16",
            PixelType::UInt16 => "uint16",
            PixelType::UInt32 => "uint32",
        };
        f.write_str(name)
    }
}

/// Camera gain as recorded by the acquisition software.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Gain {
    Index(i64),
    Factor(f64),
    /// Named setting such as `"Medium"`.
    Setting(String),
}

/// Acquisition metadata with every sentinel already resolved to `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeMetadata {
    /// Seconds.
    pub exposure_time: Option<f64>,
    /// ISO-8601, UTC when the source says so.
    pub date_acquired: Option<String>,
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    pub gain: Option<Gain>,
    /// Milliseconds.
    pub readout_time: Option<f64>,
    pub comments: Vec<String>,
}

impl SpeMetadata {
    pub fn is_empty(&self) -> bool {
        *self == SpeMetadata::default()
    }
}

/// Version-specific part of the header.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderLayout {
    /// All metadata read from fixed offsets.
    Legacy,
    /// Metadata in an XML footer; `None` when the file has none.
    Footer { offset: Option<u64> },
}

/// A decoded SPE header. Pixel data is read separately, see
/// [`crate::spe::reader`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpeFile {
    pub version: SpeVersion,
    /// Raw `file_header_ver` value, kept for provenance.
    pub header_version: f32,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub pixel_type: PixelType,
    pub data_offset: usize,
    pub layout: HeaderLayout,
    pub metadata: SpeMetadata,
    /// Non-fatal metadata problems hit while decoding.
    pub warnings: Vec<String>,
}

impl SpeFile {
    pub fn frame_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.pixel_type.bytes_per_pixel()
    }

    /// Minimum file length that holds every frame, `None` on overflow.
    pub fn required_len(&self) -> Option<usize> {
        self.frame_byte_size()
            .checked_mul(self.frame_count as usize)?
            .checked_add(self.data_offset)
    }

    /// Fail with [`SpeError::TruncatedData`] unless `file_len` holds every frame.
    pub fn check_data_region(&self, file_len: usize) -> Result<()> {
        match self.required_len() {
            Some(needed) if needed <= file_len => Ok(()),
            needed => Err(SpeError::TruncatedData {
                needed: needed.unwrap_or(usize::MAX),
                available: file_len,
            }),
        }
    }
}

/// Decode the header with the default sentinel table.
pub fn parse_header(buf: &[u8], version: SpeVersion) -> Result<SpeFile> {
    parse_header_with(buf, version, &SentinelPolicy::default())
}

/// Decode the header of a whole SPE file held in `buf`.
pub fn parse_header_with(
    buf: &[u8],
    version: SpeVersion,
    sentinels: &SentinelPolicy,
) -> Result<SpeFile> {
    if buf.len() < HEADER_SIZE {
        return Err(SpeError::TruncatedData {
            needed: HEADER_SIZE,
            available: buf.len(),
        });
    }

    let header_version = header_version(buf)?;
    let width = read_u16(buf, XDIM)?;
    let height = read_u16(buf, YDIM)?;
    let frame_count = read_i32(buf, NUM_FRAMES)?;
    if width == 0 || height == 0 || frame_count <= 0 {
        return Err(SpeError::InvalidHeader(format!(
            "geometry {}x{} with {} frames",
            width, height, frame_count
        )));
    }

    let pixel_type = PixelType::from_code(read_i16(buf, DATATYPE)?)?;

    let last_value = read_i16(buf, LAST_VALUE)?;
    if last_value != LAST_VALUE_MAGIC {
        debug!(last_value, "header end marker missing");
    }

    let (layout, metadata, warnings) = match version {
        SpeVersion::V2 => {
            let (metadata, warnings) = legacy::extract_metadata(buf, sentinels)?;
            (HeaderLayout::Legacy, metadata, warnings)
        }
        SpeVersion::V3 => {
            let raw_offset = read_u64(buf, XML_OFFSET)?;
            let offset = footer::locate(raw_offset, buf.len());
            let (metadata, warnings) = match offset {
                Some(start) => footer::extract_metadata(&buf[start as usize..]),
                None => (SpeMetadata::default(), Vec::new()),
            };
            (HeaderLayout::Footer { offset }, metadata, warnings)
        }
    };

    debug!(
        %version,
        width,
        height,
        frame_count,
        %pixel_type,
        "parsed SPE header"
    );

    Ok(SpeFile {
        version,
        header_version,
        width: width as u32,
        height: height as u32,
        frame_count: frame_count as u32,
        pixel_type,
        data_offset: HEADER_SIZE,
        layout,
        metadata,
        warnings,
    })
}
