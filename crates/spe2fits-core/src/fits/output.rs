use ndarray::{stack, Array2, ArrayD, Axis};

use crate::error::{Result, SpeError};
use crate::fits::Card;
use crate::frame::{Frame, FrameData};
use crate::spe::header::PixelType;

/// Pixel data of one HDU. Shape is `(height, width)` for a single frame and
/// `(frames, height, width)` for a cube.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelArray {
    Float32(ArrayD<f32>),
    Int32(ArrayD<i32>),
    Int16(ArrayD<i16>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
}

impl PixelArray {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            PixelArray::Float32(_) => PixelType::Float32,
            PixelArray::Int32(_) => PixelType::Int32,
            PixelArray::Int16(_) => PixelType::Int16,
            PixelArray::UInt16(_) => PixelType::UInt16,
            PixelArray::UInt32(_) => PixelType::UInt32,
        }
    }

    /// Array shape, slowest axis first.
    pub fn shape(&self) -> &[usize] {
        match self {
            PixelArray::Float32(a) => a.shape(),
            PixelArray::Int32(a) => a.shape(),
            PixelArray::Int16(a) => a.shape(),
            PixelArray::UInt16(a) => a.shape(),
            PixelArray::UInt32(a) => a.shape(),
        }
    }

    /// Axis lengths in FITS order (`NAXIS1` = fastest = width).
    pub fn naxes(&self) -> Vec<usize> {
        self.shape().iter().rev().copied().collect()
    }

    pub fn bitpix(&self) -> i64 {
        match self.pixel_type() {
            PixelType::Float32 => -32,
            PixelType::Int32 | PixelType::UInt32 => 32,
            PixelType::Int16 | PixelType::UInt16 => 16,
        }
    }

    /// Offset applied to store unsigned samples in FITS signed integers.
    pub fn bzero(&self) -> Option<f64> {
        match self.pixel_type() {
            PixelType::UInt16 => Some(32768.0),
            PixelType::UInt32 => Some(2147483648.0),
            _ => None,
        }
    }

    /// Stack frames of one type and shape into a 2-D image or a 3-D cube.
    pub fn from_frames(frames: &[Frame]) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| SpeError::InvalidHeader("no frames to write".into()))?;
        if frames.iter().any(|f| f.data.dim() != first.data.dim()) {
            return Err(SpeError::InvalidHeader("frames differ in shape".into()));
        }

        macro_rules! stack_as {
            ($variant:ident) => {{
                let arrays = frames
                    .iter()
                    .map(|f| match &f.data {
                        FrameData::$variant(a) => Ok(a),
                        other => Err(SpeError::InvalidHeader(format!(
                            "frame {} is {}, expected {}",
                            f.index,
                            other.pixel_type(),
                            first.pixel_type()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                PixelArray::$variant(stack_frames(&arrays)?)
            }};
        }

        Ok(match first.data {
            FrameData::Float32(_) => stack_as!(Float32),
            FrameData::Int32(_) => stack_as!(Int32),
            FrameData::Int16(_) => stack_as!(Int16),
            FrameData::UInt16(_) => stack_as!(UInt16),
            FrameData::UInt32(_) => stack_as!(UInt32),
        })
    }
}

fn stack_frames<T: Clone>(arrays: &[&Array2<T>]) -> Result<ArrayD<T>> {
    if let [single] = arrays {
        return Ok((*single).clone().into_dyn());
    }
    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    stack(Axis(0), &views)
        .map(|cube| cube.into_dyn())
        .map_err(|e| SpeError::InvalidHeader(format!("cannot stack frames: {e}")))
}

/// Everything needed to write one FITS file. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct FitsOutput {
    pixels: PixelArray,
    cards: Vec<Card>,
}

impl FitsOutput {
    pub fn new(pixels: PixelArray, cards: Vec<Card>) -> Self {
        Self { pixels, cards }
    }

    pub fn from_frames(frames: &[Frame], cards: Vec<Card>) -> Result<Self> {
        Ok(Self::new(PixelArray::from_frames(frames)?, cards))
    }

    pub fn pixels(&self) -> &PixelArray {
        &self.pixels
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
