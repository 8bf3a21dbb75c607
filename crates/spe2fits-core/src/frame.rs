use ndarray::Array2;
use num_traits::AsPrimitive;

use crate::spe::header::PixelType;

/// Samples of one frame, in the type stored in the file.
/// Shape = (height, width), row 0 is the first stored row.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameData {
    Float32(Array2<f32>),
    Int32(Array2<i32>),
    Int16(Array2<i16>),
    UInt16(Array2<u16>),
    UInt32(Array2<u32>),
}

impl FrameData {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            FrameData::Float32(_) => PixelType::Float32,
            FrameData::Int32(_) => PixelType::Int32,
            FrameData::Int16(_) => PixelType::Int16,
            FrameData::UInt16(_) => PixelType::UInt16,
            FrameData::UInt32(_) => PixelType::UInt32,
        }
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            FrameData::Float32(a) => a.dim(),
            FrameData::Int32(a) => a.dim(),
            FrameData::Int16(a) => a.dim(),
            FrameData::UInt16(a) => a.dim(),
            FrameData::UInt32(a) => a.dim(),
        }
    }

    /// Widen every sample to f64, for display and statistics.
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            FrameData::Float32(a) => widen(a),
            FrameData::Int32(a) => widen(a),
            FrameData::Int16(a) => widen(a),
            FrameData::UInt16(a) => widen(a),
            FrameData::UInt32(a) => widen(a),
        }
    }
}

fn widen<T: AsPrimitive<f64>>(a: &Array2<T>) -> Array2<f64> {
    a.mapv(|v| v.as_())
}

/// One decoded image of an SPE file.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// 0-based position within the file.
    pub index: usize,
    pub data: FrameData,
}

impl Frame {
    pub fn new(index: usize, data: FrameData) -> Self {
        Self { index, data }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn pixel_type(&self) -> PixelType {
        self.data.pixel_type()
    }
}
