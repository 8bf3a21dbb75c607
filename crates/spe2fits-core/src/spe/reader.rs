use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use ndarray::Array2;
use tracing::debug;

use crate::error::{Result, SpeError};
use crate::frame::{Frame, FrameData};
use crate::spe::header::{parse_header_with, PixelType, SpeFile};
use crate::spe::legacy::SentinelPolicy;
use crate::spe::version::detect_version;

/// Decode the whole header of an in-memory SPE file.
pub fn decode_header(buf: &[u8], sentinels: &SentinelPolicy) -> Result<SpeFile> {
    let version = detect_version(buf)?;
    let header = parse_header_with(buf, version, sentinels)?;
    header.check_data_region(buf.len())?;
    Ok(header)
}

/// Raw bytes of frame `index`.
pub fn frame_bytes<'a>(buf: &'a [u8], header: &SpeFile, index: usize) -> Result<&'a [u8]> {
    let total = header.frame_count as usize;
    if index >= total {
        return Err(SpeError::FrameIndexOutOfRange { index, total });
    }
    let size = header.frame_byte_size();
    let end = index
        .checked_add(1)
        .and_then(|n| n.checked_mul(size))
        .and_then(|n| n.checked_add(header.data_offset))
        .unwrap_or(usize::MAX);
    let start = end.saturating_sub(size);
    buf.get(start..end).ok_or(SpeError::TruncatedData {
        needed: end,
        available: buf.len(),
    })
}

/// Decode frame `index` into a `height x width` array.
///
/// Frames are independent: any index can be read without touching the others.
pub fn extract_frame(buf: &[u8], header: &SpeFile, index: usize) -> Result<Frame> {
    let raw = frame_bytes(buf, header, index)?;
    let shape = (header.height as usize, header.width as usize);

    let data = match header.pixel_type {
        PixelType::Float32 => FrameData::Float32(decode(raw, shape, LittleEndian::read_f32_into)?),
        PixelType::Int32 => FrameData::Int32(decode(raw, shape, LittleEndian::read_i32_into)?),
        PixelType::Int16 => FrameData::Int16(decode(raw, shape, LittleEndian::read_i16_into)?),
        PixelType::UInt16 => FrameData::UInt16(decode(raw, shape, LittleEndian::read_u16_into)?),
        PixelType::UInt32 => FrameData::UInt32(decode(raw, shape, LittleEndian::read_u32_into)?),
    };
    Ok(Frame::new(index, data))
}

fn decode<T: Copy + Default>(
    raw: &[u8],
    shape: (usize, usize),
    read_into: fn(&[u8], &mut [T]),
) -> Result<Array2<T>> {
    let mut samples = vec![T::default(); shape.0 * shape.1];
    read_into(raw, &mut samples);
    Array2::from_shape_vec(shape, samples)
        .map_err(|e| SpeError::InvalidHeader(format!("frame shape {:?}: {e}", shape)))
}

/// SPE file reader over a memory map or any owned byte buffer.
pub struct SpeReader<B = Mmap> {
    buf: B,
    pub header: SpeFile,
}

impl SpeReader<Mmap> {
    /// Open an SPE file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &SentinelPolicy::default())
    }

    pub fn open_with(path: &Path, sentinels: &SentinelPolicy) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        debug!(path = %path.display(), len = mmap.len(), "mapped SPE file");
        Self::from_buffer_with(mmap, sentinels)
    }
}

impl<B: AsRef<[u8]>> SpeReader<B> {
    pub fn from_buffer(buf: B) -> Result<Self> {
        Self::from_buffer_with(buf, &SentinelPolicy::default())
    }

    pub fn from_buffer_with(buf: B, sentinels: &SentinelPolicy) -> Result<Self> {
        let header = decode_header(buf.as_ref(), sentinels)?;
        Ok(Self { buf, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Raw bytes of one frame (zero-copy).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        frame_bytes(self.buf.as_ref(), &self.header, index)
    }

    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        extract_frame(self.buf.as_ref(), &self.header, index)
    }

    /// Iterator over all frames. Call again to restart.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        (0..self.frame_count()).map(move |i| self.read_frame(i))
    }
}
