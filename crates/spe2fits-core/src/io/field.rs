//! Positional, typed reads from a fixed-layout header buffer.
//!
//! Every numeric field is little-endian. Reads never panic: a field that does
//! not fit inside the buffer yields [`SpeError::Decode`].

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, SpeError};

/// Declared type of a header field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Fixed-length ASCII, NUL padded.
    Ascii,
    Bytes,
}

impl FieldType {
    /// Byte width for fixed-size types, `None` for variable-length ones.
    pub fn width(self) -> Option<usize> {
        match self {
            FieldType::I8 | FieldType::U8 => Some(1),
            FieldType::I16 | FieldType::U16 => Some(2),
            FieldType::I32 | FieldType::U32 | FieldType::F32 => Some(4),
            FieldType::I64 | FieldType::U64 | FieldType::F64 => Some(8),
            FieldType::Ascii | FieldType::Bytes => None,
        }
    }
}

/// A decoded header field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt(v) => Some(*v),
            FieldValue::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::UInt(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s:?}"),
            FieldValue::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Borrow `length` bytes at `offset`, failing if they run past the buffer.
pub fn field_bytes(buf: &[u8], offset: usize, length: usize) -> Result<&[u8]> {
    let out_of_bounds = || SpeError::Decode {
        offset,
        length,
        buffer_len: buf.len(),
    };
    let end = offset.checked_add(length).ok_or_else(out_of_bounds)?;
    buf.get(offset..end).ok_or_else(out_of_bounds)
}

/// Read one field of `field_type` spanning `length` bytes at `offset`.
///
/// For fixed-size types `length` must equal the type's width.
pub fn read_field(
    buf: &[u8],
    offset: usize,
    length: usize,
    field_type: FieldType,
) -> Result<FieldValue> {
    if let Some(width) = field_type.width() {
        if width != length {
            return Err(SpeError::Decode {
                offset,
                length,
                buffer_len: buf.len(),
            });
        }
    }

    let bytes = field_bytes(buf, offset, length)?;
    let value = match field_type {
        FieldType::I8 => FieldValue::Int(bytes[0] as i8 as i64),
        FieldType::U8 => FieldValue::UInt(bytes[0] as u64),
        FieldType::I16 => FieldValue::Int(LittleEndian::read_i16(bytes) as i64),
        FieldType::U16 => FieldValue::UInt(LittleEndian::read_u16(bytes) as u64),
        FieldType::I32 => FieldValue::Int(LittleEndian::read_i32(bytes) as i64),
        FieldType::U32 => FieldValue::UInt(LittleEndian::read_u32(bytes) as u64),
        FieldType::I64 => FieldValue::Int(LittleEndian::read_i64(bytes)),
        FieldType::U64 => FieldValue::UInt(LittleEndian::read_u64(bytes)),
        FieldType::F32 => FieldValue::Float(LittleEndian::read_f32(bytes) as f64),
        FieldType::F64 => FieldValue::Float(LittleEndian::read_f64(bytes)),
        FieldType::Ascii => FieldValue::Text(decode_ascii(bytes)),
        FieldType::Bytes => FieldValue::Bytes(bytes.to_vec()),
    };
    Ok(value)
}

pub fn read_i16(buf: &[u8], offset: usize) -> Result<i16> {
    Ok(LittleEndian::read_i16(field_bytes(buf, offset, 2)?))
}

pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    Ok(LittleEndian::read_u16(field_bytes(buf, offset, 2)?))
}

pub fn read_i32(buf: &[u8], offset: usize) -> Result<i32> {
    Ok(LittleEndian::read_i32(field_bytes(buf, offset, 4)?))
}

pub fn read_u64(buf: &[u8], offset: usize) -> Result<u64> {
    Ok(LittleEndian::read_u64(field_bytes(buf, offset, 8)?))
}

pub fn read_f32(buf: &[u8], offset: usize) -> Result<f32> {
    Ok(LittleEndian::read_f32(field_bytes(buf, offset, 4)?))
}

/// Read a fixed-length ASCII field, cut at the first NUL.
pub fn read_string(buf: &[u8], offset: usize, length: usize) -> Result<String> {
    Ok(decode_ascii(field_bytes(buf, offset, length)?))
}

fn decode_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
        .trim_end_matches(['\0', ' '])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        buf[0..2].copy_from_slice(&(-2i16).to_le_bytes());
        buf[2..4].copy_from_slice(&512u16.to_le_bytes());
        buf[4..8].copy_from_slice(&2.5f32.to_le_bytes());
        buf[8..16].copy_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());
        buf[16..21].copy_from_slice(b"hello");
        buf
    }

    #[test]
    fn reads_little_endian_numbers() {
        let buf = sample();
        assert_eq!(read_field(&buf, 0, 2, FieldType::I16).unwrap(), FieldValue::Int(-2));
        assert_eq!(read_field(&buf, 2, 2, FieldType::U16).unwrap(), FieldValue::UInt(512));
        assert_eq!(read_field(&buf, 4, 4, FieldType::F32).unwrap(), FieldValue::Float(2.5));
        assert_eq!(read_u64(&buf, 8).unwrap(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn strings_lose_nul_padding() {
        let buf = sample();
        assert_eq!(read_string(&buf, 16, 10).unwrap(), "hello");
        assert_eq!(
            read_field(&buf, 16, 16, FieldType::Ascii).unwrap(),
            FieldValue::Text("hello".into())
        );
    }

    #[test]
    fn garbage_after_nul_is_ignored() {
        let mut buf = vec![0u8; 8];
        buf[..3].copy_from_slice(b"ab\0");
        buf[3..6].copy_from_slice(b"xyz");
        assert_eq!(read_string(&buf, 0, 8).unwrap(), "ab");
    }

    #[test]
    fn out_of_bounds_is_decode_error() {
        let buf = sample();
        assert!(matches!(
            read_field(&buf, 30, 4, FieldType::U32),
            Err(SpeError::Decode { offset: 30, length: 4, buffer_len: 32 })
        ));
        assert!(read_u16(&buf, usize::MAX).is_err());
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let buf = sample();
        assert!(read_field(&buf, 0, 4, FieldType::I16).is_err());
    }

    #[test]
    fn raw_bytes_are_copied() {
        let buf = sample();
        assert_eq!(
            read_field(&buf, 16, 2, FieldType::Bytes).unwrap(),
            FieldValue::Bytes(b"he".to_vec())
        );
    }

    #[test]
    fn display_values() {
        assert_eq!(FieldValue::Float(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Text("v3".into()).to_string(), "\"v3\"");
        assert_eq!(FieldValue::Bytes(vec![0x55, 0x0a]).to_string(), "550a");
    }
}
