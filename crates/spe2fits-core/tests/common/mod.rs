use std::path::{Path, PathBuf};

use spe2fits_core::spe::layout::{
    DATATYPE, FILE_HEADER_VER, HEADER_SIZE, LAST_VALUE, LAST_VALUE_MAGIC, NUM_FRAMES, XDIM,
    XML_OFFSET, YDIM,
};

/// Build a 4100-byte SPE header with the given geometry.
///
/// `datatype`: 0=float32, 1=int32, 2=int16, 3=uint16, 8=uint32
pub fn build_spe_header(
    version: f32,
    width: u16,
    height: u16,
    datatype: i16,
    num_frames: i32,
) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_SIZE];
    put(&mut buf, FILE_HEADER_VER, &version.to_le_bytes());
    put(&mut buf, XDIM, &width.to_le_bytes());
    put(&mut buf, YDIM, &height.to_le_bytes());
    put(&mut buf, DATATYPE, &datatype.to_le_bytes());
    put(&mut buf, NUM_FRAMES, &num_frames.to_le_bytes());
    put(&mut buf, LAST_VALUE, &LAST_VALUE_MAGIC.to_le_bytes());
    buf
}

/// Build a complete SPE file: header followed by the raw frames.
pub fn build_spe(version: f32, width: u16, height: u16, datatype: i16, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_spe_header(version, width, height, datatype, frames.len() as i32);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Append an XML footer and point the header at it.
pub fn append_footer(buf: &mut Vec<u8>, xml: &str) {
    let offset = buf.len() as u64;
    put(buf, XML_OFFSET, &offset.to_le_bytes());
    buf.extend_from_slice(xml.as_bytes());
}

pub fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

pub fn put_f32(buf: &mut [u8], offset: usize, value: f32) {
    put(buf, offset, &value.to_le_bytes());
}

pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    put(buf, offset, &value.to_le_bytes());
}

pub fn put_str(buf: &mut [u8], offset: usize, value: &str) {
    put(buf, offset, value.as_bytes());
}

pub fn u16_frame(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i16_frame(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32_frame(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u32_frame(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f32_frame(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Write SPE bytes into `dir` under `name`.
pub fn write_spe(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write SPE data");
    path
}

/// The 80-character header cards of a FITS file, up to and including END.
pub fn fits_cards(bytes: &[u8]) -> Vec<String> {
    let mut cards = Vec::new();
    for chunk in bytes.chunks(80) {
        let card = String::from_utf8_lossy(chunk).into_owned();
        let is_end = card.starts_with("END ");
        cards.push(card);
        if is_end {
            break;
        }
    }
    cards
}

/// Value text of the first card named `keyword`, trimmed.
pub fn card_value(cards: &[String], keyword: &str) -> Option<String> {
    cards
        .iter()
        .find(|c| c[..8].trim_end() == keyword && &c[8..10] == "= ")
        .map(|c| {
            let field = c[10..].trim_start();
            if let Some(quoted) = field.strip_prefix('\'') {
                // Closing quote is the first one not doubled.
                let mut text = String::new();
                let mut chars = quoted.chars().peekable();
                while let Some(ch) = chars.next() {
                    if ch == '\'' {
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    text.push(ch);
                }
                return text.trim_end().to_string();
            }
            let value = match field.find(" /") {
                Some(i) => &field[..i],
                None => field,
            };
            value.trim().to_string()
        })
}

/// Numeric value of the first card named `keyword`.
pub fn card_float(cards: &[String], keyword: &str) -> Option<f64> {
    card_value(cards, keyword).and_then(|v| v.parse().ok())
}

/// Offset of the data unit: header length rounded up to whole blocks.
pub fn data_start(cards: &[String]) -> usize {
    (cards.len() * 80).div_ceil(2880) * 2880
}
