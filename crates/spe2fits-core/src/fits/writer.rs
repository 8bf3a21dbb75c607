//! Primary-HDU output through `fitsio-pure`: [`Card`]s and [`PixelArray`]s
//! are translated into that crate's header records and image data.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fitsio_pure::header::{self, Card as HeaderCard};
use fitsio_pure::image::{serialize_image, ImageData};
use fitsio_pure::primary::build_primary_header;
use fitsio_pure::value::Value;
use fitsio_pure::BLOCK_SIZE;
use tracing::{debug, warn};

use crate::error::{Result, SpeError};
use crate::fits::output::{FitsOutput, PixelArray};
use crate::fits::{Card, FitsValue};

/// Longest commentary text one record holds.
const COMMENTARY_LEN: usize = 72;

/// Keywords the writer derives from the pixel array itself.
const STRUCTURAL: [&str; 8] = [
    "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "BZERO", "BSCALE",
];

/// Write `output` as a single-HDU FITS file.
pub fn write_fits(path: &Path, output: &FitsOutput, overwrite: bool) -> Result<()> {
    write_fits_set(&[(path, output)], overwrite)
}

/// Write several FITS files as one unit: either all of them end up in
/// place or none do.
///
/// Every file is staged as a sibling `.part` first. Only when all stages
/// succeeded are they renamed into place; a failed rename removes the
/// files already moved.
pub fn write_fits_set(targets: &[(&Path, &FitsOutput)], overwrite: bool) -> Result<()> {
    if !overwrite {
        if let Some((existing, _)) = targets.iter().find(|(path, _)| path.exists()) {
            return Err(SpeError::OutputExists(existing.to_path_buf()));
        }
    }

    let mut staged: Vec<PathBuf> = Vec::with_capacity(targets.len());
    for (path, output) in targets {
        let partial = partial_path(path);
        let result = to_bytes(output).and_then(|bytes| write_partial(&partial, &bytes));
        if let Err(err) = result {
            let _ = fs::remove_file(&partial);
            discard(&staged);
            return Err(err);
        }
        staged.push(partial);
    }

    for (i, ((path, _), partial)) in targets.iter().zip(&staged).enumerate() {
        if let Err(err) = fs::rename(partial, path) {
            warn!(path = %path.display(), "rename failed, rolling back {} output(s)", i);
            discard(&staged[i..]);
            let placed: Vec<PathBuf> = targets[..i].iter().map(|(p, _)| p.to_path_buf()).collect();
            discard(&placed);
            return Err(err.into());
        }
        debug!(path = %path.display(), "wrote FITS file");
    }
    Ok(())
}

fn write_partial(partial: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(partial)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Serialise header and data of `output` into a block-padded byte vector.
pub fn to_bytes(output: &FitsOutput) -> Result<Vec<u8>> {
    let pixels = output.pixels();
    let mut records = build_primary_header(pixels.bitpix(), &pixels.naxes())?;
    if let Some(bzero) = pixels.bzero() {
        records.push(record("BZERO", Value::Float(bzero), Some("offset for unsigned data")));
        records.push(record("BSCALE", Value::Float(1.0), None));
    }
    for card in output.cards() {
        if STRUCTURAL.contains(&card.keyword.as_str()) {
            continue;
        }
        records.extend(header_records(card)?);
    }

    let mut bytes = header_bytes(&records);
    bytes.extend_from_slice(&serialize_image(&image_data(pixels)));
    Ok(bytes)
}

/// The 80-column images `cards` serialise to, trailing blanks trimmed.
pub fn render_cards(cards: &[Card]) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for card in cards {
        for record in header_records(card)? {
            let image = header::format_card(&record);
            lines.push(String::from_utf8_lossy(&image).trim_end().to_string());
        }
    }
    Ok(lines)
}

/// Records plus END, padded with blank records to whole blocks.
fn header_bytes(records: &[HeaderCard]) -> Vec<u8> {
    let mut buf: Vec<u8> = records.iter().flat_map(header::format_card).collect();
    buf.extend_from_slice(&header::format_end_card());
    buf.resize(buf.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
    buf
}

fn record(keyword: &str, value: Value, comment: Option<&str>) -> HeaderCard {
    HeaderCard {
        keyword: keyword_bytes(keyword),
        value: Some(value),
        comment: comment.map(str::to_string),
    }
}

/// Translate one card. Long commentary text spills over into extra records.
fn header_records(card: &Card) -> Result<Vec<HeaderCard>> {
    validate_keyword(&card.keyword)?;
    let keyword = keyword_bytes(&card.keyword);

    let Some(ref value) = card.value else {
        let text = ascii(card.comment.as_deref().unwrap_or(""));
        if text.is_empty() {
            return Ok(vec![HeaderCard { keyword, value: None, comment: None }]);
        }
        return Ok(text
            .as_bytes()
            .chunks(COMMENTARY_LEN)
            .map(|chunk| HeaderCard {
                keyword,
                value: None,
                comment: Some(String::from_utf8_lossy(chunk).into_owned()),
            })
            .collect());
    };

    let value = match value {
        FitsValue::Logical(b) => Value::Logical(*b),
        FitsValue::Integer(n) => Value::Integer(*n),
        FitsValue::Float(f) if f.is_finite() => Value::Float(*f),
        FitsValue::Float(f) => {
            return Err(SpeError::InvalidHeader(format!(
                "{} has no FITS representation for {f}",
                card.keyword
            )))
        }
        FitsValue::Text(s) => Value::String(ascii(s)),
    };
    Ok(vec![HeaderCard {
        keyword,
        value: Some(value),
        comment: card.comment.as_deref().map(ascii),
    }])
}

fn keyword_bytes(keyword: &str) -> [u8; 8] {
    let mut buf = [b' '; 8];
    let len = keyword.len().min(8);
    buf[..len].copy_from_slice(&keyword.as_bytes()[..len]);
    buf
}

fn validate_keyword(keyword: &str) -> Result<()> {
    let valid = !keyword.is_empty()
        && keyword.len() <= 8
        && keyword
            .bytes()
            .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_'));
    if valid {
        Ok(())
    } else {
        Err(SpeError::InvalidHeader(format!("invalid FITS keyword {keyword:?}")))
    }
}

/// Printable ASCII only; anything else becomes `?`.
fn ascii(s: &str) -> String {
    s.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { '?' })
        .collect()
}

/// Samples in row-major order. Unsigned types are shifted into the signed
/// range, matching the BZERO card.
fn image_data(pixels: &PixelArray) -> ImageData {
    match pixels {
        PixelArray::Float32(a) => ImageData::F32(a.iter().copied().collect()),
        PixelArray::Int32(a) => ImageData::I32(a.iter().copied().collect()),
        PixelArray::Int16(a) => ImageData::I16(a.iter().copied().collect()),
        PixelArray::UInt16(a) => ImageData::I16(a.iter().map(|&v| (v ^ 0x8000) as i16).collect()),
        PixelArray::UInt32(a) => {
            ImageData::I32(a.iter().map(|&v| (v ^ 0x8000_0000) as i32).collect())
        }
    }
}
