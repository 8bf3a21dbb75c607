use crate::error::Result;
use crate::fits::{Card, FitsValue};
use crate::io::field::{FieldType, FieldValue};
use crate::spe::header::{Gain, SpeFile};
use crate::spe::legacy::dump_fields;

/// Map a decoded header to FITS keyword cards.
///
/// Geometry and version are always present; absent metadata is left out
/// instead of being written as a placeholder.
pub fn map_metadata(spe: &SpeFile) -> Vec<Card> {
    let mut cards = vec![
        Card::new("NAXIS1", FitsValue::Integer(spe.width as i64)).with_comment("frame width"),
        Card::new("NAXIS2", FitsValue::Integer(spe.height as i64)).with_comment("frame height"),
    ];
    if spe.frame_count > 1 {
        cards.push(
            Card::new("NAXIS3", FitsValue::Integer(spe.frame_count as i64))
                .with_comment("number of frames"),
        );
    }
    cards.push(
        Card::new("SPEVERS", FitsValue::Float(shortest_f64(spe.header_version)))
            .with_comment("SPE file header version"),
    );

    let meta = &spe.metadata;
    if let Some(exposure) = meta.exposure_time {
        cards.push(Card::new("EXPTIME", FitsValue::Float(exposure)).with_comment("exposure time [s]"));
    }
    if let Some(ref date) = meta.date_acquired {
        cards.push(
            Card::new("DATE-OBS", FitsValue::Text(date.clone()))
                .with_comment("acquisition start"),
        );
    }
    if let Some(temperature) = meta.temperature {
        cards.push(
            Card::new("CCD-TEMP", FitsValue::Float(temperature))
                .with_comment("detector temperature [C]"),
        );
    }
    if let Some(ref gain) = meta.gain {
        let value = match gain {
            Gain::Index(i) => FitsValue::Integer(*i),
            Gain::Factor(f) => FitsValue::Float(*f),
            Gain::Setting(s) => FitsValue::Text(s.clone()),
        };
        cards.push(Card::new("GAIN", value).with_comment("camera gain setting"));
    }
    if let Some(readout) = meta.readout_time {
        cards.push(
            Card::new("READTIME", FitsValue::Float(readout))
                .with_comment("Experiment readout time in ms"),
        );
    }
    for comment in &meta.comments {
        cards.push(Card::commentary("COMMENT", comment));
    }

    cards
}

/// Fields already carried by [`map_metadata`] or by the structural cards.
const MAPPED_FIELDS: &[&str] = &[
    "exp_sec",
    "date",
    "DetTemperature",
    "xdim",
    "datatype",
    "gain",
    "ydim",
    "ReadoutTime",
    "NumFrames",
    "file_header_ver",
    "lastvalue",
];

/// Name fragments of fields that are dropped when they hold zero or an
/// empty string.
const UNSET_WHEN_ZERO: &[&str] = &[
    "pixel_position",
    "Spare",
    "Comments",
    "calib",
    "reserved",
    "polynom",
    "Spec",
    "PImax",
    "FlatField",
];

/// One card per remaining legacy header field of `buf`, keyed by the
/// field's FITS keyword and commented with its description.
///
/// Empty text and non-finite numbers are left out, as are zero-valued
/// fields from the [`UNSET_WHEN_ZERO`] groups.
pub fn header_field_cards(buf: &[u8]) -> Result<Vec<Card>> {
    let mut cards = Vec::new();
    for (field, value) in dump_fields(buf)? {
        if MAPPED_FIELDS.contains(&field.name) {
            continue;
        }
        let unset = match value {
            FieldValue::Int(0) | FieldValue::UInt(0) => true,
            FieldValue::Float(f) => f == 0.0,
            FieldValue::Text(ref t) => t.is_empty(),
            _ => false,
        };
        if unset && UNSET_WHEN_ZERO.iter().any(|group| field.name.contains(group)) {
            continue;
        }

        let value = match value {
            FieldValue::Int(i) => FitsValue::Integer(i),
            FieldValue::UInt(u) => match i64::try_from(u) {
                Ok(i) => FitsValue::Integer(i),
                Err(_) => continue,
            },
            FieldValue::Float(f) if !f.is_finite() => continue,
            FieldValue::Float(f) if field.field_type == FieldType::F32 => {
                FitsValue::Float(shortest_f64(f as f32))
            }
            FieldValue::Float(f) => FitsValue::Float(f),
            FieldValue::Text(t) if t.is_empty() => continue,
            FieldValue::Text(t) => FitsValue::Text(t),
            FieldValue::Bytes(_) => continue,
        };
        cards.push(Card::new(field.keyword, value).with_comment(field.description));
    }
    Ok(cards)
}

/// `value` widened to the f64 with the same shortest decimal form, so 2.2f32
/// becomes 2.2 rather than 2.200000047683716.
pub(crate) fn shortest_f64(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(value as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::find_value;
    use crate::spe::header::{HeaderLayout, PixelType, SpeMetadata};
    use crate::spe::version::SpeVersion;

    fn spe(frame_count: u32, metadata: SpeMetadata) -> SpeFile {
        SpeFile {
            version: SpeVersion::V2,
            header_version: 2.5,
            width: 512,
            height: 256,
            frame_count,
            pixel_type: PixelType::UInt16,
            data_offset: 4100,
            layout: HeaderLayout::Legacy,
            metadata,
            warnings: Vec::new(),
        }
    }

    fn keywords(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.keyword.as_str()).collect()
    }

    #[test]
    fn bare_header_only_has_structure_and_version() {
        let cards = map_metadata(&spe(1, SpeMetadata::default()));
        assert_eq!(keywords(&cards), vec!["NAXIS1", "NAXIS2", "SPEVERS"]);
        assert_eq!(find_value(&cards, "NAXIS1"), Some(&FitsValue::Integer(512)));
        assert_eq!(find_value(&cards, "NAXIS2"), Some(&FitsValue::Integer(256)));
        assert_eq!(find_value(&cards, "SPEVERS"), Some(&FitsValue::Float(2.5)));
    }

    #[test]
    fn multi_frame_adds_naxis3() {
        let cards = map_metadata(&spe(3, SpeMetadata::default()));
        assert_eq!(find_value(&cards, "NAXIS3"), Some(&FitsValue::Integer(3)));
    }

    #[test]
    fn populated_metadata_maps_to_fixed_keywords() {
        let meta = SpeMetadata {
            exposure_time: Some(2.5),
            date_acquired: Some("2017-03-15T20:30:45".into()),
            temperature: Some(-70.0),
            gain: Some(Gain::Setting("Medium".into())),
            readout_time: Some(12.0),
            comments: vec!["flat field".into(), "dome".into()],
        };
        let cards = map_metadata(&spe(1, meta));
        assert_eq!(
            keywords(&cards),
            vec![
                "NAXIS1", "NAXIS2", "SPEVERS", "EXPTIME", "DATE-OBS", "CCD-TEMP", "GAIN",
                "READTIME", "COMMENT", "COMMENT"
            ]
        );
        assert_eq!(find_value(&cards, "EXPTIME"), Some(&FitsValue::Float(2.5)));
        assert_eq!(find_value(&cards, "CCD-TEMP"), Some(&FitsValue::Float(-70.0)));
        assert_eq!(
            find_value(&cards, "GAIN"),
            Some(&FitsValue::Text("Medium".into()))
        );
        assert_eq!(cards[8].comment.as_deref(), Some("flat field"));
    }

    #[test]
    fn version_keeps_its_decimal_form() {
        let mut s = spe(1, SpeMetadata::default());
        s.header_version = 2.2;
        let cards = map_metadata(&s);
        assert_eq!(find_value(&cards, "SPEVERS"), Some(&FitsValue::Float(2.2)));
        assert!(shortest_f64(f32::NAN).is_nan());
    }

    #[test]
    fn header_fields_skip_mapped_and_unset_groups() {
        use crate::spe::layout::{legacy_field, EXP_SEC, HEADER_SIZE};

        let mut buf = vec![0u8; HEADER_SIZE];
        let put = |buf: &mut Vec<u8>, name: &str, bytes: &[u8]| {
            let offset = legacy_field(name).unwrap().offset;
            buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        };
        buf[EXP_SEC..EXP_SEC + 4].copy_from_slice(&1.5f32.to_le_bytes());
        put(&mut buf, "ADCrate", &3u16.to_le_bytes());
        put(&mut buf, "SpecCenterWlNm", &656.3f32.to_le_bytes());
        put(&mut buf, "sw_version", b"WinView 2.5");
        put(&mut buf, "MaxIntensity", &f32::NAN.to_le_bytes());

        let cards = header_field_cards(&buf).unwrap();
        let find = |kw: &str| find_value(&cards, kw).cloned();

        assert_eq!(find("ADCRATE"), Some(FitsValue::Integer(3)));
        assert_eq!(find("SPECCWL"), Some(FitsValue::Float(656.3)));
        assert_eq!(find("SWVERS"), Some(FitsValue::Text("WinView 2.5".into())));
        // Zero outside the unset groups is a real value.
        assert_eq!(find("ADCOFFS"), Some(FitsValue::Integer(0)));
        // Zero inside them is not.
        assert_eq!(find("SPECAUTO"), None);
        assert_eq!(find("PIMAXGAN"), None);
        assert_eq!(find("MAXINTEN"), None);
        assert_eq!(find("DLABEL"), None);
        assert_eq!(find("EXPOSURE"), None);
        assert_eq!(find("LASTVAL"), None);

        let adc = cards.iter().find(|c| c.keyword == "ADCRATE").unwrap();
        assert_eq!(adc.comment.as_deref(), Some("ADC rate"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let meta = SpeMetadata {
            exposure_time: Some(1.0),
            gain: Some(Gain::Index(2)),
            ..Default::default()
        };
        let s = spe(2, meta);
        assert_eq!(map_metadata(&s), map_metadata(&s));
    }
}
