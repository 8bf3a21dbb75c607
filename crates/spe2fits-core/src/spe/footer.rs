//! Version 3 XML footer.
//!
//! LightField appends an XML document after the last frame and stores its
//! offset in the binary header. Only a handful of elements feed the FITS
//! header; the rest of the document is skipped.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::{Result, SpeError};
use crate::spe::header::{Gain, SpeMetadata};
use crate::spe::layout::HEADER_SIZE;

/// Validate a raw footer offset against the file length.
pub fn locate(raw_offset: u64, file_len: usize) -> Option<u64> {
    if raw_offset == 0 {
        debug!("no XML footer");
        return None;
    }
    if raw_offset < HEADER_SIZE as u64 || raw_offset >= file_len as u64 {
        warn!(raw_offset, file_len, "XML footer offset outside the file, ignoring footer");
        return None;
    }
    Some(raw_offset)
}

/// Parse footer bytes, degrading to empty metadata on malformed XML.
pub fn extract_metadata(bytes: &[u8]) -> (SpeMetadata, Vec<String>) {
    let parsed = std::str::from_utf8(bytes)
        .map_err(|e| SpeError::FooterParse(e.to_string()))
        .and_then(parse_footer);

    match parsed {
        Ok(found) => found,
        Err(err) => {
            warn!("{err}, continuing without footer metadata");
            (SpeMetadata::default(), vec![err.to_string()])
        }
    }
}

#[derive(Default)]
struct FooterFields {
    exposure_ms: Option<f64>,
    temperature_reading: Option<f64>,
    temperature_set_point: Option<f64>,
    analog_gain: Option<Gain>,
    em_gain: Option<Gain>,
    created: Option<String>,
}

/// Parse a footer document into metadata plus non-fatal warnings.
pub fn parse_footer(xml: &str) -> Result<(SpeMetadata, Vec<String>)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut seen_root = false;
    let mut fields = FooterFields::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                seen_root = true;
                inspect_attributes(e, &mut fields)?;
                path.push(local_name(e));
            }
            Ok(Event::Empty(ref e)) => {
                seen_root = true;
                inspect_attributes(e, &mut fields)?;
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SpeError::FooterParse(e.to_string()))?;
                record_text(&path, text.trim(), &mut fields);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SpeError::FooterParse(e.to_string())),
            _ => {}
        }
    }

    if !seen_root {
        return Err(SpeError::FooterParse("no root element".into()));
    }
    if !path.is_empty() {
        return Err(SpeError::FooterParse(format!(
            "unclosed element <{}>",
            path.join("/")
        )));
    }

    let mut warnings = Vec::new();
    let date_acquired = match fields.created.as_deref().map(normalize_timestamp) {
        Some(Ok(ts)) => Some(ts),
        Some(Err(err)) => {
            warn!("{err}");
            warnings.push(err.to_string());
            None
        }
        None => None,
    };

    let metadata = SpeMetadata {
        exposure_time: fields.exposure_ms.map(|ms| ms / 1000.0),
        date_acquired,
        temperature: fields.temperature_reading.or(fields.temperature_set_point),
        gain: fields.analog_gain.or(fields.em_gain),
        readout_time: None,
        comments: Vec::new(),
    };
    Ok((metadata, warnings))
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn inspect_attributes(e: &BytesStart, fields: &mut FooterFields) -> Result<()> {
    if e.local_name().as_ref() != b"Origin" || fields.created.is_some() {
        return Ok(());
    }
    for attr in e.attributes() {
        let attr = attr.map_err(|e| SpeError::FooterParse(e.to_string()))?;
        if attr.key.local_name().as_ref() == b"created" {
            let value = std::str::from_utf8(&attr.value)
                .map_err(|e| SpeError::FooterParse(e.to_string()))?;
            fields.created = Some(value.to_string());
        }
    }
    Ok(())
}

fn record_text(path: &[String], text: &str, fields: &mut FooterFields) {
    let Some(element) = path.last() else {
        return;
    };
    let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

    match (parent, element.as_str()) {
        (_, "ExposureTime") if fields.exposure_ms.is_none() => {
            fields.exposure_ms = parse_number(element, text);
        }
        (Some("Temperature"), "Reading") if fields.temperature_reading.is_none() => {
            fields.temperature_reading = parse_number(element, text);
        }
        (Some("Temperature"), "SetPoint") if fields.temperature_set_point.is_none() => {
            fields.temperature_set_point = parse_number(element, text);
        }
        (_, "AnalogGain") if fields.analog_gain.is_none() => {
            fields.analog_gain = match text.parse::<f64>() {
                Ok(factor) if factor.is_finite() => Some(Gain::Factor(factor)),
                Ok(_) => {
                    warn!(element = element.as_str(), text, "non-finite gain ignored");
                    None
                }
                Err(_) => Some(Gain::Setting(text.to_string())),
            };
        }
        (_, "EMGain") if fields.em_gain.is_none() => {
            fields.em_gain = text.parse::<i64>().ok().map(Gain::Index);
        }
        _ => {}
    }
}

fn parse_number(element: &str, text: &str) -> Option<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(element, text, "non-numeric footer value ignored");
            None
        }
    }
}

/// Normalise an RFC 3339 timestamp to UTC with millisecond precision.
fn normalize_timestamp(raw: &str) -> Result<String> {
    const OUTPUT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).format(OUTPUT).to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ts| ts.format(OUTPUT).to_string())
        .map_err(|_| SpeError::MalformedField {
            field: "created",
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SpeFormat version="3.0" xmlns="http://www.princetoninstruments.com/spe/2009">
  <DataFormat>
    <DataBlock type="Frame" count="1" pixelFormat="MonochromeUnsigned16" />
  </DataFormat>
  <DataHistories>
    <DataHistory>
      <Origin softwareName="LightField" created="2015-08-05T12:35:43.9218286-04:00">
        <Experiment>
          <Devices>
            <Cameras>
              <Camera>
                <ShutterTiming><ExposureTime>2500</ExposureTime></ShutterTiming>
                <Sensor>
                  <Temperature>
                    <SetPoint>-70</SetPoint>
                    <Reading>-69.5</Reading>
                  </Temperature>
                </Sensor>
                <Adc><AnalogGain>Medium</AnalogGain><EMGain>10</EMGain></Adc>
              </Camera>
            </Cameras>
          </Devices>
        </Experiment>
      </Origin>
    </DataHistory>
  </DataHistories>
</SpeFormat>"#;

    #[test]
    fn extracts_known_elements() {
        let (meta, warnings) = parse_footer(FOOTER).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(meta.exposure_time, Some(2.5));
        assert_eq!(meta.temperature, Some(-69.5));
        assert_eq!(meta.gain, Some(Gain::Setting("Medium".into())));
        assert_eq!(meta.date_acquired.as_deref(), Some("2015-08-05T16:35:43.921"));
    }

    #[test]
    fn set_point_used_without_reading() {
        let xml = "<SpeFormat><Temperature><SetPoint>-40</SetPoint></Temperature></SpeFormat>";
        let (meta, _) = parse_footer(xml).unwrap();
        assert_eq!(meta.temperature, Some(-40.0));
        assert_eq!(meta.exposure_time, None);
    }

    #[test]
    fn em_gain_when_no_analog_gain() {
        let xml = "<SpeFormat><Adc><EMGain>25</EMGain></Adc></SpeFormat>";
        let (meta, _) = parse_footer(xml).unwrap();
        assert_eq!(meta.gain, Some(Gain::Index(25)));
    }

    #[test]
    fn non_finite_analog_gain_is_dropped() {
        let xml = "<SpeFormat><Adc><AnalogGain>NaN</AnalogGain></Adc></SpeFormat>";
        let (meta, _) = parse_footer(xml).unwrap();
        assert_eq!(meta.gain, None);

        let xml = "<SpeFormat><Adc><AnalogGain>inf</AnalogGain><EMGain>3</EMGain></Adc></SpeFormat>";
        let (meta, _) = parse_footer(xml).unwrap();
        assert_eq!(meta.gain, Some(Gain::Index(3)));

        let xml = "<SpeFormat><Adc><AnalogGain>2.5</AnalogGain></Adc></SpeFormat>";
        let (meta, _) = parse_footer(xml).unwrap();
        assert_eq!(meta.gain, Some(Gain::Factor(2.5)));
    }

    #[test]
    fn malformed_xml_degrades_to_empty_metadata() {
        let (meta, warnings) = extract_metadata(b"<SpeFormat><Unclosed></SpeFormat>");
        assert!(meta.is_empty());
        assert_eq!(warnings.len(), 1);

        let (meta, warnings) = extract_metadata(b"not xml at all");
        assert!(meta.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn bad_timestamp_keeps_other_fields() {
        let xml = r#"<SpeFormat><Origin created="yesterday"><ExposureTime>10</ExposureTime></Origin></SpeFormat>"#;
        let (meta, warnings) = parse_footer(xml).unwrap();
        assert_eq!(meta.exposure_time, Some(0.01));
        assert_eq!(meta.date_acquired, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn offsets_outside_file_are_ignored() {
        assert_eq!(locate(0, 10_000), None);
        assert_eq!(locate(100, 10_000), None);
        assert_eq!(locate(10_000, 10_000), None);
        assert_eq!(locate(5_000, 10_000), Some(5_000));
    }
}
