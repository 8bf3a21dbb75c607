//! Version 2 metadata: fixed offsets plus sentinel normalisation.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SpeError};
use crate::io::field::{read_f32, read_field, read_string, read_u16, FieldValue};
use crate::spe::header::{Gain, SpeMetadata};
use crate::spe::layout::{
    HeaderField, COMMENTS, COMMENT_COUNT, COMMENT_LEN, DATE, DATE_LEN, DET_TEMPERATURE, EXP_SEC,
    EXPERIMENT_TIME_LOCAL, EXPERIMENT_TIME_UTC, GAIN, LEGACY_FIELDS, READOUT_TIME, TIME_LEN,
};

/// Raw values the acquisition software writes when a field was not recorded.
///
/// Values listed here are treated as absent. Empty strings are always absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelPolicy {
    pub exposure_time: Vec<f64>,
    pub temperature: Vec<f64>,
    pub gain: Vec<i64>,
    pub readout_time: Vec<f64>,
}

impl Default for SentinelPolicy {
    fn default() -> Self {
        Self {
            exposure_time: vec![0.0, -999.0],
            temperature: vec![-999.0],
            gain: vec![0],
            readout_time: vec![0.0, -999.0],
        }
    }
}

impl SentinelPolicy {
    /// A policy that only rejects non-finite readings.
    pub fn none() -> Self {
        Self {
            exposure_time: Vec::new(),
            temperature: Vec::new(),
            gain: Vec::new(),
            readout_time: Vec::new(),
        }
    }

    fn float(raw: f32, sentinels: &[f64]) -> Option<f64> {
        let value = raw as f64;
        if !value.is_finite() || sentinels.contains(&value) {
            None
        } else {
            Some(value)
        }
    }

    fn int(raw: i64, sentinels: &[i64]) -> Option<i64> {
        (!sentinels.contains(&raw)).then_some(raw)
    }
}

/// Legacy metadata exactly as stored, sentinels included.
#[derive(Clone, Debug, Default)]
struct RawLegacyMetadata {
    exp_sec: f32,
    date: String,
    time_local: String,
    time_utc: String,
    temperature: f32,
    gain: u16,
    readout_time: f32,
    comments: Vec<String>,
}

fn read_raw(buf: &[u8]) -> Result<RawLegacyMetadata> {
    let comments = (0..COMMENT_COUNT)
        .map(|i| read_string(buf, COMMENTS + i * COMMENT_LEN, COMMENT_LEN))
        .collect::<Result<Vec<_>>>()?;

    Ok(RawLegacyMetadata {
        exp_sec: read_f32(buf, EXP_SEC)?,
        date: read_string(buf, DATE, DATE_LEN)?,
        time_local: read_string(buf, EXPERIMENT_TIME_LOCAL, TIME_LEN)?,
        time_utc: read_string(buf, EXPERIMENT_TIME_UTC, TIME_LEN)?,
        temperature: read_f32(buf, DET_TEMPERATURE)?,
        gain: read_u16(buf, GAIN)?,
        readout_time: read_f32(buf, READOUT_TIME)?,
        comments,
    })
}

/// Read and normalise the version 2 metadata block.
///
/// Returns the metadata and any non-fatal problems found on the way.
pub fn extract_metadata(
    buf: &[u8],
    sentinels: &SentinelPolicy,
) -> Result<(SpeMetadata, Vec<String>)> {
    let raw = read_raw(buf)?;
    Ok(normalize(raw, sentinels))
}

fn normalize(raw: RawLegacyMetadata, sentinels: &SentinelPolicy) -> (SpeMetadata, Vec<String>) {
    let mut warnings = Vec::new();

    let date_acquired = match legacy_timestamp(&raw.date, &raw.time_utc, &raw.time_local) {
        Ok(ts) => ts,
        Err(err) => {
            warn!("{err}");
            warnings.push(err.to_string());
            None
        }
    };

    let metadata = SpeMetadata {
        exposure_time: SentinelPolicy::float(raw.exp_sec, &sentinels.exposure_time),
        date_acquired,
        temperature: SentinelPolicy::float(raw.temperature, &sentinels.temperature),
        gain: SentinelPolicy::int(raw.gain as i64, &sentinels.gain).map(Gain::Index),
        readout_time: SentinelPolicy::float(raw.readout_time, &sentinels.readout_time),
        comments: raw
            .comments
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    };

    (metadata, warnings)
}

/// Combine `ddmmmyyyy` and `hhmmss` into an ISO-8601 timestamp.
///
/// Only the UTC time is attached to the date. A file that recorded local
/// time alone, or no usable time, yields a date-only value.
fn legacy_timestamp(
    date: &str,
    time_utc: &str,
    time_local: &str,
) -> Result<Option<String>> {
    let date = date.trim();
    if date.is_empty() {
        return Ok(None);
    }

    let day = NaiveDate::parse_from_str(date, "%d%b%Y").map_err(|_| SpeError::MalformedField {
        field: "date",
        raw: date.to_string(),
    })?;
    let date_only = Ok(Some(day.format("%Y-%m-%d").to_string()));

    let time_utc = time_utc.trim();
    if time_utc.is_empty() {
        if !time_local.trim().is_empty() {
            debug!(time = time_local.trim(), "only local experiment time recorded, keeping date only");
        }
        return date_only;
    }
    match NaiveTime::parse_from_str(time_utc, "%H%M%S") {
        Ok(time) => Ok(Some(day.and_time(time).format("%Y-%m-%dT%H:%M:%S").to_string())),
        Err(_) => {
            warn!(time = time_utc, "unreadable experiment time, keeping date only");
            date_only
        }
    }
}

/// Every field of [`LEGACY_FIELDS`] as stored in `buf`.
pub fn dump_fields(buf: &[u8]) -> Result<Vec<(HeaderField, FieldValue)>> {
    LEGACY_FIELDS
        .iter()
        .map(|f| Ok((*f, read_field(buf, f.offset, f.length, f.field_type)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawLegacyMetadata {
        RawLegacyMetadata {
            exp_sec: 2.5,
            date: "15Mar2017".into(),
            time_local: "213045".into(),
            time_utc: "203045".into(),
            temperature: -70.0,
            gain: 2,
            readout_time: 12.5,
            comments: vec!["first".into(), "".into(), "  third ".into()],
        }
    }

    #[test]
    fn populated_fields_survive() {
        let (meta, warnings) = normalize(raw(), &SentinelPolicy::default());
        assert!(warnings.is_empty());
        assert_eq!(meta.exposure_time, Some(2.5));
        assert_eq!(meta.temperature, Some(-70.0));
        assert_eq!(meta.gain, Some(Gain::Index(2)));
        assert_eq!(meta.readout_time, Some(12.5));
        assert_eq!(meta.date_acquired.as_deref(), Some("2017-03-15T20:30:45"));
        assert_eq!(meta.comments, vec!["first", "third"]);
    }

    #[test]
    fn sentinels_become_absent() {
        let raw = RawLegacyMetadata {
            exp_sec: 0.0,
            temperature: -999.0,
            gain: 0,
            readout_time: f32::NAN,
            ..Default::default()
        };
        let (meta, warnings) = normalize(raw, &SentinelPolicy::default());
        assert!(warnings.is_empty());
        assert!(meta.is_empty());
    }

    #[test]
    fn policy_is_overridable() {
        let raw = RawLegacyMetadata {
            temperature: -999.0,
            gain: 0,
            ..Default::default()
        };
        let (meta, _) = normalize(raw, &SentinelPolicy::none());
        assert_eq!(meta.temperature, Some(-999.0));
        assert_eq!(meta.gain, Some(Gain::Index(0)));
    }

    #[test]
    fn utc_time_preferred() {
        let ts = legacy_timestamp("01JAN2020", "010203", "111213").unwrap();
        assert_eq!(ts.as_deref(), Some("2020-01-01T01:02:03"));
    }

    #[test]
    fn local_time_alone_keeps_date_only() {
        let ts = legacy_timestamp("15Mar2017", "", "203045").unwrap();
        assert_eq!(ts.as_deref(), Some("2017-03-15"));
    }

    #[test]
    fn date_without_time() {
        let ts = legacy_timestamp("07Aug2016", "", "").unwrap();
        assert_eq!(ts.as_deref(), Some("2016-08-07"));
    }

    #[test]
    fn bad_date_is_a_warning_not_a_failure() {
        let mut r = raw();
        r.date = "notadate".into();
        let (meta, warnings) = normalize(r, &SentinelPolicy::default());
        assert_eq!(meta.date_acquired, None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(meta.exposure_time, Some(2.5));
    }
}
