use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeError};
use crate::io::field::read_f32;
use crate::spe::layout::FILE_HEADER_VER;

/// Major SPE header version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeVersion {
    /// WinView/WinSpec: all metadata lives at fixed header offsets.
    V2,
    /// LightField: binary header for geometry, XML footer for metadata.
    V3,
}

impl SpeVersion {
    pub fn major(self) -> u8 {
        match self {
            SpeVersion::V2 => 2,
            SpeVersion::V3 => 3,
        }
    }

    /// Classify a raw `file_header_ver` value.
    pub fn from_header_version(raw: f32) -> Result<Self> {
        if (2.0..3.0).contains(&raw) {
            Ok(SpeVersion::V2)
        } else if (3.0..4.0).contains(&raw) {
            Ok(SpeVersion::V3)
        } else {
            Err(SpeError::UnsupportedVersion(raw))
        }
    }
}

impl fmt::Display for SpeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SPE v{}", self.major())
    }
}

/// Read the raw header-version float.
pub fn header_version(buf: &[u8]) -> Result<f32> {
    read_f32(buf, FILE_HEADER_VER)
}

/// Determine which header layout `buf` uses.
pub fn detect_version(buf: &[u8]) -> Result<SpeVersion> {
    SpeVersion::from_header_version(header_version(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_version(v: f32) -> Vec<u8> {
        let mut buf = vec![0u8; FILE_HEADER_VER + 4];
        buf[FILE_HEADER_VER..].copy_from_slice(&v.to_le_bytes());
        buf
    }

    #[test]
    fn classifies_supported_versions() {
        assert_eq!(detect_version(&with_version(2.0)).unwrap(), SpeVersion::V2);
        assert_eq!(detect_version(&with_version(2.5)).unwrap(), SpeVersion::V2);
        assert_eq!(detect_version(&with_version(3.0)).unwrap(), SpeVersion::V3);
        assert_eq!(detect_version(&with_version(3.5)).unwrap(), SpeVersion::V3);
    }

    #[test]
    fn rejects_legacy_and_garbage() {
        for v in [0.0, 1.6, 4.0, -3.0, f32::NAN] {
            assert!(matches!(
                detect_version(&with_version(v)),
                Err(SpeError::UnsupportedVersion(_))
            ));
        }
    }

    #[test]
    fn short_buffer_is_decode_error() {
        assert!(matches!(
            detect_version(&[0u8; 100]),
            Err(SpeError::Decode { .. })
        ));
    }

    #[test]
    fn display_names_major_version() {
        assert_eq!(SpeVersion::V3.to_string(), "SPE v3");
    }
}
