use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeError};
use crate::spe::legacy::SentinelPolicy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Where FITS files go; next to the input when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub layout: OutputLayout,
    /// Replace existing outputs. Batch conversion always overwrites.
    #[serde(default)]
    pub overwrite: bool,
    /// Add SPEFNAME/ORIGIN cards naming the source file and this tool.
    #[serde(default = "default_provenance")]
    pub provenance: bool,
    /// Also export every other recorded legacy header field as its own card.
    #[serde(default)]
    pub header_fields: bool,
    /// Raw legacy header values that mean "not recorded".
    #[serde(default)]
    pub sentinels: SentinelPolicy,
}

fn default_provenance() -> bool {
    true
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            layout: OutputLayout::default(),
            overwrite: false,
            provenance: default_provenance(),
            header_fields: false,
            sentinels: SentinelPolicy::default(),
        }
    }
}

impl ConvertConfig {
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SpeError::Config(e.to_string()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SpeError::Config(e.to_string()))
    }
}

/// Read a TOML config file.
pub fn load_config(path: &Path) -> Result<ConvertConfig> {
    let text = std::fs::read_to_string(path)?;
    ConvertConfig::from_toml(&text)
}

/// How multi-frame files are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLayout {
    /// One file, 3-D when there is more than one frame.
    #[default]
    Cube,
    /// One 2-D file per frame, `<stem>_x000.fits`, `<stem>_x001.fits`, ...
    PerFrame,
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLayout::Cube => write!(f, "Cube"),
            OutputLayout::PerFrame => write!(f, "Per Frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = ConvertConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(ConvertConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = ConvertConfig::from_toml(
            r#"
layout = "PerFrame"

[sentinels]
temperature = [-999.0, 0.0]
"#,
        )
        .unwrap();
        assert_eq!(config.layout, OutputLayout::PerFrame);
        assert!(config.provenance);
        assert!(!config.overwrite);
        assert!(!config.header_fields);
        assert_eq!(config.sentinels.temperature, vec![-999.0, 0.0]);
        assert_eq!(config.sentinels.gain, vec![0]);
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            ConvertConfig::from_toml("layout = 3"),
            Err(SpeError::Config(_))
        ));
    }

    #[test]
    fn layout_display() {
        assert_eq!(OutputLayout::PerFrame.to_string(), "Per Frame");
        assert_eq!(OutputLayout::default().to_string(), "Cube");
    }
}
