//! SPE header and frame decoding.

pub mod footer;
pub mod header;
pub mod layout;
pub mod legacy;
pub mod reader;
pub mod version;

pub use header::{parse_header, parse_header_with, Gain, HeaderLayout, PixelType, SpeFile, SpeMetadata};
pub use legacy::SentinelPolicy;
pub use reader::{extract_frame, SpeReader};
pub use version::{detect_version, SpeVersion};
