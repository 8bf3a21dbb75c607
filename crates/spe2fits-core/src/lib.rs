//! Decoder for Princeton Instruments SPE camera files (header versions 2 and
//! 3) and conversion of their frames and metadata to FITS.

pub mod config;
pub mod convert;
pub mod error;
pub mod fits;
pub mod frame;
pub mod io;
pub mod preview;
pub mod spe;
