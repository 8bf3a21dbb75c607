pub mod config;
pub mod convert;
pub mod info;
pub mod preview;
