use thiserror::Error;

/// Errors produced by palette generation and quantization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantizeError {
    #[error("Palette is empty")]
    EmptyPalette,

    #[error(
        "Invalid image shape: {width}x{height} with {channels} channels does not fit buffer of length {len}"
    )]
    InvalidImageShape {
        width: u32,
        height: u32,
        channels: u32,
        len: usize,
    },

    #[error("Unsupported range convention: {0}")]
    UnsupportedConvention(String),
}
