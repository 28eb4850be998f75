//! Error types for bitmap loading, saving and construction.
//!
//! Drawing and rotation never fail; only the codec and file I/O report errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The file or byte stream does not describe a bitmap this library can use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid magic bytes {0:?}, expected \"BM\"")]
    InvalidMagic([u8; 2]),

    #[error("header truncated: expected 54 bytes, found {found}")]
    TruncatedHeader { found: usize },

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("unsupported bits per pixel: {0}")]
    UnsupportedBitsPerPixel(u16),

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u32),

    #[error("pixel data offset {0} is not 54")]
    UnsupportedPixelOffset(u32),

    #[error("declared image size {declared} does not match width*height*4 = {expected}")]
    InconsistentImageSize { declared: u32, expected: u32 },

    #[error("declared file size {declared} does not match image size + 54 = {expected}")]
    InconsistentFileSize { declared: u32, expected: u32 },

    #[error("{dimension} of {found} exceeds the configured limit of {limit}")]
    TooLargeDimensions {
        dimension: &'static str,
        limit: usize,
        found: usize,
    },

    #[error("pixel data truncated: expected {expected} bytes, found {found}")]
    TruncatedPixelData { expected: usize, found: usize },
}

/// Errors returned by bitmap construction and file I/O.
#[derive(Error, Debug)]
pub enum BitmapError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("cannot create a {width}x{height} bitmap")]
    InvalidDimensions { width: i32, height: i32 },
}

impl BitmapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BitmapError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the format error, if this is one.
    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            BitmapError::Format(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true for failures opening, reading or writing a file or stream.
    pub fn is_io(&self) -> bool {
        matches!(self, BitmapError::Io { .. } | BitmapError::Stream(_))
    }
}

pub type Result<T> = std::result::Result<T, BitmapError>;
