//! The fixed 54-byte BMP file + info header.
//!
//! # Layout
//!
//! All fields are little-endian and packed without padding:
//!
//! ```text
//! offset  size  field
//! 0x00    2     identifier ("BM")
//! 0x02    4     bitmap_file_size (image_size + 54)
//! 0x06    2     reserved1 (0)
//! 0x08    2     reserved2 (0)
//! 0x0A    4     offset (54)
//! 0x0E    4     info_header_size (40)
//! 0x12    4     width (signed)
//! 0x16    4     height (signed)
//! 0x1A    2     colour_planes (1)
//! 0x1C    2     bits_per_pixel (32)
//! 0x1E    4     compression_method (0)
//! 0x22    4     image_size (width * height * 4)
//! 0x26    4     horizontal_resolution (signed)
//! 0x2A    4     vertical_resolution (signed)
//! 0x2E    4     colour_palette_number (0)
//! 0x32    4     important_colours (0)
//! ```
//!
//! Every field is encoded and decoded individually at its offset, never through
//! the in-memory layout of [`Header`].

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::error::{BitmapError, FormatError};
use crate::options::BitmapOptions;

/// Total size of the file header plus the info header.
pub const HEADER_SIZE: usize = 54;

/// Size of the info (DIB) header alone.
pub const INFO_HEADER_SIZE: u32 = 40;

/// Bytes per pixel (blue, green, red, alpha).
pub const BYTES_PER_PIXEL: usize = 4;

pub const FILE_SIGNATURE: [u8; 2] = [b'B', b'M'];

const BITS_PER_PIXEL: u16 = 32;
const BI_RGB_COMPRESSION: u32 = 0;

const FILE_SIZE_POSITION: usize = 0x02;
const RESERVED1_POSITION: usize = 0x06;
const RESERVED2_POSITION: usize = 0x08;
const OFFSET_TO_PIXELS_POSITION: usize = 0x0A;
const INFO_HEADER_SIZE_POSITION: usize = 0x0E;
const WIDTH_POSITION: usize = 0x12;
const HEIGHT_POSITION: usize = 0x16;
const PLANES_POSITION: usize = 0x1A;
const PIXEL_DEPTH_POSITION: usize = 0x1C;
const COMPRESSION_POSITION: usize = 0x1E;
const IMAGE_SIZE_POSITION: usize = 0x22;
const HORIZONTAL_RESOLUTION_POSITION: usize = 0x26;
const VERTICAL_RESOLUTION_POSITION: usize = 0x2A;
const PALETTE_COUNT_POSITION: usize = 0x2E;
const IMPORTANT_COLOURS_POSITION: usize = 0x32;

/// Decoded BMP header.
///
/// Headers built with [`Header::new`] always satisfy
/// `image_size == width * height * 4` and `bitmap_file_size == image_size + 54`.
/// Headers produced by [`Header::parse`] are only checked for the magic bytes;
/// call [`Header::validate`] before trusting their size fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub identifier: [u8; 2],
    pub bitmap_file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub offset: u32,
    pub info_header_size: u32,
    pub width: i32,
    pub height: i32,
    pub colour_planes: u16,
    pub bits_per_pixel: u16,
    pub compression_method: u32,
    pub image_size: u32,
    pub horizontal_resolution: i32,
    pub vertical_resolution: i32,
    pub colour_palette_number: u32,
    pub important_colours: u32,
}

impl Header {
    /// Builds the header describing a `width` x `height` 32-bit bitmap.
    ///
    /// Fails if either dimension is not positive or the file size would not
    /// fit the 32-bit size fields.
    pub fn new(width: i32, height: i32) -> Result<Self, BitmapError> {
        let image_size = checked_image_size(width, height)
            .ok_or(BitmapError::InvalidDimensions { width, height })?;

        Ok(Self {
            identifier: FILE_SIGNATURE,
            bitmap_file_size: image_size + HEADER_SIZE as u32,
            reserved1: 0,
            reserved2: 0,
            offset: HEADER_SIZE as u32,
            info_header_size: INFO_HEADER_SIZE,
            width,
            height,
            colour_planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            compression_method: BI_RGB_COMPRESSION,
            image_size,
            horizontal_resolution: 0,
            vertical_resolution: 0,
            colour_palette_number: 0,
            important_colours: 0,
        })
    }

    /// Decodes the first 54 bytes of `bytes`.
    ///
    /// Only the `BM` signature is checked here.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::TruncatedHeader { found: bytes.len() });
        }

        let identifier = [bytes[0], bytes[1]];
        if identifier != FILE_SIGNATURE {
            return Err(FormatError::InvalidMagic(identifier));
        }

        let header = Self {
            identifier,
            bitmap_file_size: LittleEndian::read_u32(&bytes[FILE_SIZE_POSITION..]),
            reserved1: LittleEndian::read_u16(&bytes[RESERVED1_POSITION..]),
            reserved2: LittleEndian::read_u16(&bytes[RESERVED2_POSITION..]),
            offset: LittleEndian::read_u32(&bytes[OFFSET_TO_PIXELS_POSITION..]),
            info_header_size: LittleEndian::read_u32(&bytes[INFO_HEADER_SIZE_POSITION..]),
            width: LittleEndian::read_i32(&bytes[WIDTH_POSITION..]),
            height: LittleEndian::read_i32(&bytes[HEIGHT_POSITION..]),
            colour_planes: LittleEndian::read_u16(&bytes[PLANES_POSITION..]),
            bits_per_pixel: LittleEndian::read_u16(&bytes[PIXEL_DEPTH_POSITION..]),
            compression_method: LittleEndian::read_u32(&bytes[COMPRESSION_POSITION..]),
            image_size: LittleEndian::read_u32(&bytes[IMAGE_SIZE_POSITION..]),
            horizontal_resolution: LittleEndian::read_i32(
                &bytes[HORIZONTAL_RESOLUTION_POSITION..],
            ),
            vertical_resolution: LittleEndian::read_i32(&bytes[VERTICAL_RESOLUTION_POSITION..]),
            colour_palette_number: LittleEndian::read_u32(&bytes[PALETTE_COUNT_POSITION..]),
            important_colours: LittleEndian::read_u32(&bytes[IMPORTANT_COLOURS_POSITION..]),
        };

        trace!("Width: {}", header.width);
        trace!("Height: {}", header.height);
        trace!("Bits per pixel: {}", header.bits_per_pixel);
        trace!("Image size: {}", header.image_size);

        Ok(header)
    }

    /// Reads and decodes a header from the start of `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, BitmapError> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        reader
            .by_ref()
            .take(HEADER_SIZE as u64)
            .read_to_end(&mut bytes)?;
        Ok(Self::parse(&bytes)?)
    }

    /// Encodes the header as exactly 54 little-endian bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..2].copy_from_slice(&self.identifier);
        LittleEndian::write_u32(&mut out[FILE_SIZE_POSITION..], self.bitmap_file_size);
        LittleEndian::write_u16(&mut out[RESERVED1_POSITION..], self.reserved1);
        LittleEndian::write_u16(&mut out[RESERVED2_POSITION..], self.reserved2);
        LittleEndian::write_u32(&mut out[OFFSET_TO_PIXELS_POSITION..], self.offset);
        LittleEndian::write_u32(&mut out[INFO_HEADER_SIZE_POSITION..], self.info_header_size);
        LittleEndian::write_i32(&mut out[WIDTH_POSITION..], self.width);
        LittleEndian::write_i32(&mut out[HEIGHT_POSITION..], self.height);
        LittleEndian::write_u16(&mut out[PLANES_POSITION..], self.colour_planes);
        LittleEndian::write_u16(&mut out[PIXEL_DEPTH_POSITION..], self.bits_per_pixel);
        LittleEndian::write_u32(&mut out[COMPRESSION_POSITION..], self.compression_method);
        LittleEndian::write_u32(&mut out[IMAGE_SIZE_POSITION..], self.image_size);
        LittleEndian::write_i32(
            &mut out[HORIZONTAL_RESOLUTION_POSITION..],
            self.horizontal_resolution,
        );
        LittleEndian::write_i32(
            &mut out[VERTICAL_RESOLUTION_POSITION..],
            self.vertical_resolution,
        );
        LittleEndian::write_u32(&mut out[PALETTE_COUNT_POSITION..], self.colour_palette_number);
        LittleEndian::write_u32(&mut out[IMPORTANT_COLOURS_POSITION..], self.important_colours);
        out
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Checks that the header describes an uncompressed 32-bit bitmap whose
    /// size fields agree with its dimensions and fit within `options`.
    pub fn validate(&self, options: &BitmapOptions) -> Result<(), FormatError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(FormatError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.width as usize > options.max_width() {
            return Err(FormatError::TooLargeDimensions {
                dimension: "width",
                limit: options.max_width(),
                found: self.width as usize,
            });
        }
        if self.height as usize > options.max_height() {
            return Err(FormatError::TooLargeDimensions {
                dimension: "height",
                limit: options.max_height(),
                found: self.height as usize,
            });
        }
        if self.offset != HEADER_SIZE as u32 {
            return Err(FormatError::UnsupportedPixelOffset(self.offset));
        }
        if self.bits_per_pixel != BITS_PER_PIXEL {
            return Err(FormatError::UnsupportedBitsPerPixel(self.bits_per_pixel));
        }
        if self.compression_method != BI_RGB_COMPRESSION {
            return Err(FormatError::UnsupportedCompression(
                self.compression_method,
            ));
        }

        let expected = checked_image_size(self.width, self.height).ok_or(
            FormatError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )?;
        if self.image_size != expected {
            return Err(FormatError::InconsistentImageSize {
                declared: self.image_size,
                expected,
            });
        }
        let expected_file_size = expected + HEADER_SIZE as u32;
        if self.bitmap_file_size != expected_file_size {
            return Err(FormatError::InconsistentFileSize {
                declared: self.bitmap_file_size,
                expected: expected_file_size,
            });
        }
        Ok(())
    }

    /// Width in pixels. Zero for a header with a negative width.
    pub fn width(&self) -> usize {
        self.width.max(0) as usize
    }

    /// Height in pixels. Zero for a header with a negative height.
    pub fn height(&self) -> usize {
        self.height.max(0) as usize
    }
}

/// `width * height * 4`, provided the resulting file size still fits in a `u32`.
fn checked_image_size(width: i32, height: i32) -> Option<u32> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let image_size = (width as u64)
        .checked_mul(height as u64)?
        .checked_mul(BYTES_PER_PIXEL as u64)?;
    if image_size + HEADER_SIZE as u64 > u32::MAX as u64 {
        return None;
    }
    Some(image_size as u32)
}
