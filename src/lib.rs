//! 32-bit BMP bitmaps with blend-mode drawing primitives and rotation.
//!
//! # Overview
//!
//! - [`Header`]: explicit little-endian codec for the 54-byte file + info header.
//! - [`Bitmap`]: a header plus an owned BGRA pixel buffer, loaded from or saved
//!   to disk.
//! - Drawing ([`Bitmap::fill`], [`Bitmap::draw_rectangle`],
//!   [`Bitmap::draw_circle`], [`Bitmap::draw_line`], [`Bitmap::set_pixel`]):
//!   clipped primitives that combine colour with the buffer through a
//!   [`BlendMode`].
//! - [`OpRotateBitmap`]: in-place rotation around an arbitrary centre by
//!   inverse mapping.
//!
//! Rows are stored top row first, which differs from the bottom-up order of
//! canonical BMP files. Files round-trip through this crate unchanged; use
//! [`Bitmap::flip_vertical`] when exchanging files with other readers.
//!
//! # Example
//!
//! ```no_run
//! use rusty_bitmaps::{Bitmap, BlendMode, Colour};
//!
//! # fn main() -> rusty_bitmaps::Result<()> {
//! let mut bitmap = Bitmap::new(200, 100)?;
//! bitmap.fill(Colour::WHITE);
//! bitmap.draw_circle(Colour::new(0, 0, 255), 100, 50, 40, BlendMode::Overwrite);
//! bitmap.draw_rectangle(Colour::new(80, 0, 0), 20, 180, 40, 60, BlendMode::Subtract);
//! bitmap.rotate(bitmap.center_x(), bitmap.center_y(), std::f64::consts::FRAC_PI_4);
//! bitmap.save("out.bmp")?;
//!
//! let loaded = Bitmap::load("out.bmp")?;
//! assert_eq!(loaded.as_bytes(), bitmap.as_bytes());
//! # Ok(())
//! # }
//! ```

#[doc(hidden)]
pub mod bench_utils;
mod bitmap;
mod error;
mod header;
mod op_draw;
mod op_rotate_bitmap;
mod options;

pub use crate::bitmap::{ALPHA, BLUE, Bitmap, Colour, GREEN, ImageAllocation, RED};
pub use crate::error::{BitmapError, FormatError, Result};
pub use crate::header::{BYTES_PER_PIXEL, FILE_SIGNATURE, HEADER_SIZE, Header, INFO_HEADER_SIZE};
pub use crate::op_draw::BlendMode;
pub use crate::op_rotate_bitmap::OpRotateBitmap;
pub use crate::options::BitmapOptions;
