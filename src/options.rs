//! Load and allocation settings.

use crate::bitmap::ImageAllocation;

// Width and height are signed 32-bit header fields.
const DEFAULT_MAX_DIMENSION: usize = i32::MAX as usize;

/// Settings applied when creating or loading a [`Bitmap`](crate::Bitmap).
///
/// ```
/// use rusty_bitmaps::{BitmapOptions, ImageAllocation};
///
/// let options = BitmapOptions::default()
///     .set_allocation(ImageAllocation::Standard)
///     .set_max_width(4096)
///     .set_max_height(4096);
/// assert_eq!(options.max_width(), 4096);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmapOptions {
    allocation: ImageAllocation,
    /// Files wider than this are rejected before any pixel memory is allocated.
    ///
    /// - Default value: `i32::MAX`, so every bitmap the constructors accept
    ///   loads back with the defaults
    max_width: usize,
    /// Files taller than this are rejected before any pixel memory is allocated.
    ///
    /// - Default value: `i32::MAX`
    max_height: usize,
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self {
            allocation: ImageAllocation::default(),
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl BitmapOptions {
    pub const fn allocation(&self) -> ImageAllocation {
        self.allocation
    }

    pub const fn max_width(&self) -> usize {
        self.max_width
    }

    pub const fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn set_allocation(mut self, allocation: ImageAllocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn set_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    pub fn set_max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }
}
