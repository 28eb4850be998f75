//! 32-bit bitmap with row-major BGRA pixel storage.
//!
//! # Memory Layout
//!
//! Pixels are stored in a flat byte buffer in row-major order:
//!
//! ```text
//! data[(y * width + x) * 4 + c]    c: 0 = blue, 1 = green, 2 = red, 3 = alpha
//! ```
//!
//! Row 0 is the first row stored in the file and every operation in this crate
//! treats it as such. Standard BMP readers expect the bottom row first, so files
//! written here appear vertically flipped in third-party viewers unless the
//! caller applies [`Bitmap::flip_vertical`] first.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::ptr::NonNull;
use std::slice;

use log::{debug, warn};

use crate::error::{BitmapError, FormatError, Result};
use crate::header::{BYTES_PER_PIXEL, Header};
use crate::options::BitmapOptions;

/// Index of each channel within a pixel.
pub const BLUE: usize = 0;
pub const GREEN: usize = 1;
pub const RED: usize = 2;
pub const ALPHA: usize = 3;

/// An opaque RGB colour. Carries no alpha.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour::new(0, 0, 0);
    pub const WHITE: Colour = Colour::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Reads the colour of a BGRA pixel, ignoring alpha.
    pub fn from_bgra(pixel: &[u8; 4]) -> Self {
        Self::new(pixel[RED], pixel[GREEN], pixel[BLUE])
    }

    /// Channels in storage order (blue, green, red).
    #[inline(always)]
    pub const fn bgr(self) -> [u8; 3] {
        [self.blue, self.green, self.red]
    }
}

/// Allocation strategy for bitmap pixel buffers.
///
/// The default uses huge pages on macOS/Linux and standard pages elsewhere.
/// `HugePages` is best-effort: it falls back to standard pages if the OS
/// cannot satisfy the request or the buffer is smaller than one huge page.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageAllocation {
    Standard,
    HugePages,
}

impl Default for ImageAllocation {
    fn default() -> Self {
        if cfg!(any(target_os = "macos", target_os = "linux")) {
            ImageAllocation::HugePages
        } else {
            ImageAllocation::Standard
        }
    }
}

/// Zero-initialised pixel storage, backed by a `Vec` or an anonymous mapping.
///
/// Released when dropped.
pub(crate) enum PixelBuffer {
    Vec(Vec<u8>),
    Mmap {
        ptr: NonNull<u8>,
        len: usize,
        bytes: usize,
    },
}

impl PixelBuffer {
    fn new(len: usize, allocation: ImageAllocation) -> Self {
        if len == 0 {
            return PixelBuffer::Vec(Vec::new());
        }
        match allocation {
            ImageAllocation::Standard => PixelBuffer::Vec(vec![0; len]),
            ImageAllocation::HugePages => {
                try_huge_pages(len).unwrap_or_else(|| PixelBuffer::Vec(vec![0; len]))
            }
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            PixelBuffer::Vec(data) => data.as_slice(),
            PixelBuffer::Mmap { ptr, len, .. } => unsafe {
                slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            PixelBuffer::Vec(data) => data.as_mut_slice(),
            PixelBuffer::Mmap { ptr, len, .. } => unsafe {
                slice::from_raw_parts_mut(ptr.as_ptr(), *len)
            },
        }
    }

    fn is_mapped(&self) -> bool {
        matches!(self, PixelBuffer::Mmap { .. })
    }
}

// SAFETY: the mapping is owned exclusively by this value and only reachable
// through `&self`/`&mut self`, exactly like the `Vec` variant.
unsafe impl Send for PixelBuffer {}
unsafe impl Sync for PixelBuffer {}

impl Deref for PixelBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl DerefMut for PixelBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        if let PixelBuffer::Mmap { ptr, bytes, .. } = self {
            #[cfg(any(target_os = "macos", target_os = "linux"))]
            unsafe {
                libc::munmap(ptr.as_ptr() as *mut libc::c_void, *bytes);
            }
        }
    }
}

#[cfg(any(target_os = "macos", target_os = "linux"))]
const HUGE_PAGE_MIN_BYTES: usize = 2 * 1024 * 1024;

#[cfg(any(target_os = "macos", target_os = "linux"))]
fn align_up(value: usize, alignment: usize) -> Option<usize> {
    if alignment == 0 {
        return None;
    }
    let rem = value % alignment;
    if rem == 0 {
        Some(value)
    } else {
        value.checked_add(alignment - rem)
    }
}

#[cfg(target_os = "linux")]
fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as usize } else { 4096 }
}

#[cfg(target_os = "macos")]
const VM_FLAGS_SUPERPAGE_SIZE_2MB: libc::c_int = 0x00020000;

#[cfg(target_os = "macos")]
fn try_huge_pages(len: usize) -> Option<PixelBuffer> {
    if len < HUGE_PAGE_MIN_BYTES {
        return None;
    }
    let alloc_bytes = align_up(len, HUGE_PAGE_MIN_BYTES)?;
    let map_ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            alloc_bytes,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANON,
            VM_FLAGS_SUPERPAGE_SIZE_2MB,
            0,
        )
    };
    if map_ptr == libc::MAP_FAILED {
        return None;
    }
    let Some(ptr) = NonNull::new(map_ptr as *mut u8) else {
        unsafe {
            libc::munmap(map_ptr, alloc_bytes);
        }
        return None;
    };
    Some(PixelBuffer::Mmap {
        ptr,
        len,
        bytes: alloc_bytes,
    })
}

#[cfg(target_os = "linux")]
fn try_huge_pages(len: usize) -> Option<PixelBuffer> {
    if len < HUGE_PAGE_MIN_BYTES {
        return None;
    }
    let alloc_bytes = align_up(len, page_size())?;
    let map_ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            alloc_bytes,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if map_ptr == libc::MAP_FAILED {
        return None;
    }
    unsafe {
        libc::madvise(map_ptr, alloc_bytes, libc::MADV_HUGEPAGE);
    }
    let Some(ptr) = NonNull::new(map_ptr as *mut u8) else {
        unsafe {
            libc::munmap(map_ptr, alloc_bytes);
        }
        return None;
    };
    Some(PixelBuffer::Mmap {
        ptr,
        len,
        bytes: alloc_bytes,
    })
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn try_huge_pages(_len: usize) -> Option<PixelBuffer> {
    None
}

/// A header paired with exactly `width * height * 4` bytes of BGRA pixels.
///
/// The header's width and height always match the buffer. The buffer is owned
/// exclusively and released when the bitmap is dropped or [disposed].
///
/// [disposed]: Bitmap::dispose
#[derive(Debug)]
pub struct Bitmap {
    header: Header,
    allocation: ImageAllocation,
    pub(crate) data: PixelBuffer,
}

impl Clone for Bitmap {
    fn clone(&self) -> Self {
        let mut data = PixelBuffer::new(self.data.len(), self.allocation);
        data.copy_from_slice(&self.data);
        Self {
            header: self.header,
            allocation: self.allocation,
            data,
        }
    }
}

impl Bitmap {
    /// Creates an opaque black `width` x `height` bitmap.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Self::with_allocation(width, height, ImageAllocation::default())
    }

    /// Creates an opaque black bitmap using the allocation from `options`.
    ///
    /// Dimensions beyond `options.max_width()` or `options.max_height()` are
    /// rejected, so the result always loads back with the same options.
    pub fn with_options(width: i32, height: i32, options: &BitmapOptions) -> Result<Self> {
        if width as i64 > options.max_width() as i64 || height as i64 > options.max_height() as i64
        {
            return Err(BitmapError::InvalidDimensions { width, height });
        }
        Self::with_allocation(width, height, options.allocation())
    }

    pub fn with_allocation(width: i32, height: i32, allocation: ImageAllocation) -> Result<Self> {
        let header = Header::new(width, height)?;
        let mut data = PixelBuffer::new(header.image_size as usize, allocation);
        for pixel in data.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel[ALPHA] = u8::MAX;
        }
        Ok(Self {
            header,
            allocation,
            data,
        })
    }

    /// Loads a bitmap previously written by [`Bitmap::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_options(path, &BitmapOptions::default())
    }

    pub fn load_with_options(path: impl AsRef<Path>, options: &BitmapOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| BitmapError::io(path, err))?;
        let mut reader = BufReader::new(file);
        let bitmap =
            Self::read_from_with_options(&mut reader, options).map_err(|err| attach_path(err, path))?;
        debug!(
            "Loaded {}x{} bitmap from {}",
            bitmap.width(),
            bitmap.height(),
            path.display()
        );
        Ok(bitmap)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Self::read_from_with_options(reader, &BitmapOptions::default())
    }

    /// Reads a header and its pixel data from `reader`.
    ///
    /// The header must pass [`Header::validate`], so the buffer size is always
    /// derived from the dimensions. Short pixel data is a
    /// [`FormatError::TruncatedPixelData`].
    pub fn read_from_with_options<R: Read>(reader: &mut R, options: &BitmapOptions) -> Result<Self> {
        let header = Header::read_from(reader)?;
        header.validate(options)?;

        let expected = header.image_size as usize;
        let mut data = PixelBuffer::new(expected, options.allocation());
        let found = read_fully(reader, &mut data)?;
        if found < expected {
            return Err(FormatError::TruncatedPixelData { expected, found }.into());
        }

        let mut probe = [0u8; 1];
        if read_fully(reader, &mut probe)? > 0 {
            warn!("Ignoring trailing bytes after {expected} bytes of pixel data");
        }

        Ok(Self {
            header,
            allocation: options.allocation(),
            data,
        })
    }

    /// Writes the header followed by the pixel data to `path`, replacing any
    /// existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| BitmapError::io(path, err))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|()| writer.flush().map_err(BitmapError::from))
            .map_err(|err| attach_path(err, path))?;
        debug!(
            "Saved {}x{} bitmap to {}",
            self.width(),
            self.height(),
            path.display()
        );
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.write_to(writer)?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    /// Releases the pixel buffer.
    pub fn dispose(self) {
        drop(self);
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn allocation(&self) -> ImageAllocation {
        self.allocation
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.header.width()
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.header.height()
    }

    /// Size of the file this bitmap saves to, header included.
    pub fn file_size(&self) -> u32 {
        self.header.bitmap_file_size
    }

    /// Size of the pixel data in bytes.
    pub fn image_size(&self) -> u32 {
        self.header.image_size
    }

    /// Column coordinate of the image centre, `(width - 1) / 2`.
    pub fn center_x(&self) -> f64 {
        (self.header.width as f64 - 1.0) / 2.0
    }

    /// Row coordinate of the image centre, `(height - 1) / 2`.
    pub fn center_y(&self) -> f64 {
        (self.header.height as f64 - 1.0) / 2.0
    }

    /// Returns the row stride in bytes (width * 4).
    pub fn stride(&self) -> usize {
        self.width() * BYTES_PER_PIXEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the bytes of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        let start = y * stride;
        &self.data[start..start + stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.stride();
        let start = y * stride;
        &mut self.data[start..start + stride]
    }

    /// Returns the BGRA bytes of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let start = self.offset_of(x, y);
        &self.data[start..start + BYTES_PER_PIXEL]
    }

    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let start = self.offset_of(x, y);
        &mut self.data[start..start + BYTES_PER_PIXEL]
    }

    /// Colour at (`x`, `y`), or `None` outside the bitmap.
    pub fn colour_at(&self, x: i32, y: i32) -> Option<Colour> {
        let (x, y) = self.checked_coords(x as i64, y as i64)?;
        let pixel: &[u8; BYTES_PER_PIXEL] = self.pixel(x, y).try_into().ok()?;
        Some(Colour::from_bgra(pixel))
    }

    /// Reverses the row order in place.
    ///
    /// Applying this before [`save`](Bitmap::save) produces the bottom-up row
    /// order standard BMP viewers expect; applying it after [`load`](Bitmap::load)
    /// undoes it.
    pub fn flip_vertical(&mut self) {
        let stride = self.stride();
        let height = self.height();
        for y in 0..height / 2 {
            let (upper, lower) = self.data.split_at_mut((height - 1 - y) * stride);
            upper[y * stride..(y + 1) * stride].swap_with_slice(&mut lower[..stride]);
        }
    }

    #[inline(always)]
    pub(crate) fn offset_of(&self, x: usize, y: usize) -> usize {
        (y * self.width() + x) * BYTES_PER_PIXEL
    }

    /// Converts signed coordinates to indices when they lie inside the bitmap.
    #[inline(always)]
    pub(crate) fn checked_coords(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        if x < 0 || y < 0 || x >= self.header.width as i64 || y >= self.header.height as i64 {
            return None;
        }
        Some((x as usize, y as usize))
    }
}

/// Reads until `buf` is full or the reader is exhausted, returning the count.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn attach_path(err: BitmapError, path: &Path) -> BitmapError {
    match err {
        BitmapError::Stream(source) => BitmapError::io(path, source),
        other => other,
    }
}
