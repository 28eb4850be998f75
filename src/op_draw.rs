//! Drawing primitives over a [`Bitmap`].
//!
//! Every primitive except [`Bitmap::fill`] combines its colour with the
//! existing pixels through a [`BlendMode`] and leaves alpha untouched.
//! Geometry outside the bitmap is clipped; nothing here can fail.
//!
//! Coordinates are `(x, y)` = `(column, row)` with row 0 being the first row
//! in the buffer. Rectangles and circle bounding boxes are half-open:
//! `[left, right) x [bottom, top)`.

use crate::bitmap::{ALPHA, Bitmap, Colour};
use crate::header::BYTES_PER_PIXEL;

/// How a drawing colour combines with the pixel already in the buffer.
///
/// Applied per RGB channel:
///
/// - `Overwrite`: `dst = colour`
/// - `Add`: `dst = min(255, dst + colour)`
/// - `Subtract`: `dst = max(0, dst - colour)`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Overwrite,
    Add,
    Subtract,
}

impl BlendMode {
    /// Blends `colour` into the BGR channels of a single BGRA pixel.
    #[inline(always)]
    pub fn blend(self, pixel: &mut [u8], colour: Colour) {
        let bgr = colour.bgr();
        let channels = &mut pixel[..3];
        match self {
            BlendMode::Overwrite => channels.copy_from_slice(&bgr),
            BlendMode::Add => {
                for (dst, src) in channels.iter_mut().zip(bgr) {
                    *dst = dst.saturating_add(src);
                }
            }
            BlendMode::Subtract => {
                for (dst, src) in channels.iter_mut().zip(bgr) {
                    *dst = dst.saturating_sub(src);
                }
            }
        }
    }
}

/// A non-empty, in-bounds half-open pixel range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ClipRect {
    left: usize,
    right: usize,
    bottom: usize,
    top: usize,
}

impl Bitmap {
    /// Sets every pixel to `colour` with full alpha.
    pub fn fill(&mut self, colour: Colour) {
        let bgr = colour.bgr();
        for pixel in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel[..3].copy_from_slice(&bgr);
            pixel[ALPHA] = u8::MAX;
        }
    }

    /// Blends `colour` into every pixel with `bottom <= y < top` and
    /// `left <= x < right`.
    ///
    /// The bounds are clamped to the bitmap but never reordered, so
    /// `left > right` or `bottom > top` draws nothing.
    pub fn draw_rectangle(
        &mut self,
        colour: Colour,
        left: i32,
        right: i32,
        bottom: i32,
        top: i32,
        mode: BlendMode,
    ) {
        let Some(rect) = self.clip(left as i64, right as i64, bottom as i64, top as i64) else {
            return;
        };
        for y in rect.bottom..rect.top {
            let row = self.row_mut(y);
            for pixel in row[rect.left * BYTES_PER_PIXEL..rect.right * BYTES_PER_PIXEL]
                .chunks_exact_mut(BYTES_PER_PIXEL)
            {
                mode.blend(pixel, colour);
            }
        }
    }

    /// Blends `colour` into every pixel strictly closer than `radius` to
    /// (`center_x`, `center_y`). Pixels at exactly `radius` are left alone.
    pub fn draw_circle(
        &mut self,
        colour: Colour,
        center_x: i32,
        center_y: i32,
        radius: i32,
        mode: BlendMode,
    ) {
        let (cx, cy, r) = (center_x as i64, center_y as i64, radius as i64);
        let Some(rect) = self.clip(cx - r, cx + r, cy - r, cy + r) else {
            return;
        };
        let radius_squared = r * r;
        for y in rect.bottom..rect.top {
            let dy = y as i64 - cy;
            let dy_squared = dy * dy;
            let row = self.row_mut(y);
            for x in rect.left..rect.right {
                let dx = x as i64 - cx;
                if dx * dx + dy_squared < radius_squared {
                    let start = x * BYTES_PER_PIXEL;
                    mode.blend(&mut row[start..start + BYTES_PER_PIXEL], colour);
                }
            }
        }
    }

    /// Draws a line by linear interpolation between the two end points.
    ///
    /// The start is clamped up to 0 and the end down to the bitmap size;
    /// other out-of-range samples are skipped. `max(|dx|, |dy|) + 1` samples
    /// are taken, both end points included, and each sample position is
    /// truncated toward zero.
    pub fn draw_line(
        &mut self,
        colour: Colour,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        mode: BlendMode,
    ) {
        let start_x = start_x.max(0) as i128;
        let start_y = start_y.max(0) as i128;
        let end_x = end_x.min(self.header().width) as i128;
        let end_y = end_y.min(self.header().height) as i128;

        let dx = end_x - start_x;
        let dy = end_y - start_y;
        let segments = dx.abs().max(dy.abs());

        for i in 0..=segments {
            let (x, y) = if segments == 0 {
                (start_x, start_y)
            } else {
                // Integer division truncates toward zero, matching a float
                // lerp followed by a truncating cast without rounding error.
                (
                    (start_x * segments + i * dx) / segments,
                    (start_y * segments + i * dy) / segments,
                )
            };
            if let Some((x, y)) = self.checked_coords(x as i64, y as i64) {
                let start = self.offset_of(x, y);
                mode.blend(&mut self.data[start..start + BYTES_PER_PIXEL], colour);
            }
        }
    }

    /// Blends `colour` into the pixel at (`x`, `y`). Does nothing outside
    /// `[0, width) x [0, height)`.
    pub fn set_pixel(&mut self, colour: Colour, x: i32, y: i32, mode: BlendMode) {
        if let Some((x, y)) = self.checked_coords(x as i64, y as i64) {
            mode.blend(self.pixel_mut(x, y), colour);
        }
    }

    fn clip(&self, left: i64, right: i64, bottom: i64, top: i64) -> Option<ClipRect> {
        let left = left.max(0);
        let right = right.min(self.width() as i64);
        let bottom = bottom.max(0);
        let top = top.min(self.height() as i64);
        if left >= right || bottom >= top {
            return None;
        }
        Some(ClipRect {
            left: left as usize,
            right: right as usize,
            bottom: bottom as usize,
            top: top as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ImageAllocation;

    const RED: Colour = Colour::new(255, 0, 0);

    fn bitmap(width: i32, height: i32) -> Bitmap {
        Bitmap::with_allocation(width, height, ImageAllocation::Standard).expect("bitmap")
    }

    fn painted(bitmap: &Bitmap) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                if bitmap.pixel(x, y)[..3] != [0, 0, 0] {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_blend_modes() {
        let colour = Colour::new(100, 50, 200);

        let mut pixel = [10, 20, 30, 7];
        BlendMode::Overwrite.blend(&mut pixel, colour);
        assert_eq!(pixel, [200, 50, 100, 7]);

        let mut pixel = [100, 220, 200, 7];
        BlendMode::Add.blend(&mut pixel, colour);
        assert_eq!(pixel, [255, 255, 255, 7]);

        let mut pixel = [100, 40, 200, 7];
        BlendMode::Subtract.blend(&mut pixel, colour);
        assert_eq!(pixel, [0, 0, 100, 7]);
    }

    #[test]
    fn test_default_mode_is_overwrite() {
        assert_eq!(BlendMode::default(), BlendMode::Overwrite);
    }

    #[test]
    fn test_clip() {
        let img = bitmap(4, 3);
        assert_eq!(
            img.clip(-5, 9, -5, 9),
            Some(ClipRect {
                left: 0,
                right: 4,
                bottom: 0,
                top: 3
            })
        );
        assert_eq!(img.clip(3, 1, 0, 3), None);
        assert_eq!(img.clip(0, 4, 2, 2), None);
        assert_eq!(img.clip(5, 9, 0, 3), None);
        assert_eq!(img.clip(0, 4, -3, -1), None);
    }

    #[test]
    fn test_rectangle_is_half_open() {
        let mut img = bitmap(5, 5);
        img.draw_rectangle(RED, 1, 3, 2, 4, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_circle_radius_one_is_a_single_pixel() {
        let mut img = bitmap(5, 5);
        img.draw_circle(RED, 2, 2, 1, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(2, 2)]);
    }

    #[test]
    fn test_circle_radius_zero_draws_nothing() {
        let mut img = bitmap(5, 5);
        img.draw_circle(RED, 2, 2, 0, BlendMode::Overwrite);
        assert!(painted(&img).is_empty());
    }

    #[test]
    fn test_diagonal_line() {
        let mut img = bitmap(4, 4);
        img.draw_line(RED, 0, 0, 3, 3, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_shallow_line_truncates() {
        let mut img = bitmap(5, 3);
        img.draw_line(RED, 0, 0, 4, 1, BlendMode::Overwrite);
        // y = trunc(i / 4) for i in 0..=4
        assert_eq!(
            painted(&img),
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 1)]
        );
    }

    #[test]
    fn test_line_end_clamped_to_size_skips_the_edge() {
        let mut img = bitmap(4, 1);
        img.draw_line(RED, 0, 0, 100, 0, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn test_reversed_line_stays_in_bounds() {
        let mut img = bitmap(4, 4);
        img.draw_line(RED, 3, 3, -10, -10, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_single_point_line() {
        let mut img = bitmap(3, 3);
        img.draw_line(RED, 1, 2, 1, 2, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(1, 2)]);
    }

    #[test]
    fn test_set_pixel_bounds_are_exclusive() {
        let mut img = bitmap(3, 2);
        img.set_pixel(RED, 3, 0, BlendMode::Overwrite);
        img.set_pixel(RED, 0, 2, BlendMode::Overwrite);
        img.set_pixel(RED, -1, 0, BlendMode::Overwrite);
        assert!(painted(&img).is_empty());

        img.set_pixel(RED, 2, 1, BlendMode::Overwrite);
        assert_eq!(painted(&img), vec![(2, 1)]);
    }

    #[test]
    fn test_fill_forces_alpha() {
        let mut img = bitmap(2, 2);
        img.as_bytes_mut().fill(0);
        img.fill(Colour::new(1, 2, 3));
        assert!(img.as_bytes().chunks_exact(4).all(|p| p == [3, 2, 1, 255]));
    }
}
