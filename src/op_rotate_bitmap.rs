//! In-place rotation around an arbitrary centre by inverse mapping.
//!
//! # Algorithm Overview
//!
//! 1. **Exact angles**: `0`, `π/2`, `π` and `3π/2` use exact sine/cosine
//!    values so axis-aligned rotations do not drift.
//!
//! 2. **Snapshot + clear**: the current pixels are copied aside and the bitmap
//!    is cleared to opaque black.
//!
//! 3. **Inverse mapping**: every destination pixel `(x, y)` pulls from
//!
//!    ```text
//!    src_x = cos * (x - cx) - sin * (y - cy) + cx
//!    src_y = sin * (x - cx) + cos * (y - cy) + cy
//!    ```
//!
//!    truncated toward zero. Destinations whose source falls outside the
//!    bitmap stay black. Only RGB is copied; alpha stays opaque.
//!
//! Pulling instead of pushing leaves no holes, but rotations that shrink
//! detail around the centre can alias. There is no interpolation.

use std::f64::consts::{FRAC_PI_2, PI};

use log::trace;

use crate::bitmap::{Bitmap, Colour};
use crate::header::BYTES_PER_PIXEL;

const THREE_FRAC_PI_2: f64 = 3.0 * FRAC_PI_2;

/// Rotation operator holding the pivot and the resolved sine/cosine pair.
///
/// ```
/// use rusty_bitmaps::{Bitmap, OpRotateBitmap};
///
/// let mut bitmap = Bitmap::new(64, 32).unwrap();
/// let mut rotate = OpRotateBitmap::new();
/// rotate
///     .set_center(bitmap.center_x(), bitmap.center_y())
///     .set_rotation(std::f64::consts::FRAC_PI_4);
/// rotate.apply(&mut bitmap);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OpRotateBitmap {
    center_x: f64,
    center_y: f64,
    angle: f64,
    sin: f64,
    cos: f64,
}

impl Default for OpRotateBitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl OpRotateBitmap {
    /// Identity rotation about the origin.
    pub fn new() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            angle: 0.0,
            sin: 0.0,
            cos: 1.0,
        }
    }

    /// Sets the pivot in pixel coordinates (column, row).
    pub fn set_center(&mut self, center_x: f64, center_y: f64) -> &mut Self {
        self.center_x = center_x;
        self.center_y = center_y;
        self
    }

    /// Sets the rotation angle in radians.
    pub fn set_rotation(&mut self, angle: f64) -> &mut Self {
        let (sin, cos) = sin_cos(angle);
        self.angle = angle;
        self.sin = sin;
        self.cos = cos;
        self
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_y)
    }

    /// Rotates `bitmap` in place. Allocates one transient copy of its pixels.
    pub fn apply(&self, bitmap: &mut Bitmap) {
        trace!(
            "Rotating {}x{} bitmap by {} rad about ({}, {}), sin={} cos={}",
            bitmap.width(),
            bitmap.height(),
            self.angle,
            self.center_x,
            self.center_y,
            self.sin,
            self.cos
        );

        let source = bitmap.as_bytes().to_vec();
        bitmap.fill(Colour::BLACK);

        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                let Some((src_x, src_y)) = self.source_coordinates(x, y) else {
                    continue;
                };
                let Some((src_x, src_y)) = bitmap.checked_coords(src_x, src_y) else {
                    continue;
                };
                let src = bitmap.offset_of(src_x, src_y);
                let dst = bitmap.offset_of(x, y);
                bitmap.data[dst..dst + BYTES_PER_PIXEL - 1]
                    .copy_from_slice(&source[src..src + BYTES_PER_PIXEL - 1]);
            }
        }
    }

    /// Maps a destination pixel back to the source pixel it takes its colour from.
    ///
    /// Written as `x + (cos - 1) * dx - sin * dy` rather than
    /// `cos * dx - sin * dy + cx`; the two are equal, but this form maps every
    /// pixel onto itself exactly at angle 0, whatever the centre.
    #[inline(always)]
    fn source_coordinates(&self, x: usize, y: usize) -> Option<(i64, i64)> {
        let (x, y) = (x as f64, y as f64);
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let src_x = x + (self.cos - 1.0) * dx - self.sin * dy;
        let src_y = y + self.sin * dx + (self.cos - 1.0) * dy;
        if !src_x.is_finite() || !src_y.is_finite() {
            return None;
        }
        // `as` truncates toward zero.
        Some((src_x as i64, src_y as i64))
    }
}

impl Bitmap {
    /// Rotates the bitmap in place by `angle` radians about
    /// (`center_x`, `center_y`). See [`OpRotateBitmap`].
    pub fn rotate(&mut self, center_x: f64, center_y: f64, angle: f64) {
        OpRotateBitmap::new()
            .set_center(center_x, center_y)
            .set_rotation(angle)
            .apply(self);
    }
}

/// Sine and cosine of `angle`, exact for the four axis-aligned angles.
fn sin_cos(angle: f64) -> (f64, f64) {
    if angle == 0.0 {
        (0.0, 1.0)
    } else if angle == FRAC_PI_2 {
        (1.0, 0.0)
    } else if angle == PI {
        (0.0, -1.0)
    } else if angle == THREE_FRAC_PI_2 {
        (-1.0, 0.0)
    } else {
        angle.sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ImageAllocation;

    fn patterned(width: i32, height: i32) -> Bitmap {
        let mut img =
            Bitmap::with_allocation(width, height, ImageAllocation::Standard).expect("bitmap");
        for y in 0..img.height() {
            for x in 0..img.width() {
                let pixel = img.pixel_mut(x, y);
                pixel[0] = x as u8;
                pixel[1] = y as u8;
                pixel[2] = (x * 16 + y) as u8;
            }
        }
        img
    }

    #[test]
    fn test_axis_aligned_angles_are_exact() {
        assert_eq!(sin_cos(0.0), (0.0, 1.0));
        assert_eq!(sin_cos(FRAC_PI_2), (1.0, 0.0));
        assert_eq!(sin_cos(PI), (0.0, -1.0));
        assert_eq!(sin_cos(1.5 * PI), (-1.0, 0.0));

        let (sin, cos) = sin_cos(0.3);
        assert_eq!(sin, 0.3_f64.sin());
        assert_eq!(cos, 0.3_f64.cos());
    }

    #[test]
    fn test_identity_mapping_for_any_center() {
        let mut rotate = OpRotateBitmap::new();
        rotate.set_center(0.1, 7.3).set_rotation(0.0);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(
                    rotate.source_coordinates(x, y),
                    Some((x as i64, y as i64))
                );
            }
        }
    }

    #[test]
    fn test_general_angle_agrees_with_centred_form() {
        let (cx, cy) = (2.5, 1.75);
        let mut rotate = OpRotateBitmap::new();
        rotate.set_center(cx, cy).set_rotation(0.3);
        let (sin, cos) = 0.3_f64.sin_cos();
        for y in 0..6 {
            for x in 0..6 {
                let (dx, dy) = (x as f64 - cx, y as f64 - cy);
                let src_x = cos * dx - sin * dy + cx;
                let src_y = sin * dx + cos * dy + cy;
                // The two forms may round apart by an ulp right at an integer.
                if (src_x - src_x.round()).abs() < 1e-9 || (src_y - src_y.round()).abs() < 1e-9 {
                    continue;
                }
                assert_eq!(
                    rotate.source_coordinates(x, y),
                    Some((src_x as i64, src_y as i64)),
                    "pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_half_turn_mapping() {
        let mut rotate = OpRotateBitmap::new();
        rotate.set_center(4.5, 2.0).set_rotation(PI);
        assert_eq!(rotate.source_coordinates(0, 0), Some((9, 4)));
        assert_eq!(rotate.source_coordinates(9, 4), Some((0, 0)));
        assert_eq!(rotate.source_coordinates(3, 1), Some((6, 3)));
    }

    #[test]
    fn test_quarter_turn_on_square() {
        let original = patterned(3, 3);
        let mut rotated = original.clone();
        rotated.rotate(1.0, 1.0, FRAC_PI_2);

        // dst(x, y) = src(2 - y, x)
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(
                    rotated.pixel(x, y)[..3],
                    original.pixel(2 - y, x)[..3],
                    "pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_out_of_range_sources_become_black() {
        let mut img = patterned(4, 2);
        img.fill(Colour::WHITE);
        img.rotate(0.0, 0.0, PI);

        // src = (-x, -y): only (0, 0) has an in-bounds source.
        assert_eq!(img.pixel(0, 0), &[255, 255, 255, 255]);
        assert_eq!(img.pixel(3, 1), &[0, 0, 0, 255]);
    }

    #[test]
    fn test_truncation_toward_zero() {
        let mut img = Bitmap::with_allocation(2, 1, ImageAllocation::Standard).expect("bitmap");
        img.pixel_mut(0, 0).copy_from_slice(&[10, 20, 30, 255]);
        img.pixel_mut(1, 0).copy_from_slice(&[40, 50, 60, 255]);

        // src_x = 0.5 - x: x = 1 gives -0.5, which truncates to 0 rather than flooring to -1.
        img.rotate(0.25, 0.0, PI);
        assert_eq!(img.pixel(0, 0), &[10, 20, 30, 255]);
        assert_eq!(img.pixel(1, 0), &[10, 20, 30, 255]);
    }

    #[test]
    fn test_rotation_forces_opaque_alpha() {
        let mut img = patterned(3, 3);
        for pixel in img.as_bytes_mut().chunks_exact_mut(4) {
            pixel[3] = 9;
        }
        img.rotate(1.0, 1.0, 0.4);
        assert!(img.as_bytes().chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_non_finite_angle_clears_to_black() {
        let mut img = patterned(3, 3);
        img.rotate(1.0, 1.0, f64::NAN);
        assert!(img.as_bytes().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }
}
