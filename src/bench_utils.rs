//! Shared helpers for benchmark drivers.

use crate::{Bitmap, BlendMode, ImageAllocation};

pub const BENCH_SIZES: [i32; 4] = [256, 512, 1024, 2048];
pub const BENCH_ANGLES: [f64; 5] = [
    0.0,
    std::f64::consts::FRAC_PI_2,
    std::f64::consts::PI,
    0.3,
    std::f64::consts::FRAC_PI_4,
];
pub const BENCH_MODES: [BlendMode; 3] = [BlendMode::Overwrite, BlendMode::Add, BlendMode::Subtract];

pub fn create_test_bitmap(width: i32, height: i32) -> Bitmap {
    let mut bitmap = Bitmap::with_allocation(width, height, ImageAllocation::Standard)
        .unwrap_or_else(|err| panic!("cannot create {width}x{height} bench bitmap: {err}"));
    let w = bitmap.width();
    let h = bitmap.height();
    for y in 0..h {
        let row = bitmap.row_mut(y);
        for x in 0..w {
            let val = (x + y) as f64 / (w + h) as f64;
            let pixel = &mut row[x * 4..x * 4 + 3];
            pixel[0] = (val * 255.0) as u8;
            pixel[1] = ((1.0 - val) * 255.0) as u8;
            pixel[2] = (x ^ y) as u8;
        }
    }
    bitmap
}

pub fn mode_to_string(mode: BlendMode) -> &'static str {
    match mode {
        BlendMode::Overwrite => "OVERWRITE",
        BlendMode::Add => "ADD",
        BlendMode::Subtract => "SUBTRACT",
    }
}
