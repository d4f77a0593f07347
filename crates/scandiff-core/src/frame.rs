//! Single-frame reductions: thresholding, disk masking and centroids.

use ndarray::{Array2, ArrayView2};

/// Per-pixel filter applied before a frame reduction.
///
/// A pixel contributes when it is not excluded by the boolean mask, lies
/// inside the disk (when one is given) and is at or above the absolute
/// intensity threshold (when one is given).
#[derive(Default, Clone, Copy)]
pub struct FrameFilter<'a> {
    /// Absolute intensity cut; pixels strictly below it are dropped.
    pub threshold: Option<f64>,
    /// Keep-inside disk `(cx, cy, r)`; pixels with distance `> r` are dropped.
    pub disk: Option<(f64, f64, f64)>,
    /// Exclusion mask, `true` = pixel dropped.
    pub excluded: Option<ArrayView2<'a, bool>>,
}

impl FrameFilter<'_> {
    #[inline]
    fn passes(&self, y: usize, x: usize, value: f64) -> bool {
        if let Some(mask) = &self.excluded {
            if mask[(y, x)] {
                return false;
            }
        }
        if let Some((cx, cy, r)) = self.disk {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if dx * dx + dy * dy > r * r {
                return false;
            }
        }
        if let Some(t) = self.threshold {
            if value < t {
                return false;
            }
        }
        true
    }
}

/// Intensity-weighted centroid `(x, y)` of the pixels passing `filter`.
///
/// Returns NaN for both coordinates when no intensity survives the filter;
/// the caller decides whether that is an error.
pub fn centre_of_mass_frame(frame: ArrayView2<f64>, filter: &FrameFilter) -> [f64; 2] {
    let mut mass = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for ((y, x), &v) in frame.indexed_iter() {
        if !filter.passes(y, x, v) {
            continue;
        }
        mass += v;
        sx += v * x as f64;
        sy += v * y as f64;
    }
    if mass == 0.0 {
        [f64::NAN, f64::NAN]
    } else {
        [sx / mass, sy / mass]
    }
}

/// Copy of `frame` with pixels failing the threshold/disk filter zeroed.
///
/// With neither argument given the output equals the input.
pub fn threshold_and_mask_frame(
    frame: ArrayView2<f64>,
    threshold: Option<f64>,
    disk: Option<(f64, f64, f64)>,
) -> Array2<f64> {
    let filter = FrameFilter {
        threshold,
        disk,
        excluded: None,
    };
    let mut out = frame.to_owned();
    for ((y, x), v) in out.indexed_iter_mut() {
        if !filter.passes(y, x, *v) {
            *v = 0.0;
        }
    }
    out
}

/// Sum of the pixel intensities inside an annulus `r_inner <= d <= r_outer`
/// around `(cx, cy)`. `r_inner = 0` degenerates to a disk sum.
pub fn annular_sum_frame(
    frame: ArrayView2<f64>,
    cx: f64,
    cy: f64,
    r_inner: f64,
    r_outer: f64,
) -> f64 {
    let r_in2 = r_inner * r_inner;
    let r_out2 = r_outer * r_outer;
    let mut total = 0.0;
    for ((y, x), &v) in frame.indexed_iter() {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let d2 = dx * dx + dy * dy;
        if d2 >= r_in2 && d2 <= r_out2 {
            total += v;
        }
    }
    total
}

/// Bilinear sample of a frame at sub-pixel position `(x, y)`.
///
/// Returns `None` outside the interpolatable interior.
#[inline]
pub fn bilinear_sample(frame: ArrayView2<f64>, x: f64, y: f64) -> Option<f64> {
    let (h, w) = frame.dim();
    if w < 2 || h < 2 || x < 0.0 || y < 0.0 {
        return None;
    }
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    if x0 >= w - 1 || y0 >= h - 1 {
        return None;
    }
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;
    let p00 = frame[(y0, x0)];
    let p10 = frame[(y0, x0 + 1)];
    let p01 = frame[(y0 + 1, x0)];
    let p11 = frame[(y0 + 1, x0 + 1)];
    let top = p00 + (p10 - p00) * fx;
    let bottom = p01 + (p11 - p01) * fx;
    Some(top + (bottom - top) * fy)
}

/// Frame translated by `(dx, dy)` with bilinear interpolation.
///
/// `out(x, y) = in(x - dx, y - dy)`; reads outside the frame produce 0.
pub fn shift_frame(frame: ArrayView2<f64>, dx: f64, dy: f64) -> Array2<f64> {
    let (h, w) = frame.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        bilinear_sample(frame, x as f64 - dx, y as f64 - dy).unwrap_or(0.0)
    })
}

/// Frame rotated by `angle` radians about the frame centre, keeping shape.
///
/// Positive angles rotate content from +x toward +y, the same sense the
/// pixel-angle convention uses. Bilinear sampling; reads outside the frame
/// produce 0.
pub fn rotate_frame(frame: ArrayView2<f64>, angle: f64) -> Array2<f64> {
    let (h, w) = frame.dim();
    let cx = (w as f64 - 1.0) / 2.0;
    let cy = (h as f64 - 1.0) / 2.0;
    let (sin, cos) = angle.sin_cos();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let sx = cx + dx * cos + dy * sin;
        let sy = cy - dx * sin + dy * cos;
        bilinear_sample(frame, sx, sy).unwrap_or(0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn centroid_of_unit_impulse_is_exact() {
        let mut frame = Array2::<f64>::zeros((7, 9));
        frame[(3, 2)] = 1.0;
        let com = centre_of_mass_frame(frame.view(), &FrameFilter::default());
        assert_eq!(com, [2.0, 3.0]);
    }

    #[test]
    fn centroid_of_empty_frame_is_nan() {
        let frame = Array2::<f64>::zeros((5, 5));
        let com = centre_of_mass_frame(frame.view(), &FrameFilter::default());
        assert!(com[0].is_nan() && com[1].is_nan());
    }

    #[test]
    fn centroid_symmetric_cross() {
        let mut frame = Array2::<f64>::zeros((5, 5));
        frame[(2, 2)] = 1.0;
        frame[(1, 2)] = 0.5;
        frame[(3, 2)] = 0.5;
        frame[(2, 1)] = 0.5;
        frame[(2, 3)] = 0.5;
        let com = centre_of_mass_frame(frame.view(), &FrameFilter::default());
        assert!((com[0] - 2.0).abs() < 1e-12);
        assert!((com[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_threshold_drops_low_pixels() {
        let mut frame = Array2::<f64>::zeros((5, 5));
        frame[(2, 2)] = 10.0;
        frame[(0, 0)] = 1.0;
        let filter = FrameFilter {
            threshold: Some(2.0),
            ..Default::default()
        };
        assert_eq!(centre_of_mass_frame(frame.view(), &filter), [2.0, 2.0]);
    }

    #[test]
    fn centroid_disk_drops_outside_pixels() {
        let mut frame = Array2::<f64>::zeros((9, 9));
        frame[(4, 4)] = 1.0;
        frame[(0, 8)] = 100.0;
        let filter = FrameFilter {
            disk: Some((4.0, 4.0, 2.0)),
            ..Default::default()
        };
        assert_eq!(centre_of_mass_frame(frame.view(), &filter), [4.0, 4.0]);
    }

    #[test]
    fn threshold_and_mask_is_identity_without_arguments() {
        let frame = Array2::from_shape_fn((6, 4), |(y, x)| (y * 4 + x) as f64);
        let out = threshold_and_mask_frame(frame.view(), None, None);
        assert_eq!(out, frame);
    }

    #[test]
    fn threshold_and_mask_disk_keeps_cross_of_radius_one() {
        let frame = Array2::<f64>::ones((10, 10));
        let out = threshold_and_mask_frame(frame.view(), None, Some((3.0, 5.0, 1.0)));
        for ((y, x), &v) in out.indexed_iter() {
            let inside = (x as f64 - 3.0).hypot(y as f64 - 5.0) <= 1.0;
            assert_eq!(v, if inside { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn annular_sum_excludes_inner_disk() {
        let mut frame = Array2::<f64>::zeros((12, 14));
        frame[(9, 9)] = 1.0; // distance sqrt(18) ~ 4.24 from (6, 6)
        frame[(6, 6)] = 100.0; // centre, excluded by r_inner
        let s = annular_sum_frame(frame.view(), 6.0, 6.0, 2.0, 5.0);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn bilinear_sample_interpolates_midpoints() {
        let frame = Array2::from_shape_fn((4, 4), |(y, x)| (y + x) as f64);
        let v = bilinear_sample(frame.view(), 1.5, 1.5).unwrap();
        assert!((v - 3.0).abs() < 1e-12);
        assert!(bilinear_sample(frame.view(), -0.5, 1.0).is_none());
        assert!(bilinear_sample(frame.view(), 3.5, 1.0).is_none());
    }

    #[test]
    fn shift_frame_moves_impulse() {
        let mut frame = Array2::<f64>::zeros((8, 8));
        frame[(3, 4)] = 2.0;
        let out = shift_frame(frame.view(), 2.0, -1.0);
        assert_eq!(out[(2, 6)], 2.0);
        assert_eq!(out.sum(), 2.0);
    }

    #[test]
    fn rotate_frame_quarter_turn_sends_right_to_below() {
        let mut frame = Array2::<f64>::zeros((11, 11));
        frame[(5, 8)] = 1.0; // right of the centre (5, 5)
        let out = rotate_frame(frame.view(), std::f64::consts::FRAC_PI_2);
        assert!((out[(8, 5)] - 1.0).abs() < 1e-9);
        assert!((out.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rotate_frame_half_turn_mirrors_through_the_centre() {
        let mut frame = Array2::<f64>::zeros((9, 9));
        frame[(2, 7)] = 3.0;
        let out = rotate_frame(frame.view(), std::f64::consts::PI);
        assert!((out[(6, 1)] - 3.0).abs() < 1e-9);
    }
}
