//! Detector defect kernels: hot/dead pixel flagging and neighbor interpolation.

use ndarray::{Array2, ArrayView2};

/// Reflect an offset index into `[0, n)` (edge pixels mirror, `-1 -> 0`,
/// `n -> n - 1`). Offsets reaching past one full reflection, possible when
/// a median window is wider than the frame, clamp to the nearest edge.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let j = if i < 0 {
        -i - 1
    } else if i >= n {
        2 * n - i - 1
    } else {
        i
    };
    j.clamp(0, n - 1) as usize
}

/// Square median filter of window half-width `radius` with reflected
/// borders. The window side is `2 * radius + 1`; NaN values sort last under
/// the IEEE total order, so they never panic the filter and only skew the
/// median where they dominate a window.
pub fn median_filter(frame: ArrayView2<f64>, radius: usize) -> Array2<f64> {
    let (h, w) = frame.dim();
    let r = radius as isize;
    let side = 2 * radius + 1;
    let mut window = vec![0.0_f64; side * side];
    Array2::from_shape_fn((h, w), |(y, x)| {
        let mut k = 0;
        for dy in -r..=r {
            for dx in -r..=r {
                let yy = reflect(y as isize + dy, h);
                let xx = reflect(x as isize + dx, w);
                window[k] = frame[(yy, xx)];
                k += 1;
            }
        }
        window.sort_unstable_by(f64::total_cmp);
        window[window.len() / 2]
    })
}

/// 3x3 median filter with reflected borders.
pub fn median_filter_3x3(frame: ArrayView2<f64>) -> Array2<f64> {
    median_filter(frame, 1)
}

/// Flag pixels whose value exceeds the local 3x3 median scaled by
/// `threshold_multiplier`. Larger multipliers flag fewer pixels. Pixels
/// excluded by the mask are never flagged.
pub fn hot_pixel_mask_frame(
    frame: ArrayView2<f64>,
    threshold_multiplier: f64,
    excluded: Option<ArrayView2<bool>>,
) -> Array2<bool> {
    let median = median_filter_3x3(frame);
    let mut flags = Array2::from_elem(frame.dim(), false);
    for ((y, x), flag) in flags.indexed_iter_mut() {
        if let Some(mask) = &excluded {
            if mask[(y, x)] {
                continue;
            }
        }
        *flag = frame[(y, x)] > median[(y, x)] * threshold_multiplier;
    }
    flags
}

/// Fold step for dead-pixel detection: keep a candidate only while it reads
/// `dead_value` in the current frame too.
pub fn dead_pixel_fold(acc: &mut Array2<bool>, frame: ArrayView2<f64>, dead_value: f64) {
    for (flag, &v) in acc.iter_mut().zip(frame.iter()) {
        *flag = *flag && v == dead_value;
    }
}

/// Replace flagged pixels by the mean of their non-flagged in-frame
/// neighbors: 4-neighborhood first, widening to the diagonals when all four
/// are flagged or out of frame. A pixel with no usable neighbor at all is
/// left unchanged.
pub fn interpolate_bad_pixels(frame: ArrayView2<f64>, flagged: ArrayView2<bool>) -> Array2<f64> {
    const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

    let (h, w) = frame.dim();
    let mut out = frame.to_owned();
    let neighbor_mean = |y: usize, x: usize, offsets: &[(isize, isize)]| -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0;
        for &(dy, dx) in offsets {
            let yy = y as isize + dy;
            let xx = x as isize + dx;
            if yy < 0 || yy >= h as isize || xx < 0 || xx >= w as isize {
                continue;
            }
            let (yy, xx) = (yy as usize, xx as usize);
            if flagged[(yy, xx)] {
                continue;
            }
            sum += frame[(yy, xx)];
            count += 1;
        }
        (count > 0).then(|| sum / count as f64)
    };
    for ((y, x), &bad) in flagged.indexed_iter() {
        if !bad {
            continue;
        }
        if let Some(v) = neighbor_mean(y, x, &CROSS).or_else(|| neighbor_mean(y, x, &DIAGONAL)) {
            out[(y, x)] = v;
        }
    }
    out
}
