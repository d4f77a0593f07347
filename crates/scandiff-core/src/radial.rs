//! Per-frame radial binning: mean intensity versus integer pixel radius.

use ndarray::{Array1, ArrayView2};

/// Mean intensity per integer radius bin around `(cx, cy)`.
///
/// Pixel radius is `floor(hypot(px - cx, py - cy))`; each bin holds the mean
/// of the intensities that fell into it, so a uniform frame yields a flat
/// profile. Bins no pixel maps to (the oversized tail, or everything when the
/// mask excludes a whole ring) are 0. `excluded` drops pixels before
/// accumulation, which changes per-bin counts and therefore means.
///
/// `n_bins` must be large enough for every pixel of the frame; out-of-range
/// radii are skipped rather than clamped, keeping the bound from
/// [`crate::geometry::longest_distance`] safe rather than load-bearing.
pub fn radial_mean_profile(
    frame: ArrayView2<f64>,
    cx: f64,
    cy: f64,
    n_bins: usize,
    excluded: Option<ArrayView2<bool>>,
) -> Array1<f64> {
    let mut sums = vec![0.0_f64; n_bins];
    let mut counts = vec![0_u64; n_bins];
    for ((y, x), &v) in frame.indexed_iter() {
        if let Some(mask) = &excluded {
            if mask[(y, x)] {
                continue;
            }
        }
        let r = (x as f64 - cx).hypot(y as f64 - cy).floor() as usize;
        if r < n_bins {
            sums[r] += v;
            counts[r] += 1;
        }
    }
    Array1::from_iter(
        sums.iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 }),
    )
}

/// Median intensity per integer radius bin around `(cx, cy)`.
///
/// Same binning as [`radial_mean_profile`]; even-sized bins average the two
/// middle values, empty bins hold 0. The IEEE total order keeps NaN values
/// from panicking the sort.
pub fn radial_median_profile(
    frame: ArrayView2<f64>,
    cx: f64,
    cy: f64,
    n_bins: usize,
) -> Array1<f64> {
    let mut bins: Vec<Vec<f64>> = vec![Vec::new(); n_bins];
    for ((y, x), &v) in frame.indexed_iter() {
        let r = (x as f64 - cx).hypot(y as f64 - cy).floor() as usize;
        if r < n_bins {
            bins[r].push(v);
        }
    }
    Array1::from_iter(bins.into_iter().map(|mut bin| {
        if bin.is_empty() {
            return 0.0;
        }
        bin.sort_unstable_by(f64::total_cmp);
        let mid = bin.len() / 2;
        if bin.len() % 2 == 0 {
            (bin[mid - 1] + bin[mid]) / 2.0
        } else {
            bin[mid]
        }
    }))
}
