//! Scan-position geometry: radial extents, pixel angles and sector masks.
//!
//! Angle convention, held by every caller in the workspace: angle 0 lies along
//! the +x axis and increases with +y. Since y grows downward in array-index
//! space, the sector `[0, PI/2)` covers pixels right of and below the centre.

use ndarray::Array2;
use std::f64::consts::TAU;

/// Maximum floored corner distance over a box of admissible centres.
///
/// The four corners are `(0, 0)`, `(w, 0)`, `(0, h)` and `(w, h)`; for each
/// corner the farthest centre in `[cx_min, cx_max] x [cy_min, cy_max]` is
/// considered. The result is a safe upper bound on the floored distance from
/// any centre in the box to any pixel of a `h` x `w` frame, used to size
/// radial-profile outputs. `min == max` on both axes degenerates to the
/// single-centre case.
pub fn longest_distance(
    w: usize,
    h: usize,
    cx_min: f64,
    cx_max: f64,
    cy_min: f64,
    cy_max: f64,
) -> usize {
    let corners = [
        (0.0, 0.0),
        (w as f64, 0.0),
        (0.0, h as f64),
        (w as f64, h as f64),
    ];
    let mut longest = 0.0_f64;
    for (x, y) in corners {
        let dx = (x - cx_min).abs().max((x - cx_max).abs());
        let dy = (y - cy_min).abs().max((y - cy_max).abs());
        longest = longest.max(dx.hypot(dy));
    }
    longest.floor() as usize
}

/// Angle from centre to pixel, wrapped into `[0, TAU)`.
///
/// The centre pixel itself maps to angle 0.
#[inline]
pub fn pixel_angle(px: f64, py: f64, cx: f64, cy: f64) -> f64 {
    let t = (py - cy).atan2(px - cx);
    if t < 0.0 {
        t + TAU
    } else {
        t
    }
}

/// Whether a wrapped angle `t` in `[0, TAU)` lies in the sector
/// `[angle0, angle1)` modulo `TAU`.
///
/// Intervals of width `>= TAU` match every angle. `angle1` may exceed `TAU`
/// (wrapping sector); a non-positive width matches nothing.
#[inline]
pub fn angle_in_sector(t: f64, angle0: f64, angle1: f64) -> bool {
    let width = angle1 - angle0;
    if width >= TAU {
        return true;
    }
    if width <= 0.0 {
        return false;
    }
    let a0 = angle0.rem_euclid(TAU);
    let a1 = a0 + width;
    if a1 <= TAU {
        t >= a0 && t < a1
    } else {
        t >= a0 || t < a1 - TAU
    }
}

/// Boolean frame mask, `true` where the pixel angle from `(cx, cy)` lies in
/// `[angle0, angle1)` modulo `TAU`.
pub fn sector_mask_frame(
    h: usize,
    w: usize,
    angle0: f64,
    angle1: f64,
    cx: f64,
    cy: f64,
) -> Array2<bool> {
    Array2::from_shape_fn((h, w), |(y, x)| {
        angle_in_sector(pixel_angle(x as f64, y as f64, cx, cy), angle0, angle1)
    })
}

/// Calibrated corner sample points for external plane-fitting routines.
///
/// For each of the four frame corners, a `(x, y, weight = 1)` triple inset by
/// `corner_fraction / 2` of the calibrated extent from the corner. Axis ranges
/// are given as `(low, high)` calibrated values. Corner order: low/low,
/// low/high, high/low, high/high in (x, y).
pub fn corner_values(
    x_range: (f64, f64),
    y_range: (f64, f64),
    corner_fraction: f64,
) -> [[f64; 3]; 4] {
    let (x_lo, x_hi) = x_range;
    let (y_lo, y_hi) = y_range;
    let inset_x = (x_hi - x_lo) * corner_fraction * 0.5;
    let inset_y = (y_hi - y_lo) * corner_fraction * 0.5;
    [
        [x_lo + inset_x, y_lo + inset_y, 1.0],
        [x_lo + inset_x, y_hi - inset_y, 1.0],
        [x_hi - inset_x, y_lo + inset_y, 1.0],
        [x_hi - inset_x, y_hi - inset_y, 1.0],
    ]
}
