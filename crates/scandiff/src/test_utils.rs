//! Synthetic frame builders shared by the unit tests.

use ndarray::{Array2, ArrayD, IxDyn};

/// Initialize env_logger once for the test binary; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Frame with a single bright pixel at `(row, col)`.
pub fn impulse_frame(h: usize, w: usize, row: usize, col: usize, value: f64) -> Array2<f64> {
    let mut f = Array2::zeros((h, w));
    f[[row, col]] = value;
    f
}

/// Frame with a one-bin-wide ring: pixels whose floored distance from the
/// centre equals `r` hold `intensity`, everything else 0.
pub fn ring_frame(h: usize, w: usize, cx: f64, cy: f64, r: usize, intensity: f64) -> Array2<f64> {
    Array2::from_shape_fn((h, w), |(y, x)| {
        let d = (x as f64 - cx).hypot(y as f64 - cy);
        if d.floor() as usize == r {
            intensity
        } else {
            0.0
        }
    })
}

/// Frame with a filled disk of radius `r` around the centre.
pub fn disk_frame(h: usize, w: usize, cx: f64, cy: f64, r: f64, intensity: f64) -> Array2<f64> {
    Array2::from_shape_fn((h, w), |(y, x)| {
        let d = (x as f64 - cx).hypot(y as f64 - cy);
        if d <= r {
            intensity
        } else {
            0.0
        }
    })
}

/// Stack per-position frames from `build` into a full dataset array with the
/// given navigation shape. All frames must share one shape.
pub fn stack(nav_shape: &[usize], mut build: impl FnMut(usize) -> Array2<f64>) -> ArrayD<f64> {
    let n: usize = nav_shape.iter().product();
    let mut flat = Vec::new();
    let mut frame_shape = (0, 0);
    for i in 0..n {
        let frame = build(i);
        frame_shape = frame.dim();
        flat.extend(frame.iter().copied());
    }
    let mut shape = nav_shape.to_vec();
    shape.extend_from_slice(&[frame_shape.0, frame_shape.1]);
    ArrayD::from_shape_vec(IxDyn(&shape), flat).expect("frames share one shape")
}
