//! Whole-frame signal transforms: flips and sub-pixel shifts.

use std::sync::Arc;

use ndarray::{s, ArrayD, ArrayView2};
use scandiff_core::frame;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::exec;

/// Per-frame translation applied by [`Dataset::shift_signal`], in signal
/// pixels. Positive `dx` moves content toward larger column indices.
#[derive(Debug, Clone)]
pub enum FrameShift {
    /// One shift shared by every navigation position.
    Fixed { dx: f64, dy: f64 },
    /// Per-position shifts; both arrays must match the navigation shape.
    /// Typically derived from a centre-of-mass pass, e.g. to re-centre a
    /// wandering beam.
    PerPosition { dx: ArrayD<f64>, dy: ArrayD<f64> },
}

enum ShiftLookup {
    Fixed(f64, f64),
    Per(Arc<Vec<f64>>, Arc<Vec<f64>>),
}

impl ShiftLookup {
    fn at(&self, i: usize) -> (f64, f64) {
        match self {
            Self::Fixed(dx, dy) => (*dx, *dy),
            Self::Per(dx, dy) => (dx[i], dy[i]),
        }
    }
}

impl Dataset {
    /// Mirror every frame along the signal x axis (columns reversed).
    pub fn flip_signal_x(&self) -> Dataset {
        exec::map_dataset(
            self,
            Arc::new(|f: ArrayView2<f64>, _| f.slice(s![.., ..;-1]).to_owned()),
        )
    }

    /// Mirror every frame along the signal y axis (rows reversed).
    pub fn flip_signal_y(&self) -> Dataset {
        exec::map_dataset(
            self,
            Arc::new(|f: ArrayView2<f64>, _| f.slice(s![..;-1, ..]).to_owned()),
        )
    }

    /// Rotate every frame by `angle` radians about the frame centre,
    /// keeping the signal shape.
    ///
    /// Positive angles rotate content from +x toward +y, matching the
    /// pixel-angle convention of the angular operations. Bilinear sampling;
    /// content rotated in from outside the frame is 0. The execution mode of
    /// the input is preserved.
    pub fn rotate_signal(&self, angle: f64) -> Dataset {
        exec::map_dataset(
            self,
            Arc::new(move |f: ArrayView2<f64>, _| frame::rotate_frame(f, angle)),
        )
    }

    /// Translate every frame by a (possibly fractional) shift.
    ///
    /// Fractional shifts are bilinearly interpolated; pixels sampled from
    /// outside the frame become 0. The execution mode of the input is
    /// preserved.
    pub fn shift_signal(&self, shift: &FrameShift) -> Result<Dataset> {
        let lookup = match shift {
            FrameShift::Fixed { dx, dy } => ShiftLookup::Fixed(*dx, *dy),
            FrameShift::PerPosition { dx, dy } => {
                for (name, a) in [("shift_dx", dx), ("shift_dy", dy)] {
                    if a.shape() != self.nav_shape() {
                        return Err(Error::NavShapeMismatch {
                            name,
                            expected: self.nav_shape().to_vec(),
                            actual: a.shape().to_vec(),
                        });
                    }
                }
                ShiftLookup::Per(
                    Arc::new(dx.iter().copied().collect()),
                    Arc::new(dy.iter().copied().collect()),
                )
            }
        };
        Ok(exec::map_dataset(
            self,
            Arc::new(move |f: ArrayView2<f64>, i| {
                let (dx, dy) = lookup.at(i);
                frame::shift_frame(f, dx, dy)
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{impulse_frame, stack};
    use ndarray::IxDyn;

    #[test]
    fn flips_mirror_the_impulse() {
        let ds = Dataset::from_frame(impulse_frame(6, 8, 1, 2, 5.0));
        let x = ds.flip_signal_x().to_array();
        assert_eq!(x[[1, 5]], 5.0);
        assert_eq!(x[[1, 2]], 0.0);
        let y = ds.flip_signal_y().to_array();
        assert_eq!(y[[4, 2]], 5.0);
    }

    #[test]
    fn double_flip_is_identity() {
        let data = stack(&[2], |i| impulse_frame(5, 7, i + 1, 2 * i, 1.0));
        let ds = Dataset::from_array(data.clone()).unwrap();
        assert_eq!(ds.flip_signal_x().flip_signal_x().to_array(), data);
        assert_eq!(ds.flip_signal_y().flip_signal_y().to_array(), data);
    }

    #[test]
    fn rotation_keeps_the_signal_shape() {
        let data = stack(&[7, 5], |_| impulse_frame(4, 15, 2, 9, 1.0));
        let ds = Dataset::from_array(data.clone()).unwrap();
        let rot = ds.rotate_signal(std::f64::consts::FRAC_PI_4);
        assert_eq!(rot.nav_shape(), &[7, 5]);
        assert_eq!(rot.frame_shape(), (4, 15));
        let lazy = Dataset::from_array(data).unwrap().into_deferred(5).unwrap();
        let rot_lazy = lazy.rotate_signal(std::f64::consts::FRAC_PI_4);
        assert!(rot_lazy.is_deferred());
        assert_eq!(rot_lazy.frame_shape(), (4, 15));
    }

    #[test]
    fn half_turn_moves_quadrant_blocks_across_the_centre() {
        // Ones in the lower-right block end up in the upper-left one.
        let data = stack(&[2], |_| {
            ndarray::Array2::from_shape_fn((12, 14), |(y, x)| {
                if y >= 6 && x >= 7 {
                    1.0
                } else {
                    0.0
                }
            })
        });
        let ds = Dataset::from_array(data).unwrap();
        let rot = ds.rotate_signal(std::f64::consts::PI).to_array();
        for y in 1..6 {
            for x in 1..7 {
                assert!((rot[[0, y, x]] - 1.0).abs() < 1e-9, "pixel ({y}, {x})");
            }
        }
        for y in 7..12 {
            for x in 8..14 {
                assert!(rot[[0, y, x]].abs() < 1e-9, "pixel ({y}, {x})");
            }
        }
    }

    #[test]
    fn rotation_agrees_between_modes() {
        let data = stack(&[3], |i| impulse_frame(10, 10, 2 + i, 7 - i, 1.0));
        let eager = Dataset::from_array(data.clone()).unwrap();
        let lazy = Dataset::from_array(data).unwrap().into_deferred(2).unwrap();
        let angle = 0.7;
        assert_eq!(
            eager.rotate_signal(angle).to_array(),
            lazy.rotate_signal(angle).to_array()
        );
    }

    #[test]
    fn integer_shift_moves_the_impulse() {
        let ds = Dataset::from_frame(impulse_frame(8, 8, 3, 3, 2.0));
        let shifted = ds
            .shift_signal(&FrameShift::Fixed { dx: 2.0, dy: -1.0 })
            .unwrap()
            .to_array();
        assert_eq!(shifted[[2, 5]], 2.0);
        assert_eq!(shifted[[3, 3]], 0.0);
    }

    #[test]
    fn fractional_shift_spreads_bilinearly() {
        let ds = Dataset::from_frame(impulse_frame(8, 8, 4, 4, 1.0));
        let shifted = ds
            .shift_signal(&FrameShift::Fixed { dx: 0.5, dy: 0.0 })
            .unwrap()
            .to_array();
        assert!((shifted[[4, 4]] - 0.5).abs() < 1e-12);
        assert!((shifted[[4, 5]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn shifted_out_pixels_become_zero() {
        let ds = Dataset::from_frame(impulse_frame(4, 4, 0, 3, 1.0));
        let shifted = ds
            .shift_signal(&FrameShift::Fixed { dx: 1.0, dy: 0.0 })
            .unwrap()
            .to_array();
        assert_eq!(shifted.sum(), 0.0);
    }

    #[test]
    fn per_position_shift_recentres_each_frame() {
        let data = stack(&[2], |i| impulse_frame(9, 9, 4, 3 + 2 * i, 1.0));
        let ds = Dataset::from_array(data).unwrap();
        let shift = FrameShift::PerPosition {
            dx: ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, -1.0]).unwrap(),
            dy: ArrayD::from_shape_vec(IxDyn(&[2]), vec![0.0, 0.0]).unwrap(),
        };
        let out = ds.shift_signal(&shift).unwrap().to_array();
        assert_eq!(out[[0, 4, 4]], 1.0);
        assert_eq!(out[[1, 4, 4]], 1.0);
    }

    #[test]
    fn per_position_shift_shape_is_validated() {
        let data = stack(&[2], |_| impulse_frame(4, 4, 1, 1, 1.0));
        let ds = Dataset::from_array(data).unwrap();
        let shift = FrameShift::PerPosition {
            dx: ArrayD::zeros(IxDyn(&[3])),
            dy: ArrayD::zeros(IxDyn(&[3])),
        };
        assert!(matches!(
            ds.shift_signal(&shift),
            Err(Error::NavShapeMismatch { name: "shift_dx", .. })
        ));
    }

    #[test]
    fn shift_agrees_between_modes() {
        let data = stack(&[4], |i| impulse_frame(10, 10, 2 + i, 7 - i, 1.0 + i as f64));
        let eager = Dataset::from_array(data.clone()).unwrap();
        let lazy = Dataset::from_array(data).unwrap().into_deferred(3).unwrap();
        let shift = FrameShift::Fixed { dx: -1.5, dy: 2.25 };
        let a = eager.shift_signal(&shift).unwrap().to_array();
        let b = lazy.shift_signal(&shift).unwrap();
        assert!(b.is_deferred());
        assert_eq!(a, b.to_array());
    }
}
