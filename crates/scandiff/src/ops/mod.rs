//! Public analysis operations on [`Dataset`](crate::Dataset).
//!
//! Each operation follows the same pipeline:
//! 1. validate shapes and parameters eagerly, at call time;
//! 2. resolve centres and masks into flat-index lookups shareable with a
//!    deferred plan;
//! 3. hand a pure per-frame kernel to the execution adapter.

use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::centre::Centre;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::mask::Mask;

pub(crate) mod background;
pub(crate) mod centroid;
pub(crate) mod defect;
pub(crate) mod radial;
pub(crate) mod transform;
pub(crate) mod virtual_imaging;

/// Centre resolved against a dataset, addressable by flat navigation index.
#[derive(Clone)]
pub(crate) enum CentreLookup {
    Fixed(f64, f64),
    Per(Arc<Vec<f64>>, Arc<Vec<f64>>),
}

impl CentreLookup {
    pub(crate) fn at(&self, i: usize) -> (f64, f64) {
        match self {
            Self::Fixed(x, y) => (*x, *y),
            Self::Per(x, y) => (x[i], y[i]),
        }
    }

    /// `(cx_min, cx_max, cy_min, cy_max)` over all navigation positions.
    pub(crate) fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Self::Fixed(x, y) => (*x, *x, *y, *y),
            Self::Per(x, y) => {
                if x.is_empty() {
                    return (0.0, 0.0, 0.0, 0.0);
                }
                let span = |v: &[f64]| {
                    v.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
                        (lo.min(c), hi.max(c))
                    })
                };
                let (cx_min, cx_max) = span(x);
                let (cy_min, cy_max) = span(y);
                (cx_min, cx_max, cy_min, cy_max)
            }
        }
    }
}

/// Resolve an optional centre argument. `None` falls back to the negated
/// signal-axis offsets, the convention for a beam-centred calibration.
pub(crate) fn resolve_centre(ds: &Dataset, centre: Option<&Centre>) -> Result<CentreLookup> {
    match centre {
        None => {
            let [ax, ay] = ds.signal_axes();
            Ok(CentreLookup::Fixed(-ax.offset, -ay.offset))
        }
        Some(Centre::Fixed { x, y }) => Ok(CentreLookup::Fixed(*x, *y)),
        Some(Centre::PerPosition { x, y }) => {
            // Both arrays are checked: the fields are public, so the
            // constructor's own shape check can be bypassed.
            for (name, a) in [("centre_x", x), ("centre_y", y)] {
                if a.shape() != ds.nav_shape() {
                    return Err(Error::NavShapeMismatch {
                        name,
                        expected: ds.nav_shape().to_vec(),
                        actual: a.shape().to_vec(),
                    });
                }
            }
            let flatten = |a: &ndarray::ArrayD<f64>| Arc::new(a.iter().copied().collect::<Vec<_>>());
            Ok(CentreLookup::Per(flatten(x), flatten(y)))
        }
    }
}

/// Exclusion mask resolved against a dataset.
#[derive(Clone)]
pub(crate) enum MaskLookup {
    None,
    Frame(Arc<Array2<bool>>),
    Per(Arc<Array3<bool>>),
}

impl MaskLookup {
    /// Exclusion view for the frame at a flat navigation index.
    pub(crate) fn frame(&self, i: usize) -> Option<ArrayView2<'_, bool>> {
        match self {
            Self::None => None,
            Self::Frame(m) => Some(m.view()),
            Self::Per(m) => Some(m.index_axis(Axis(0), i)),
        }
    }
}

pub(crate) fn resolve_mask(ds: &Dataset, mask: Option<&Mask>) -> Result<MaskLookup> {
    let (h, w) = ds.frame_shape();
    match mask {
        None => Ok(MaskLookup::None),
        Some(Mask::Frame(m)) => {
            if m.dim() != (h, w) {
                return Err(Error::FrameShapeMismatch {
                    name: "mask",
                    expected: (h, w),
                    actual: m.dim(),
                });
            }
            Ok(MaskLookup::Frame(Arc::new(m.clone())))
        }
        Some(Mask::PerPosition(m)) => {
            let mut expected = ds.nav_shape().to_vec();
            expected.extend_from_slice(&[h, w]);
            if m.shape() != expected.as_slice() {
                return Err(Error::NavShapeMismatch {
                    name: "mask",
                    expected,
                    actual: m.shape().to_vec(),
                });
            }
            let n = ds.n_positions();
            let stack = Array3::from_shape_vec((n, h, w), m.iter().copied().collect())
                .expect("row-major flattening preserves the element count");
            Ok(MaskLookup::Per(Arc::new(stack)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axes::AxisDescriptor;
    use ndarray::{ArrayD, IxDyn};

    fn blank(nav: &[usize], h: usize, w: usize) -> Dataset {
        let mut shape = nav.to_vec();
        shape.extend_from_slice(&[h, w]);
        Dataset::from_array(ArrayD::zeros(IxDyn(&shape))).unwrap()
    }

    #[test]
    fn default_centre_comes_from_axis_calibration() {
        let ds = blank(&[2], 10, 10)
            .with_signal_axes(AxisDescriptor::new(1.0, -4.0, ""), AxisDescriptor::new(0.5, -3.0, ""));
        match resolve_centre(&ds, None).unwrap() {
            CentreLookup::Fixed(x, y) => {
                assert_eq!(x, 4.0);
                assert_eq!(y, 3.0);
            }
            CentreLookup::Per(..) => panic!("expected fixed centre"),
        }
    }

    #[test]
    fn per_position_centre_must_match_navigation_shape() {
        let ds = blank(&[2, 3], 4, 4);
        let bad = Centre::per_position(
            ArrayD::zeros(IxDyn(&[3, 2])),
            ArrayD::zeros(IxDyn(&[3, 2])),
        )
        .unwrap();
        assert!(matches!(
            resolve_centre(&ds, Some(&bad)),
            Err(Error::NavShapeMismatch { name: "centre_x", .. })
        ));
    }

    #[test]
    fn mismatched_y_centre_is_rejected_at_call_time() {
        // The struct fields are public, so a wrong-shaped y can arrive
        // without going through Centre::per_position.
        let ds = blank(&[2], 6, 6);
        let bad = Centre::PerPosition {
            x: ArrayD::zeros(IxDyn(&[2])),
            y: ArrayD::zeros(IxDyn(&[3])),
        };
        assert!(matches!(
            resolve_centre(&ds, Some(&bad)),
            Err(Error::NavShapeMismatch { name: "centre_y", .. })
        ));
        let lazy = blank(&[2], 6, 6).into_deferred(1).unwrap();
        assert!(matches!(
            lazy.radial_integration(Some(&bad), None),
            Err(Error::NavShapeMismatch { name: "centre_y", .. })
        ));
        assert!(matches!(
            lazy.angular_slice_radial_integration(
                &crate::AngularSliceConfig::default(),
                Some(&bad),
                None,
            ),
            Err(Error::NavShapeMismatch { name: "centre_y", .. })
        ));
    }

    #[test]
    fn centre_bounds_cover_all_positions() {
        let ds = blank(&[4], 8, 8);
        let centre = Centre::per_position(
            ArrayD::from_shape_vec(IxDyn(&[4]), vec![3.0, 5.0, 4.0, 2.0]).unwrap(),
            ArrayD::from_shape_vec(IxDyn(&[4]), vec![7.0, 1.0, 4.0, 4.0]).unwrap(),
        )
        .unwrap();
        let lookup = resolve_centre(&ds, Some(&centre)).unwrap();
        assert_eq!(lookup.bounds(), (2.0, 5.0, 1.0, 7.0));
        assert_eq!(lookup.at(1), (5.0, 1.0));
    }

    #[test]
    fn frame_mask_shape_is_validated() {
        let ds = blank(&[2], 4, 4);
        let mask = Mask::Frame(Array2::from_elem((3, 4), false));
        assert!(matches!(
            resolve_mask(&ds, Some(&mask)),
            Err(Error::FrameShapeMismatch { name: "mask", .. })
        ));
    }

    #[test]
    fn per_position_mask_resolves_by_flat_index() {
        let ds = blank(&[2], 2, 2);
        let mut m = ArrayD::from_elem(IxDyn(&[2, 2, 2]), false);
        m[[1, 0, 1]] = true;
        let lookup = resolve_mask(&ds, Some(&Mask::PerPosition(m))).unwrap();
        assert!(!lookup.frame(0).unwrap()[[0, 1]]);
        assert!(lookup.frame(1).unwrap()[[0, 1]]);
    }
}
