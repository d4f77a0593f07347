//! Pixel exclusion masks and analytic detector-region shapes.

use ndarray::{Array2, ArrayD};

use crate::error::{Error, Result};

/// Boolean pixel mask where `true` means EXCLUDED from analysis.
#[derive(Debug, Clone)]
pub enum Mask {
    /// One frame-shaped mask applied at every navigation position.
    Frame(Array2<bool>),
    /// Full dataset-shaped mask (navigation shape plus signal shape).
    PerPosition(ArrayD<bool>),
}

impl Mask {
    /// Build an exclusion mask from a selection, keeping only pixels that
    /// are `true` in `selected`. 2-D input becomes a frame mask; higher-rank
    /// input a per-position mask.
    pub fn keep_only(selected: ArrayD<bool>) -> Self {
        let inverted = selected.mapv(|keep| !keep);
        if inverted.ndim() == 2 {
            let (h, w) = (inverted.shape()[0], inverted.shape()[1]);
            let frame = inverted
                .into_shape_with_order((h, w))
                .expect("2-D dynamic array reshapes to Array2");
            Self::Frame(frame)
        } else {
            Self::PerPosition(inverted)
        }
    }
}

/// Circular detector region: pixels with `hypot(px - cx, py - cy) <= r` are
/// inside.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiskMask {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl DiskMask {
    pub fn new(cx: f64, cy: f64, r: f64) -> Self {
        Self { cx, cy, r }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.r >= 0.0) {
            return Err(Error::ParameterRange {
                name: "r",
                value: self.r,
                range: ">= 0",
            });
        }
        Ok(())
    }
}

/// Annular detector region: pixels with `r_inner <= d <= r_outer` are inside.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnulusMask {
    pub cx: f64,
    pub cy: f64,
    pub r_inner: f64,
    pub r_outer: f64,
}

impl AnnulusMask {
    pub fn new(cx: f64, cy: f64, r_inner: f64, r_outer: f64) -> Self {
        Self {
            cx,
            cy,
            r_inner,
            r_outer,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.r_inner >= 0.0) {
            return Err(Error::ParameterRange {
                name: "r_inner",
                value: self.r_inner,
                range: ">= 0",
            });
        }
        if !(self.r_inner < self.r_outer) {
            return Err(Error::ParameterRange {
                name: "r_outer",
                value: self.r_outer,
                range: "> r_inner",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn keep_only_inverts_selection() {
        let sel = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![true, false, false, true]).unwrap();
        match Mask::keep_only(sel) {
            Mask::Frame(m) => {
                assert!(!m[[0, 0]]);
                assert!(m[[0, 1]]);
            }
            Mask::PerPosition(_) => panic!("2-D selection should become a frame mask"),
        }
    }

    #[test]
    fn keep_only_keeps_higher_rank_per_position() {
        let sel = ArrayD::from_elem(IxDyn(&[2, 3, 3]), true);
        assert!(matches!(Mask::keep_only(sel), Mask::PerPosition(_)));
    }

    #[test]
    fn annulus_ordering_is_enforced() {
        assert!(AnnulusMask::new(5.0, 5.0, 2.0, 4.0).validate().is_ok());
        assert!(AnnulusMask::new(5.0, 5.0, 4.0, 2.0).validate().is_err());
        assert!(AnnulusMask::new(5.0, 5.0, 3.0, 3.0).validate().is_err());
        assert!(AnnulusMask::new(5.0, 5.0, -1.0, 2.0).validate().is_err());
    }

    #[test]
    fn disk_radius_must_be_non_negative() {
        assert!(DiskMask::new(0.0, 0.0, 0.0).validate().is_ok());
        assert!(DiskMask::new(0.0, 0.0, -0.5).validate().is_err());
    }
}
