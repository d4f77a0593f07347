//! Diffraction-pattern centre parameters.

use ndarray::ArrayD;

use crate::error::{Error, Result};

/// Centre of the diffraction pattern in signal-pixel coordinates.
///
/// When no centre is supplied, operations derive one from the signal-axis
/// calibration as `(-offset_x, -offset_y)`.
#[derive(Debug, Clone)]
pub enum Centre {
    /// One centre shared by every navigation position.
    Fixed { x: f64, y: f64 },
    /// Per-position centres; both arrays must match the navigation shape.
    /// Typically the output of a centre-of-mass pass.
    PerPosition { x: ArrayD<f64>, y: ArrayD<f64> },
}

impl Centre {
    pub fn fixed(x: f64, y: f64) -> Self {
        Self::Fixed { x, y }
    }

    /// Per-position centre from two navigation-shaped arrays.
    pub fn per_position(x: ArrayD<f64>, y: ArrayD<f64>) -> Result<Self> {
        if x.shape() != y.shape() {
            return Err(Error::NavShapeMismatch {
                name: "centre_y",
                expected: x.shape().to_vec(),
                actual: y.shape().to_vec(),
            });
        }
        Ok(Self::PerPosition { x, y })
    }

    /// Split a `(.., 2)` centre-of-mass result into a per-position centre.
    /// The last axis holds `[x, y]`.
    pub fn from_com(com: &ArrayD<f64>) -> Result<Self> {
        let ndim = com.ndim();
        if ndim == 0 || com.shape()[ndim - 1] != 2 {
            return Err(Error::NavShapeMismatch {
                name: "centre",
                expected: vec![2],
                actual: com.shape().to_vec(),
            });
        }
        let x = com.index_axis(ndarray::Axis(ndim - 1), 0).to_owned();
        let y = com.index_axis(ndarray::Axis(ndim - 1), 1).to_owned();
        Ok(Self::PerPosition {
            x: x.into_dyn(),
            y: y.into_dyn(),
        })
    }
}
