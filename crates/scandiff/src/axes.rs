//! Axis calibration descriptors.
//!
//! An axis descriptor is an immutable (scale, offset, unit) triple passed
//! into calls that need calibrated coordinates. The engine consumes it, never
//! mutates it, and keeps no calibration state between calls.

use scandiff_core::geometry;

/// Linear calibration of one array axis: `value = index * scale + offset`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisDescriptor {
    /// Calibrated step per pixel.
    pub scale: f64,
    /// Calibrated value of index 0.
    pub offset: f64,
    /// Unit label, informational only.
    pub unit: String,
}

impl Default for AxisDescriptor {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            unit: String::new(),
        }
    }
}

impl AxisDescriptor {
    /// Uncalibrated axis (scale 1, offset 0).
    pub fn pixels() -> Self {
        Self::default()
    }

    pub fn new(scale: f64, offset: f64, unit: impl Into<String>) -> Self {
        Self {
            scale,
            offset,
            unit: unit.into(),
        }
    }

    /// Calibrated value at a (possibly fractional) index.
    #[inline]
    pub fn value_at(&self, index: f64) -> f64 {
        index * self.scale + self.offset
    }

    /// Calibrated `(low, high)` extent of an axis with `n` samples.
    pub fn extent(&self, n: usize) -> (f64, f64) {
        (self.offset, self.value_at(n.saturating_sub(1) as f64))
    }
}

/// Calibrated `(x, y, weight = 1)` samples near the four frame corners,
/// inset by `corner_fraction / 2` of each axis extent.
///
/// Consumed by external background-plane calibration; corner order is
/// low/low, low/high, high/low, high/high in (x, y).
pub fn corner_values(
    frame_shape: (usize, usize),
    x_axis: &AxisDescriptor,
    y_axis: &AxisDescriptor,
    corner_fraction: f64,
) -> [[f64; 3]; 4] {
    let (h, w) = frame_shape;
    geometry::corner_values(x_axis.extent(w), y_axis.extent(h), corner_fraction)
}
