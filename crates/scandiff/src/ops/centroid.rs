//! Centre-of-mass analysis and its frame preprocessing.

use std::sync::Arc;

use ndarray::{arr1, ArrayView2};
use scandiff_core::frame::{self, FrameFilter};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::exec::{self, Reduced};
use crate::mask::{DiskMask, Mask};
use crate::ops::resolve_mask;

impl Dataset {
    /// Intensity-weighted centre of mass per navigation position.
    ///
    /// The result has one trailing axis of length 2 holding `[x, y]` in
    /// signal-pixel coordinates. Pixels can be excluded three ways, applied
    /// together: an absolute intensity `threshold` (pixels strictly below it
    /// contribute nothing), a `disk` keeping only pixels inside it, and an
    /// exclusion `mask`. A position whose surviving mass is zero yields
    /// `[NaN, NaN]`.
    pub fn center_of_mass(
        &self,
        threshold: Option<f64>,
        disk: Option<DiskMask>,
        mask: Option<&Mask>,
    ) -> Result<Reduced<f64>> {
        if let Some(d) = disk {
            d.validate()?;
        }
        let lookup = resolve_mask(self, mask)?;
        Ok(exec::map_frames(self, vec![2], move |f: ArrayView2<f64>, i| {
            let filter = FrameFilter {
                threshold,
                disk: disk.map(|d| (d.cx, d.cy, d.r)),
                excluded: lookup.frame(i),
            };
            let [x, y] = frame::centre_of_mass_frame(f, &filter);
            arr1(&[x, y]).into_dyn()
        }))
    }

    /// Zero out pixels below an absolute `threshold` and outside `disk`,
    /// preserving the values of surviving pixels.
    ///
    /// Eager datasets only; deferred inputs get [`Error::UnsupportedMode`].
    pub fn threshold_and_mask(
        &self,
        threshold: Option<f64>,
        disk: Option<DiskMask>,
    ) -> Result<Dataset> {
        if self.is_deferred() {
            return Err(Error::UnsupportedMode {
                op: "threshold_and_mask",
            });
        }
        if let Some(d) = disk {
            d.validate()?;
        }
        let disk_t = disk.map(|d| (d.cx, d.cy, d.r));
        Ok(exec::map_dataset(
            self,
            Arc::new(move |f: ArrayView2<f64>, _| {
                frame::threshold_and_mask_frame(f, threshold, disk_t)
            }),
        ))
    }
}
