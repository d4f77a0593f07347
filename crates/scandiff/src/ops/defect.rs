//! Detector defect detection and correction.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};
use scandiff_core::defect;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::exec::{self, Reduced};
use crate::mask::Mask;
use crate::ops::{resolve_mask, MaskLookup};

/// Parameters for [`Dataset::find_hot_pixels`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HotPixelConfig {
    /// A pixel is hot when its value exceeds the local 3x3 median times
    /// this factor. Raise it to tolerate more shot noise.
    pub threshold_multiplier: f64,
}

impl Default for HotPixelConfig {
    fn default() -> Self {
        Self {
            threshold_multiplier: 1.0,
        }
    }
}

/// Parameters for [`Dataset::find_dead_pixels`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DeadPixelConfig {
    /// Value a pixel must hold at every navigation position to count as
    /// dead.
    pub dead_value: f64,
}

impl Default for DeadPixelConfig {
    fn default() -> Self {
        Self { dead_value: 0.0 }
    }
}

impl Dataset {
    /// Flag pixels brighter than their local 3x3 median, per navigation
    /// position.
    ///
    /// The median window reflects at the frame border. Masked-out pixels are
    /// never flagged. The result has the dataset's shape with `bool`
    /// elements, `true` = hot.
    pub fn find_hot_pixels(
        &self,
        cfg: &HotPixelConfig,
        mask: Option<&Mask>,
    ) -> Result<Reduced<bool>> {
        let lookup = resolve_mask(self, mask)?;
        let (h, w) = self.frame_shape();
        let multiplier = cfg.threshold_multiplier;
        Ok(exec::map_frames(self, vec![h, w], move |f, i| {
            defect::hot_pixel_mask_frame(f, multiplier, lookup.frame(i)).into_dyn()
        }))
    }

    /// Flag pixels that hold `dead_value` at every navigation position.
    ///
    /// The result is one frame-shaped mask (`true` = dead) regardless of the
    /// navigation shape. A caller-supplied mask vetoes pixels: a pixel
    /// excluded at any position is never reported dead.
    pub fn find_dead_pixels(
        &self,
        cfg: &DeadPixelConfig,
        mask: Option<&Mask>,
    ) -> Result<Reduced<bool>> {
        let lookup = resolve_mask(self, mask)?;
        let (h, w) = self.frame_shape();
        // Fold a per-position mask down to one frame-shaped veto.
        let veto: Option<Array2<bool>> = match &lookup {
            MaskLookup::None => None,
            MaskLookup::Frame(m) => Some(m.as_ref().clone()),
            MaskLookup::Per(stack) => {
                let mut any = Array2::from_elem((h, w), false);
                for i in 0..stack.len_of(Axis(0)) {
                    any.zip_mut_with(&stack.index_axis(Axis(0), i), |a, &m| *a = *a || m);
                }
                Some(any)
            }
        };
        // Vetoed pixels start out as non-candidates, so the AND fold can
        // never flag them.
        let init = match veto {
            Some(v) => v.mapv(|excluded| !excluded),
            None => Array2::from_elem((h, w), true),
        };
        let dead_value = cfg.dead_value;
        Ok(exec::fold_frames(
            self,
            init,
            move |acc: &mut Array2<bool>, f: ArrayView2<f64>| {
                defect::dead_pixel_fold(acc, f, dead_value);
            },
            |mut a: Array2<bool>, b: Array2<bool>| {
                a.zip_mut_with(&b, |x, &y| *x = *x && y);
                a
            },
        ))
    }

    /// Replace flagged pixels with the mean of their unflagged neighbours in
    /// every frame.
    ///
    /// Cross neighbours are preferred; if all four are flagged the diagonals
    /// are used; a pixel with no unflagged neighbour at all keeps its value.
    /// The execution mode of the input is preserved.
    pub fn correct_bad_pixels(&self, defects: &Mask) -> Result<Dataset> {
        let lookup = resolve_mask(self, Some(defects))?;
        Ok(exec::map_dataset(
            self,
            Arc::new(move |f: ArrayView2<f64>, i| {
                match lookup.frame(i) {
                    Some(flagged) => defect::interpolate_bad_pixels(f, flagged),
                    None => f.to_owned(),
                }
            }),
        ))
    }
}
