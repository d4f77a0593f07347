//! Diffraction background subtraction.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use scandiff_core::{defect, geometry, radial};

use crate::centre::Centre;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::exec;
use crate::ops::resolve_centre;

/// Background estimate used by [`Dataset::subtract_background`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BackgroundMethod {
    /// Median filter of window half-width `footprint_radius` over each
    /// frame. Removes slowly varying backgrounds while features narrower
    /// than the window survive.
    MedianKernel { footprint_radius: usize },
    /// Median intensity of each integer-radius ring about the pattern
    /// centre. Removes any radially symmetric background, leaving only
    /// azimuthal structure.
    RadialMedian,
}

impl Dataset {
    /// Subtract an estimated background from every frame, clamping negative
    /// residuals to 0.
    ///
    /// `centre` is consumed by [`BackgroundMethod::RadialMedian`] only and
    /// follows the same default as the radial operations. The execution mode
    /// of the input is preserved.
    pub fn subtract_background(
        &self,
        method: BackgroundMethod,
        centre: Option<&Centre>,
    ) -> Result<Dataset> {
        match method {
            BackgroundMethod::MedianKernel { footprint_radius } => {
                if footprint_radius == 0 {
                    return Err(Error::ParameterRange {
                        name: "footprint_radius",
                        value: 0.0,
                        range: ">= 1",
                    });
                }
                Ok(exec::map_dataset(
                    self,
                    Arc::new(move |f: ArrayView2<f64>, _| {
                        let background = defect::median_filter(f, footprint_radius);
                        let mut out = f.to_owned();
                        out.zip_mut_with(&background, |v, &b| *v = (*v - b).max(0.0));
                        out
                    }),
                ))
            }
            BackgroundMethod::RadialMedian => {
                let centres = resolve_centre(self, centre)?;
                Ok(exec::map_dataset(
                    self,
                    Arc::new(move |f: ArrayView2<f64>, i| {
                        let (cx, cy) = centres.at(i);
                        let (h, w) = f.dim();
                        let n_bins = geometry::longest_distance(w, h, cx, cx, cy, cy) + 1;
                        let profile = radial::radial_median_profile(f, cx, cy, n_bins);
                        Array2::from_shape_fn((h, w), |(y, x)| {
                            let r = (x as f64 - cx).hypot(y as f64 - cy).floor() as usize;
                            (f[(y, x)] - profile[r]).max(0.0)
                        })
                    }),
                ))
            }
        }
    }
}
