//! Radial and angular-slice integration of diffraction frames.

use std::f64::consts::TAU;
use std::sync::Arc;

use ndarray::{Array2, ArrayD, ArrayView2, IxDyn};
use scandiff_core::{geometry, radial};

use crate::centre::Centre;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::exec::{self, Reduced};
use crate::mask::Mask;
use crate::ops::{resolve_centre, resolve_mask, CentreLookup};

/// Parameters for [`Dataset::angular_slice_radial_integration`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AngularSliceConfig {
    /// Number of equal angular slices the full circle is split into.
    pub angle_n: usize,
    /// Fractional widening of each slice into its neighbours, in units of
    /// the slice width. Must lie in `[0, 1)`.
    pub slice_overlap: f64,
}

impl Default for AngularSliceConfig {
    fn default() -> Self {
        Self {
            angle_n: 20,
            slice_overlap: 0.0,
        }
    }
}

/// Angular bounds of slice `k`, widened symmetrically by `overlap`.
fn slice_bounds(k: usize, angle_n: usize, overlap: f64) -> (f64, f64) {
    let step = TAU / angle_n as f64;
    (
        k as f64 * step - overlap * step,
        (k + 1) as f64 * step + overlap * step,
    )
}

/// Number of radial bins needed to cover every pixel from every centre.
fn profile_bins(frame_shape: (usize, usize), centres: &CentreLookup) -> usize {
    let (h, w) = frame_shape;
    let (cx_min, cx_max, cy_min, cy_max) = centres.bounds();
    geometry::longest_distance(w, h, cx_min, cx_max, cy_min, cy_max) + 1
}

/// Exclusion mask for one slice: pixels outside the sector, or excluded by
/// the caller's mask.
fn slice_exclusion(
    sector_excluded: &Array2<bool>,
    user: Option<ArrayView2<'_, bool>>,
) -> Option<Array2<bool>> {
    user.map(|u| {
        let mut combined = sector_excluded.clone();
        combined.zip_mut_with(&u, |s, &m| *s = *s || m);
        combined
    })
}

impl Dataset {
    /// Mean intensity per integer radial distance bin, per navigation
    /// position.
    ///
    /// Pixel radius is `floor(hypot(px - cx, py - cy))`. The profile is long
    /// enough to hold the farthest frame corner from any centre, so its
    /// length is shared across positions even when centres vary; bins beyond
    /// a position's own reach, and bins with no pixels, hold 0.
    pub fn radial_integration(
        &self,
        centre: Option<&Centre>,
        mask: Option<&Mask>,
    ) -> Result<Reduced<f64>> {
        let centres = resolve_centre(self, centre)?;
        let lookup = resolve_mask(self, mask)?;
        let n_bins = profile_bins(self.frame_shape(), &centres);
        Ok(exec::map_frames(self, vec![n_bins], move |f, i| {
            let (cx, cy) = centres.at(i);
            radial::radial_mean_profile(f, cx, cy, n_bins, lookup.frame(i)).into_dyn()
        }))
    }

    /// Radial integration restricted to `angle_n` angular slices of the
    /// circle, yielding trailing axes `[angle_n, n_bins]`.
    ///
    /// Angles follow `atan2(py - cy, px - cx)` wrapped into `[0, 2π)`, so
    /// slice 0 starts along +x and slices advance with increasing row index.
    /// `slice_overlap` widens each slice into both neighbours; with
    /// `angle_n = 1` the single slice covers the full circle and the result
    /// equals [`Dataset::radial_integration`].
    pub fn angular_slice_radial_integration(
        &self,
        cfg: &AngularSliceConfig,
        centre: Option<&Centre>,
        mask: Option<&Mask>,
    ) -> Result<Reduced<f64>> {
        if cfg.angle_n == 0 {
            return Err(Error::ParameterRange {
                name: "angle_n",
                value: 0.0,
                range: ">= 1",
            });
        }
        if !(0.0..1.0).contains(&cfg.slice_overlap) {
            return Err(Error::ParameterRange {
                name: "slice_overlap",
                value: cfg.slice_overlap,
                range: "[0, 1)",
            });
        }
        let centres = resolve_centre(self, centre)?;
        let lookup = resolve_mask(self, mask)?;
        let (h, w) = self.frame_shape();
        let n_bins = profile_bins((h, w), &centres);
        let angle_n = cfg.angle_n;
        let overlap = cfg.slice_overlap;

        // With one shared centre the sector geometry is position-independent
        // and worth precomputing once.
        let fixed_sectors: Option<Arc<Vec<Array2<bool>>>> = match &centres {
            CentreLookup::Fixed(cx, cy) => {
                let (cx, cy) = (*cx, *cy);
                Some(Arc::new(
                    (0..angle_n)
                        .map(|k| {
                            let (a0, a1) = slice_bounds(k, angle_n, overlap);
                            geometry::sector_mask_frame(h, w, a0, a1, cx, cy)
                                .mapv(|inside| !inside)
                        })
                        .collect(),
                ))
            }
            CentreLookup::Per(..) => None,
        };

        Ok(exec::map_frames(
            self,
            vec![angle_n, n_bins],
            move |f, i| {
                let (cx, cy) = centres.at(i);
                let user = lookup.frame(i);
                let mut flat = Vec::with_capacity(angle_n * n_bins);
                for k in 0..angle_n {
                    let sector_excluded = match &fixed_sectors {
                        Some(sectors) => sectors[k].clone(),
                        None => {
                            let (a0, a1) = slice_bounds(k, angle_n, overlap);
                            geometry::sector_mask_frame(h, w, a0, a1, cx, cy)
                                .mapv(|inside| !inside)
                        }
                    };
                    let profile = match slice_exclusion(&sector_excluded, user) {
                        Some(combined) => radial::radial_mean_profile(
                            f,
                            cx,
                            cy,
                            n_bins,
                            Some(combined.view()),
                        ),
                        None => radial::radial_mean_profile(
                            f,
                            cx,
                            cy,
                            n_bins,
                            Some(sector_excluded.view()),
                        ),
                    };
                    flat.extend(profile.iter().copied());
                }
                ArrayD::from_shape_vec(IxDyn(&[angle_n, n_bins]), flat)
                    .expect("one profile of n_bins values per slice")
            },
        ))
    }

    /// Boolean selection (`true` = inside) of the angular sector
    /// `[angle0, angle1)` around the centre, over the full dataset shape.
    ///
    /// The interval may extend past 2π to wrap across the +x axis; a width
    /// of 2π or more selects everything, a non-positive width nothing. The
    /// result inverts into an exclusion mask via [`Mask::keep_only`].
    pub fn angular_mask(
        &self,
        angle0: f64,
        angle1: f64,
        centre: Option<&Centre>,
    ) -> Result<ArrayD<bool>> {
        let centres = resolve_centre(self, centre)?;
        let (h, w) = self.frame_shape();
        let mut shape = self.nav_shape().to_vec();
        shape.extend_from_slice(&[h, w]);
        let n = self.n_positions();
        let flat: Vec<bool> = match &centres {
            CentreLookup::Fixed(cx, cy) => {
                let frame = geometry::sector_mask_frame(h, w, angle0, angle1, *cx, *cy);
                let one: Vec<bool> = frame.iter().copied().collect();
                let mut flat = Vec::with_capacity(n * h * w);
                for _ in 0..n {
                    flat.extend_from_slice(&one);
                }
                flat
            }
            CentreLookup::Per(..) => {
                let mut flat = Vec::with_capacity(n * h * w);
                for i in 0..n {
                    let (cx, cy) = centres.at(i);
                    flat.extend(geometry::sector_mask_frame(h, w, angle0, angle1, cx, cy));
                }
                flat
            }
        };
        Ok(ArrayD::from_shape_vec(IxDyn(&shape), flat)
            .expect("one sector mask per navigation position"))
    }
}
