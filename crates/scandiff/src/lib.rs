//! Analysis engine for pixelated-detector scanning diffraction data.
//!
//! A [`Dataset`] holds up to three navigation axes of 2-D detector frames
//! and answers per-position questions about them. The pipeline for every
//! operation is the same:
//!
//! 1. validate shapes and parameters at call time;
//! 2. resolve centres and exclusion masks against the dataset;
//! 3. run a pure per-frame kernel, either eagerly or as a deferred plan
//!    over chunks of the navigation space.
//!
//! Eager and deferred execution share the kernels, so materializing a
//! deferred result reproduces the eager numbers exactly. Operations:
//!
//! * [`Dataset::center_of_mass`] and [`Dataset::threshold_and_mask`] for
//!   beam-position analysis;
//! * [`Dataset::radial_integration`] and
//!   [`Dataset::angular_slice_radial_integration`] for azimuthal profiles;
//! * [`Dataset::find_hot_pixels`], [`Dataset::find_dead_pixels`] and
//!   [`Dataset::correct_bad_pixels`] for detector defects;
//! * [`Dataset::virtual_bright_field`] and
//!   [`Dataset::virtual_annular_dark_field`] for virtual detector images;
//! * [`Dataset::flip_signal_x`], [`Dataset::flip_signal_y`],
//!   [`Dataset::rotate_signal`] and [`Dataset::shift_signal`] for
//!   signal-frame transforms;
//! * [`Dataset::subtract_background`] for background removal ahead of the
//!   reductions above.
//!
//! The per-frame numeric kernels live in the `scandiff-core` crate and are
//! usable on their own.

pub mod axes;
pub mod centre;
pub mod dataset;
pub mod error;
pub mod exec;
pub mod mask;
pub mod ops;

#[cfg(test)]
pub(crate) mod test_utils;

pub use axes::{corner_values, AxisDescriptor};
pub use centre::Centre;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use exec::{FrameSource, Reduced};
pub use mask::{AnnulusMask, DiskMask, Mask};
pub use ops::background::BackgroundMethod;
pub use ops::defect::{DeadPixelConfig, HotPixelConfig};
pub use ops::radial::AngularSliceConfig;
pub use ops::transform::FrameShift;
