//! scandiff-core: per-frame numeric kernels for pixelated-detector analysis.
//!
//! Every function here operates on a single 2-D detector frame (or derives
//! frame-shaped geometry) and is a pure function of its inputs. The stages are:
//!
//! 1. **Geometry**: radial extents, pixel angles, angular sector masks,
//!    calibrated corner samples.
//! 2. **Frame**: thresholding, disk masking, intensity-weighted centroids,
//!    bilinear sub-pixel sampling, frame shifts and rotation.
//! 3. **Radial**: per-frame radial mean and median profiles (integer pixel bins).
//! 4. **Defect**: median filtering, hot/dead pixel flagging, neighbor
//!    interpolation of flagged pixels.
//!
//! Execution policy (eager arrays vs chunked deferred evaluation) lives in the
//! `scandiff` crate; keeping these kernels free of it is what makes the same
//! numerics valid in both modes.

pub mod defect;
pub mod frame;
pub mod geometry;
pub mod radial;
