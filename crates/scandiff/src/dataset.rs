//! N-D scanning dataset with trailing 2-D detector frames.
//!
//! A dataset is 0 to 3 navigation axes followed by exactly two signal axes
//! `(h, w)`. Internally the navigation axes are flattened row-major into a
//! frame stack; the navigation shape is kept alongside so results can be
//! folded back to the caller's layout.
//!
//! Two representations share one public API:
//! 1. eager, a frame stack held in memory and processed immediately;
//! 2. deferred, a chunked [`FrameSource`] processed only on materialize.

use std::sync::Arc;

use log::debug;
use ndarray::{Array2, Array3, ArrayD, ArrayView3, Axis, IxDyn};
use rayon::prelude::*;

use crate::axes::AxisDescriptor;
use crate::error::{Error, Result};
use crate::exec::{FrameSource, InMemorySource};

/// Scanning-diffraction dataset: navigation axes over detector frames.
pub struct Dataset {
    repr: Repr,
    sig_axes: [AxisDescriptor; 2],
}

enum Repr {
    Eager {
        frames: Array3<f64>,
        nav_shape: Vec<usize>,
    },
    Deferred(Arc<dyn FrameSource>),
}

impl Dataset {
    /// Wrap an owned array. The last two dimensions are the signal axes;
    /// anything before them is navigation.
    pub fn from_array(data: ArrayD<f64>) -> Result<Self> {
        let ndim = data.ndim();
        if ndim < 2 {
            return Err(Error::SignalRank { ndim });
        }
        let shape = data.shape().to_vec();
        let (nav_shape, signal) = shape.split_at(ndim - 2);
        let (h, w) = (signal[0], signal[1]);
        let n: usize = nav_shape.iter().product();
        let data = data.as_standard_layout();
        let frames = Array3::from_shape_vec((n, h, w), data.iter().copied().collect())
            .expect("row-major flattening preserves the element count");
        Ok(Self {
            repr: Repr::Eager {
                frames,
                nav_shape: nav_shape.to_vec(),
            },
            sig_axes: [AxisDescriptor::pixels(), AxisDescriptor::pixels()],
        })
    }

    /// Wrap a single frame (empty navigation shape).
    pub fn from_frame(frame: Array2<f64>) -> Self {
        let (h, w) = frame.dim();
        let frames = frame
            .into_shape_with_order((1, h, w))
            .expect("adding a unit leading axis cannot fail");
        Self {
            repr: Repr::Eager {
                frames,
                nav_shape: Vec::new(),
            },
            sig_axes: [AxisDescriptor::pixels(), AxisDescriptor::pixels()],
        }
    }

    /// Wrap an external chunked source as a deferred dataset.
    pub fn from_source(source: Arc<dyn FrameSource>) -> Self {
        Self::from_source_with_axes(source, [AxisDescriptor::pixels(), AxisDescriptor::pixels()])
    }

    pub(crate) fn from_source_with_axes(
        source: Arc<dyn FrameSource>,
        sig_axes: [AxisDescriptor; 2],
    ) -> Self {
        Self {
            repr: Repr::Deferred(source),
            sig_axes,
        }
    }

    pub(crate) fn from_parts(
        frames: Array3<f64>,
        nav_shape: Vec<usize>,
        sig_axes: [AxisDescriptor; 2],
    ) -> Self {
        Self {
            repr: Repr::Eager { frames, nav_shape },
            sig_axes,
        }
    }

    /// Attach signal-axis calibration `(x, y)`.
    pub fn with_signal_axes(mut self, x: AxisDescriptor, y: AxisDescriptor) -> Self {
        self.sig_axes = [x, y];
        self
    }

    /// Signal-axis calibration as `[x, y]`.
    pub fn signal_axes(&self) -> &[AxisDescriptor; 2] {
        &self.sig_axes
    }

    pub fn nav_shape(&self) -> &[usize] {
        match &self.repr {
            Repr::Eager { nav_shape, .. } => nav_shape,
            Repr::Deferred(source) => source.nav_shape(),
        }
    }

    /// Signal shape `(h, w)`.
    pub fn frame_shape(&self) -> (usize, usize) {
        match &self.repr {
            Repr::Eager { frames, .. } => {
                let (_, h, w) = frames.dim();
                (h, w)
            }
            Repr::Deferred(source) => source.frame_shape(),
        }
    }

    /// Total number of navigation positions (1 for a single frame).
    pub fn n_positions(&self) -> usize {
        self.nav_shape().iter().product()
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.repr, Repr::Deferred(_))
    }

    /// Convert to the deferred representation with `chunk_positions`
    /// navigation positions per chunk. Already-deferred datasets keep their
    /// chunking.
    pub fn into_deferred(self, chunk_positions: usize) -> Result<Self> {
        if chunk_positions == 0 {
            return Err(Error::ParameterRange {
                name: "chunk_positions",
                value: 0.0,
                range: ">= 1",
            });
        }
        match self.repr {
            Repr::Deferred(_) => Ok(self),
            Repr::Eager { frames, nav_shape } => {
                debug!(
                    "deferring {} position(s) in chunks of {}",
                    nav_shape.iter().product::<usize>(),
                    chunk_positions
                );
                let source: Arc<dyn FrameSource> =
                    Arc::new(InMemorySource::new(frames, nav_shape, chunk_positions));
                Ok(Self {
                    repr: Repr::Deferred(source),
                    sig_axes: self.sig_axes,
                })
            }
        }
    }

    /// Load every chunk and return an eager dataset. Eager inputs are
    /// returned unchanged.
    pub fn materialize(self) -> Self {
        let source = match self.repr {
            Repr::Eager { .. } => return self,
            Repr::Deferred(source) => source,
        };
        let (h, w) = source.frame_shape();
        let nav_shape = source.nav_shape().to_vec();
        let n_chunks = source.n_chunks();
        debug!("materializing deferred dataset from {n_chunks} chunk(s)");
        let chunks: Vec<Array3<f64>> = (0..n_chunks)
            .into_par_iter()
            .map(|c| source.load_chunk(c))
            .collect();
        let mut flat = Vec::with_capacity(source.n_positions() * h * w);
        for chunk in chunks {
            flat.extend(chunk.iter().copied());
        }
        let frames = Array3::from_shape_vec((source.n_positions(), h, w), flat)
            .expect("chunk ranges tile the navigation space exactly");
        Self {
            repr: Repr::Eager { frames, nav_shape },
            sig_axes: self.sig_axes,
        }
    }

    /// Copy out the full array in the caller's layout (navigation shape plus
    /// signal shape). Deferred datasets are evaluated.
    pub fn to_array(&self) -> ArrayD<f64> {
        let (h, w) = self.frame_shape();
        let mut shape = self.nav_shape().to_vec();
        shape.extend_from_slice(&[h, w]);
        let flat: Vec<f64> = match &self.repr {
            Repr::Eager { frames, .. } => frames.iter().copied().collect(),
            Repr::Deferred(source) => {
                let mut flat = Vec::with_capacity(source.n_positions() * h * w);
                for c in 0..source.n_chunks() {
                    flat.extend(source.load_chunk(c).iter().copied());
                }
                flat
            }
        };
        ArrayD::from_shape_vec(IxDyn(&shape), flat)
            .expect("frame stack length matches the dataset shape")
    }

    /// Frame at a flat navigation index, copied out. Evaluates one chunk for
    /// deferred datasets.
    pub fn frame_at(&self, flat_index: usize) -> Array2<f64> {
        match &self.repr {
            Repr::Eager { frames, .. } => frames.index_axis(Axis(0), flat_index).to_owned(),
            Repr::Deferred(source) => {
                // Chunk lengths are source-defined, so locate by range scan.
                let c = (0..source.n_chunks())
                    .find(|&c| source.chunk_range(c).contains(&flat_index))
                    .expect("flat_index within navigation space");
                let local = flat_index - source.chunk_range(c).start;
                source.load_chunk(c).index_axis(Axis(0), local).to_owned()
            }
        }
    }

    pub(crate) fn deferred_source(&self) -> Option<&Arc<dyn FrameSource>> {
        match &self.repr {
            Repr::Deferred(source) => Some(source),
            Repr::Eager { .. } => None,
        }
    }

    pub(crate) fn eager_frames(&self) -> (ArrayView3<'_, f64>, &[usize]) {
        match &self.repr {
            Repr::Eager { frames, nav_shape } => (frames.view(), nav_shape),
            Repr::Deferred(_) => unreachable!("checked deferred_source before taking eager frames"),
        }
    }
}

impl Clone for Dataset {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Eager { frames, nav_shape } => Repr::Eager {
                frames: frames.clone(),
                nav_shape: nav_shape.clone(),
            },
            Repr::Deferred(source) => Repr::Deferred(Arc::clone(source)),
        };
        Self {
            repr,
            sig_axes: self.sig_axes.clone(),
        }
    }
}
