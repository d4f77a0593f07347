//! Execution adapter: one map/fold primitive over two interchangeable
//! backends.
//!
//! Every numeric operation in this crate reduces to either
//! [`map_frames`] (per-navigation-position kernel, embarrassingly parallel)
//! or [`fold_frames`] (associative combine across navigation). The eager
//! backend runs the kernel immediately; the deferred backend captures it in a
//! [`ReductionPlan`] node that is only evaluated, chunk by chunk, when the
//! caller asks for [`Reduced::materialize`]. Both paths run the identical
//! kernel in the identical per-frame order, so their results agree
//! bit-for-bit.
//!
//! The adapter never assumes a particular chunk shape: chunks are opaque
//! ranges of the flattened navigation index space supplied by a
//! [`FrameSource`].

use std::ops::Range;
use std::sync::Arc;

use log::{debug, trace};
use ndarray::{Array2, Array3, ArrayD, ArrayView2, Axis, IxDyn};
use rayon::prelude::*;

use crate::dataset::Dataset;

/// Chunked supplier of detector frames over the flattened navigation index
/// space.
///
/// Implementations must be pure: `load_chunk` called twice with the same
/// index returns the same frames. That is what allows a deferred graph to be
/// evaluated at any later time, in any chunk order.
pub trait FrameSource: Send + Sync {
    /// Navigation shape (may be empty for a single frame).
    fn nav_shape(&self) -> &[usize];
    /// Signal shape `(h, w)` shared by every frame.
    fn frame_shape(&self) -> (usize, usize);
    /// Number of chunks the navigation space is split into.
    fn n_chunks(&self) -> usize;
    /// Flat navigation positions covered by chunk `i`.
    fn chunk_range(&self, i: usize) -> Range<usize>;
    /// Frames of chunk `i` as a `(positions, h, w)` stack.
    fn load_chunk(&self, i: usize) -> Array3<f64>;

    /// Total number of navigation positions.
    fn n_positions(&self) -> usize {
        self.nav_shape().iter().product()
    }
}

/// Frame-to-frame transform applied per navigation position.
pub(crate) type FrameMapFn = dyn Fn(ArrayView2<f64>, usize) -> Array2<f64> + Send + Sync;

/// Eager in-memory source: a frame stack split into fixed-length runs of
/// navigation positions.
pub(crate) struct InMemorySource {
    frames: Array3<f64>,
    nav_shape: Vec<usize>,
    chunk_len: usize,
}

impl InMemorySource {
    pub(crate) fn new(frames: Array3<f64>, nav_shape: Vec<usize>, chunk_len: usize) -> Self {
        Self {
            frames,
            nav_shape,
            chunk_len,
        }
    }
}

impl FrameSource for InMemorySource {
    fn nav_shape(&self) -> &[usize] {
        &self.nav_shape
    }

    fn frame_shape(&self) -> (usize, usize) {
        let (_, h, w) = self.frames.dim();
        (h, w)
    }

    fn n_chunks(&self) -> usize {
        self.n_positions().div_ceil(self.chunk_len)
    }

    fn chunk_range(&self, i: usize) -> Range<usize> {
        let start = i * self.chunk_len;
        let end = (start + self.chunk_len).min(self.n_positions());
        start..end
    }

    fn load_chunk(&self, i: usize) -> Array3<f64> {
        let range = self.chunk_range(i);
        self.frames
            .slice_axis(Axis(0), ndarray::Slice::from(range))
            .to_owned()
    }
}

/// Deferred frame transform node: parent source with a per-frame map applied
/// on load. Chunk layout is inherited from the parent.
pub(crate) struct MappedSource {
    parent: Arc<dyn FrameSource>,
    op: Arc<FrameMapFn>,
}

impl MappedSource {
    pub(crate) fn new(parent: Arc<dyn FrameSource>, op: Arc<FrameMapFn>) -> Self {
        Self { parent, op }
    }
}

impl FrameSource for MappedSource {
    fn nav_shape(&self) -> &[usize] {
        self.parent.nav_shape()
    }

    fn frame_shape(&self) -> (usize, usize) {
        self.parent.frame_shape()
    }

    fn n_chunks(&self) -> usize {
        self.parent.n_chunks()
    }

    fn chunk_range(&self, i: usize) -> Range<usize> {
        self.parent.chunk_range(i)
    }

    fn load_chunk(&self, i: usize) -> Array3<f64> {
        let frames = self.parent.load_chunk(i);
        let (n_local, h, w) = frames.dim();
        trace!("applying deferred frame map to chunk {i} ({n_local} frame(s))");
        let mut out = Array3::zeros((n_local, h, w));
        for (local, global) in self.chunk_range(i).enumerate() {
            let mapped = (self.op)(frames.index_axis(Axis(0), local), global);
            out.index_axis_mut(Axis(0), local).assign(&mapped);
        }
        out
    }
}

/// A reduction node of the deferred graph.
pub(crate) trait ReductionPlan<T>: Send + Sync {
    fn shape(&self) -> Vec<usize>;
    fn evaluate(&self) -> ArrayD<T>;
}

/// Result of a reduction: already materialized (eager input) or a deferred
/// node awaiting an explicit [`Reduced::materialize`] call.
pub enum Reduced<T> {
    Materialized(ArrayD<T>),
    Deferred(DeferredReduction<T>),
}

/// Handle to an unevaluated reduction over a chunked dataset.
pub struct DeferredReduction<T> {
    plan: Arc<dyn ReductionPlan<T>>,
}

impl<T> Clone for DeferredReduction<T> {
    fn clone(&self) -> Self {
        Self {
            plan: Arc::clone(&self.plan),
        }
    }
}

impl<T: Clone> Clone for Reduced<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Materialized(a) => Self::Materialized(a.clone()),
            Self::Deferred(d) => Self::Deferred(d.clone()),
        }
    }
}

impl<T> Reduced<T> {
    /// Whether this result still needs a materialize step.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Output shape (navigation shape plus the operation's trailing axes),
    /// known without evaluating anything.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Materialized(a) => a.shape().to_vec(),
            Self::Deferred(d) => d.plan.shape(),
        }
    }

    /// Evaluate (chunk-parallel for deferred inputs) and return the array.
    pub fn materialize(self) -> ArrayD<T> {
        match self {
            Self::Materialized(a) => a,
            Self::Deferred(d) => d.plan.evaluate(),
        }
    }
}

type MapKernel<T> = dyn Fn(ArrayView2<f64>, usize) -> ArrayD<T> + Send + Sync;

struct MapPlan<T> {
    source: Arc<dyn FrameSource>,
    kernel: Arc<MapKernel<T>>,
    suffix: Vec<usize>,
}

impl<T> MapPlan<T> {
    fn out_shape(&self) -> Vec<usize> {
        let mut shape = self.source.nav_shape().to_vec();
        shape.extend_from_slice(&self.suffix);
        shape
    }
}

impl<T: Clone + Send + Sync> ReductionPlan<T> for MapPlan<T> {
    fn shape(&self) -> Vec<usize> {
        self.out_shape()
    }

    fn evaluate(&self) -> ArrayD<T> {
        let n_chunks = self.source.n_chunks();
        let suffix_len: usize = self.suffix.iter().product();
        debug!(
            "materializing deferred map over {} position(s) in {} chunk(s)",
            self.source.n_positions(),
            n_chunks
        );
        let per_chunk: Vec<Vec<T>> = (0..n_chunks)
            .into_par_iter()
            .map(|c| {
                let frames = self.source.load_chunk(c);
                let mut buf = Vec::with_capacity(frames.len_of(Axis(0)) * suffix_len);
                for (local, global) in self.source.chunk_range(c).enumerate() {
                    let out = (self.kernel)(frames.index_axis(Axis(0), local), global);
                    buf.extend(out.iter().cloned());
                }
                buf
            })
            .collect();
        let mut flat = Vec::with_capacity(self.source.n_positions() * suffix_len);
        for buf in per_chunk {
            flat.extend(buf);
        }
        from_flat(self.out_shape(), flat)
    }
}

struct FoldPlan<T> {
    source: Arc<dyn FrameSource>,
    init: Array2<T>,
    step: Arc<dyn Fn(&mut Array2<T>, ArrayView2<f64>) + Send + Sync>,
    merge: Arc<dyn Fn(Array2<T>, Array2<T>) -> Array2<T> + Send + Sync>,
}

impl<T: Clone + Send + Sync> ReductionPlan<T> for FoldPlan<T> {
    fn shape(&self) -> Vec<usize> {
        let (h, w) = self.source.frame_shape();
        vec![h, w]
    }

    fn evaluate(&self) -> ArrayD<T> {
        let n_chunks = self.source.n_chunks();
        debug!("materializing deferred fold over {n_chunks} chunk(s)");
        let partials: Vec<Array2<T>> = (0..n_chunks)
            .into_par_iter()
            .map(|c| {
                let frames = self.source.load_chunk(c);
                let mut acc = self.init.clone();
                for local in 0..frames.len_of(Axis(0)) {
                    (self.step)(&mut acc, frames.index_axis(Axis(0), local));
                }
                acc
            })
            .collect();
        let folded = partials
            .into_iter()
            .fold(None, |acc: Option<Array2<T>>, part| match acc {
                None => Some(part),
                Some(a) => Some((self.merge)(a, part)),
            })
            .unwrap_or_else(|| self.init.clone());
        folded.into_dyn()
    }
}

/// Build an N-D array from a row-major flat buffer; the shapes are computed
/// from the same inputs, so the element count always matches.
fn from_flat<T>(shape: Vec<usize>, flat: Vec<T>) -> ArrayD<T> {
    ArrayD::from_shape_vec(IxDyn(&shape), flat)
        .expect("per-position kernel outputs match the planned shape")
}

/// Apply a per-position kernel producing `suffix`-shaped output per frame.
///
/// Eager datasets run the kernel immediately; deferred datasets get a graph
/// node. The kernel must be pure: its output may depend only on the frame and
/// the flat navigation index it is given.
pub(crate) fn map_frames<T, K>(ds: &Dataset, suffix: Vec<usize>, kernel: K) -> Reduced<T>
where
    T: Clone + Send + Sync + 'static,
    K: Fn(ArrayView2<f64>, usize) -> ArrayD<T> + Send + Sync + 'static,
{
    if let Some(source) = ds.deferred_source() {
        return Reduced::Deferred(DeferredReduction {
            plan: Arc::new(MapPlan {
                source: Arc::clone(source),
                kernel: Arc::new(kernel),
                suffix,
            }),
        });
    }
    let (frames, nav_shape) = ds.eager_frames();
    let suffix_len: usize = suffix.iter().product();
    let n = frames.len_of(Axis(0));
    let mut flat = Vec::with_capacity(n * suffix_len);
    for i in 0..n {
        let out = kernel(frames.index_axis(Axis(0), i), i);
        flat.extend(out.iter().cloned());
    }
    let mut shape = nav_shape.to_vec();
    shape.extend_from_slice(&suffix);
    Reduced::Materialized(from_flat(shape, flat))
}

/// Fold every frame into one frame-shaped accumulator.
///
/// `step` folds one frame into a chunk-local accumulator; `merge` combines
/// two accumulators and must be associative so chunks can be reduced in any
/// grouping (evaluation still merges in chunk order for determinism).
pub(crate) fn fold_frames<T, F, M>(ds: &Dataset, init: Array2<T>, step: F, merge: M) -> Reduced<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&mut Array2<T>, ArrayView2<f64>) + Send + Sync + 'static,
    M: Fn(Array2<T>, Array2<T>) -> Array2<T> + Send + Sync + 'static,
{
    if let Some(source) = ds.deferred_source() {
        return Reduced::Deferred(DeferredReduction {
            plan: Arc::new(FoldPlan {
                source: Arc::clone(source),
                init,
                step: Arc::new(step),
                merge: Arc::new(merge),
            }),
        });
    }
    let (frames, _) = ds.eager_frames();
    let mut acc = init;
    for i in 0..frames.len_of(Axis(0)) {
        step(&mut acc, frames.index_axis(Axis(0), i));
    }
    Reduced::Materialized(acc.into_dyn())
}

/// Apply a frame-to-frame transform, keeping the input's execution mode.
pub(crate) fn map_dataset(ds: &Dataset, op: Arc<FrameMapFn>) -> Dataset {
    if let Some(source) = ds.deferred_source() {
        let mapped: Arc<dyn FrameSource> = Arc::new(MappedSource::new(Arc::clone(source), op));
        return Dataset::from_source_with_axes(mapped, ds.signal_axes().clone());
    }
    let (frames, nav_shape) = ds.eager_frames();
    let (n, h, w) = frames.dim();
    let mut out = Array3::zeros((n, h, w));
    for i in 0..n {
        out.index_axis_mut(Axis(0), i)
            .assign(&op(frames.index_axis(Axis(0), i), i));
    }
    Dataset::from_parts(out, nav_shape.to_vec(), ds.signal_axes().clone())
}
