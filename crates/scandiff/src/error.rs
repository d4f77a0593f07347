//! Error taxonomy for the engine.
//!
//! Shape and parameter problems are detected at call time, never deferred to
//! materialization. Unsupported-mode failures get their own variant so
//! callers can tell "fix your arguments" from "convert your input mode".

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A dataset needs two trailing signal dimensions.
    #[error("dataset must have at least 2 dimensions (signal H, W), got {ndim}")]
    SignalRank { ndim: usize },

    /// A per-position array (centre, mask, shift) does not match the
    /// dataset's navigation shape.
    #[error("{name} shape {actual:?} does not match navigation shape {expected:?}")]
    NavShapeMismatch {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A frame-shaped array does not match the dataset's signal shape.
    #[error("{name} shape {actual:?} does not match frame shape {expected:?}")]
    FrameShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A scalar parameter is outside its documented range.
    #[error("{name} = {value} is outside the valid range {range}")]
    ParameterRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    /// The operation is not available for the input's execution mode.
    #[error("{op} is not supported for deferred datasets; materialize the dataset first")]
    UnsupportedMode { op: &'static str },
}
