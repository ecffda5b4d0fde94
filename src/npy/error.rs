// src/npy/error.rs
// ============================================================================
// NPY ERRORS
// ============================================================================

use ndarray_npy::{ReadNpyError, WriteNpyError};
use thiserror::Error;

/// Fallos al leer/escribir un .npy
#[derive(Error, Debug)]
pub enum NpyError {
    #[error("failed to read .npy: {0}")]
    Read(#[from] ReadNpyError),

    #[error("failed to write .npy: {0}")]
    Write(#[from] WriteNpyError),

    #[error("unsupported dtype {0} (expected bool, int8-64, uint8-64, float32 or float64)")]
    UnsupportedDtype(String),

    #[error("empty file")]
    Empty,

    #[error("shape {0:?} overflows the element count")]
    ShapeOverflow(Vec<usize>),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("data is {found} bytes, expected {expected}")]
    DataSize { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
