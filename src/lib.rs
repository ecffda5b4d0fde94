// src/lib.rs
// ============================================================================
// NPY-TASM - Conversor de .npy a fragmentos ntt (.tasm) + sidecar binario
// ============================================================================

pub mod npy;
pub mod tasm;
pub mod sidecar;
pub mod builder;

// Re-exports principales
pub use npy::{Dtype, NpyArray, NpyError, write_npy};
pub use tasm::{Constructor, ConstructorStyle, render_literal, render_statement};
pub use sidecar::{Sidecar, SidecarError, SidecarHeader};
pub use builder::{convert, derive_symbol, ConvertOptions, ConvertReport};
