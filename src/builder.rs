// src/builder.rs
// ============================================================================
// BUILDER - Pipeline de conversión .npy → .tasm (+ .bin)
// ============================================================================
//
// Lineal, sin recuperación:
//   1. Cargar .npy (fallo aquí = no se escribe nada)
//   2. Seleccionar constructor (rank o toggle)
//   3. Renderizar literal + plantilla → <name>.tasm
//   4. Sidecar opcional → <name>.bin
//
// Si falla el .bin, el .tasm ya escrito se queda.
//
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::npy::{Dtype, NpyArray};
use crate::sidecar::{Sidecar, BIN_EXT};
use crate::tasm::{self, Constructor, ConstructorStyle, TASM_EXT};

/// Opciones de una conversión
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Símbolo destino; None = derivado del nombre del input
    pub symbol: Option<String>,
    pub style: ConstructorStyle,
    pub out_dir: PathBuf,
    pub write_bin: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            symbol: None,
            style: ConstructorStyle::Tensor,
            out_dir: PathBuf::from("."),
            write_bin: true,
        }
    }
}

/// Resumen de lo que se escribió
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub input: PathBuf,
    pub symbol: String,
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub rank: usize,
    pub numel: usize,
    pub constructor: Constructor,
    pub tasm_path: PathBuf,
    pub tasm_bytes: u64,
    pub bin_path: Option<PathBuf>,
    pub bin_bytes: Option<u64>,
}

/// "weights/fc1_weight.npy" → "fc1_weight"
///
/// Corta en el primer '.', así "a.b.npy" → "a".
pub fn derive_symbol(input: &Path) -> Result<String> {
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Cannot derive a symbol name from {}", input.display()))?;

    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        anyhow::bail!("Cannot derive a symbol name from {}", input.display());
    }
    Ok(stem.to_string())
}

/// Ejecuta la conversión completa
pub fn convert(input: &Path, options: &ConvertOptions) -> Result<ConvertReport> {
    let symbol = match &options.symbol {
        Some(s) => s.clone(),
        None => derive_symbol(input)?,
    };

    if !tasm::is_valid_identifier(&symbol) {
        log::warn!("'{}' is not a valid C++ identifier; the .tasm will not compile as-is", symbol);
    }

    // 1. Cargar
    let array = NpyArray::open(input)?;
    log::info!(
        "Loaded {} ({}, shape {:?})",
        input.display(),
        array.dtype(),
        array.shape()
    );

    // 2-3. Renderizar
    let constructor = Constructor::select(options.style, array.rank());
    let literal = tasm::render_literal(&array);
    let text = tasm::render_statement(&symbol, constructor, &literal);
    log::debug!("constructor={} literal_len={}", constructor, literal.len());

    let tasm_path = options.out_dir.join(format!("{}.{}", symbol, TASM_EXT));
    fs::write(&tasm_path, &text)
        .with_context(|| format!("Cannot write {}", tasm_path.display()))?;
    log::info!("Wrote {} ({} bytes)", tasm_path.display(), text.len());

    // 4. Sidecar
    let (bin_path, bin_bytes) = if options.write_bin {
        let path = options.out_dir.join(format!("{}.{}", symbol, BIN_EXT));
        let size = Sidecar::write(&path, &array)?;
        log::info!("Wrote {} ({} bytes)", path.display(), size);
        (Some(path), Some(size))
    } else {
        (None, None)
    };

    Ok(ConvertReport {
        input: input.to_path_buf(),
        symbol,
        dtype: array.dtype(),
        shape: array.shape().to_vec(),
        rank: array.rank(),
        numel: array.numel(),
        constructor,
        tasm_path,
        tasm_bytes: text.len() as u64,
        bin_path,
        bin_bytes,
    })
}
