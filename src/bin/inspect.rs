// src/bin/inspect.rs
// ============================================================================
// SIDECAR INSPECTOR - Inspecciona archivos .bin generados por npy-tasm
// ============================================================================
//
// Uso:
//   npy-inspect w.bin
//   npy-inspect w.bin --dtype f4 --to-npy w.npy
//
// ============================================================================

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use xxhash_rust::xxh3::xxh3_64;

use npy_tasm::{write_npy, Dtype, Sidecar, SidecarHeader};

#[derive(Parser)]
#[command(name = "npy-inspect")]
#[command(about = "Inspect a .bin tensor sidecar")]
struct Args {
    /// Sidecar file to inspect
    file: PathBuf,

    /// Element type of the payload (f4, float32, i8, ...)
    #[arg(long)]
    dtype: Option<String>,

    /// Rebuild the array and write it as .npy (requires --dtype)
    #[arg(long, requires = "dtype")]
    to_npy: Option<PathBuf>,
}

fn format_size(size: u64) -> String {
    if size == 0 {
        "empty".to_string()
    } else if size < 1024 {
        format!("{} B", size)
    } else if size < 1024 * 1024 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / 1024.0 / 1024.0)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let data = Sidecar::read_file(&args.file)?;
    let header = SidecarHeader::read(&data)
        .with_context(|| format!("Cannot read sidecar header of {}", args.file.display()))?;
    let payload = &data[header.size()..];
    let numel = header
        .numel()
        .ok_or_else(|| anyhow!("Sidecar shape {:?} overflows the element count", header.shape))?;

    println!("═══════════════════════════════════════════════════════════════");
    println!("  SIDECAR: {}", args.file.display());
    println!("═══════════════════════════════════════════════════════════════");
    println!("  File size:   {}", format_size(data.len() as u64));
    println!("  Rank:        {}", header.rank());
    for (axis, extent) in header.shape.iter().enumerate() {
        println!("    dim[{}]:   {}", axis, extent);
    }
    println!("  Elements:    {}", numel);
    println!("  Payload:     {} ({} bytes)", format_size(payload.len() as u64), payload.len());

    // Ancho implícito: payload / elementos
    if numel > 0 && payload.len() % numel == 0 {
        let width = payload.len() / numel;
        let candidates: Vec<String> = Dtype::ALL
            .iter()
            .filter(|d| d.itemsize() == width)
            .map(|d| d.to_string())
            .collect();
        println!("  Item size:   {} bytes ({})", width, candidates.join(" | "));
    } else if numel > 0 {
        println!("  Item size:   ⚠ payload not a multiple of element count");
    }

    println!("  XXH3-64:     {:016x}", xxh3_64(payload));

    if let Some(dtype_str) = &args.dtype {
        let dtype = Dtype::from_str(dtype_str)
            .ok_or_else(|| anyhow!("Invalid dtype: {}", dtype_str))?;
        let array = Sidecar::decode(&data, dtype)
            .with_context(|| format!("{} is not a valid {} sidecar", args.file.display(), dtype))?;

        let preview: Vec<String> = (0..array.numel().min(8))
            .map(|i| dtype.format_element(array.element(i)))
            .collect();
        println!("  First:       [{}{}]", preview.join(", "), if array.numel() > 8 { ", ..." } else { "" });

        if let Some(out) = &args.to_npy {
            write_npy(out, &array)?;
            println!("  ✓ Wrote {}", out.display());
        }
    }

    println!("═══════════════════════════════════════════════════════════════");
    Ok(())
}
