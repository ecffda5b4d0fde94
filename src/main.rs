// src/main.rs
// ============================================================================
// NPY-TASM CLI
// ============================================================================
//
// Uso:
//   npy-tasm fc1_weight.npy                 → fc1_weight.tasm + fc1_weight.bin
//   npy-tasm fc1_weight.npy w1              → w1.tasm + w1.bin
//   npy-tasm fc1_weight.npy w1 --rows       → ntt::Matrix::create_from_vector_vector
//   npy-tasm fc1_weight.npy w1 -o out/ --no-bin
//
// ============================================================================

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use npy_tasm::{convert, ConstructorStyle, ConvertOptions};

#[derive(Parser, Debug)]
#[command(name = "npy-tasm")]
#[command(about = "Convert a NumPy .npy array into an ntt tensor fragment (.tasm) and binary sidecar (.bin)")]
#[command(version)]
struct Args {
    /// Input .npy file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output symbol name (default: input file name up to the first '.')
    #[arg(value_name = "NAME")]
    name: Option<String>,

    /// Row-wise constructor: ntt::Matrix::create_from_vector_vector
    #[arg(short, long, conflicts_with = "matrix")]
    rows: bool,

    /// Element-wise constructor: ntt::Matrix::create_from_vector
    #[arg(short, long)]
    matrix: bool,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Do not write the .bin sidecar
    #[arg(long)]
    no_bin: bool,

    /// Print a JSON report to stdout
    #[arg(long)]
    report: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let start = Instant::now();

    let style = if args.rows {
        ConstructorStyle::Matrix { rows: true }
    } else if args.matrix {
        ConstructorStyle::Matrix { rows: false }
    } else {
        ConstructorStyle::Tensor
    };

    let options = ConvertOptions {
        symbol: args.name.clone(),
        style,
        out_dir: args.out_dir.clone(),
        write_bin: !args.no_bin,
    };

    let report = convert(&args.input, &options)?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("  {} → {}", args.input.display(), report.symbol);
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Dtype:       {}", report.dtype);
    println!("  Shape:       {:?} (rank {})", report.shape, report.rank);
    println!("  Constructor: {}", report.constructor);
    println!("  TASM:        {} ({} bytes)", report.tasm_path.display(), report.tasm_bytes);
    match (&report.bin_path, report.bin_bytes) {
        (Some(path), Some(size)) => println!("  BIN:         {} ({} bytes)", path.display(), size),
        _ => println!("  BIN:         skipped"),
    }
    println!("  Time:        {:.1} ms", start.elapsed().as_secs_f64() * 1000.0);
    println!("═══════════════════════════════════════════════════════════════");

    Ok(())
}
