//! dmgrid CLI — command-line interface for the Data Matrix reader.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dmgrid::{find_spec, DecodeConfig, Decoder, PreprocessConfig, SYMBOL_SPECS};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "dmgrid")]
#[command(about = "Read Data Matrix (ECC200) barcodes from grayscale images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every readable symbol in an image.
    Decode {
        /// Path to the input image.
        #[arg(long)]
        image: PathBuf,

        /// Path to write results (JSON). Stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Start with reversed polarity (bright modules on dark).
        #[arg(long)]
        reversed: bool,

        /// Adaptive threshold block size for the first pass.
        #[arg(long, default_value = "25")]
        adaptive_block: u32,
    },

    /// Print the embedded ECC200 symbol size table.
    Symbols,

    /// Decode a corrected codeword stream for a given symbol size.
    DecodeWords {
        /// Symbol rows.
        #[arg(long)]
        rows: usize,

        /// Symbol columns.
        #[arg(long)]
        cols: usize,

        /// Comma-separated codeword bytes, data followed by checks.
        #[arg(long)]
        words: String,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            image,
            out,
            reversed,
            adaptive_block,
        } => run_decode(&image, out.as_deref(), reversed, adaptive_block),
        Commands::Symbols => run_symbols(),
        Commands::DecodeWords { rows, cols, words } => run_decode_words(rows, cols, &words),
    }
}

// ── decode ─────────────────────────────────────────────────────────────

fn run_decode(
    image: &std::path::Path,
    out: Option<&std::path::Path>,
    reversed: bool,
    adaptive_block: u32,
) -> CliResult<()> {
    let decoder = Decoder::with_config(DecodeConfig {
        preprocess: PreprocessConfig {
            reversed,
            adaptive_block,
            ..PreprocessConfig::default()
        },
    });
    let outcome = decoder.decode_file(image)?;

    for symbol in &outcome.symbols {
        println!(
            "{}x{}: {}",
            symbol.num_rows,
            symbol.num_cols,
            String::from_utf8_lossy(&symbol.payload)
        );
    }
    let json = serde_json::to_string_pretty(&outcome)?;
    match out {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    if outcome.success() {
        Ok(())
    } else {
        Err("no symbol decoded".into())
    }
}

// ── symbols ────────────────────────────────────────────────────────────

fn run_symbols() -> CliResult<()> {
    println!("dmgrid embedded ECC200 sizes");
    println!("  rows cols regions data-modules data-words check-words blocks");
    for s in &SYMBOL_SPECS {
        println!(
            "  {:>4} {:>4} {:>3}x{:<3} {:>5}x{:<5} {:>10} {:>11} {:>6}",
            s.num_rows,
            s.num_cols,
            s.region_rows,
            s.region_cols,
            s.data_rows,
            s.data_cols,
            s.data_words,
            s.error_words,
            s.rs_blocks
        );
    }
    Ok(())
}

// ── decode-words ───────────────────────────────────────────────────────

fn run_decode_words(rows: usize, cols: usize, words: &str) -> CliResult<()> {
    let spec = find_spec(rows, cols).ok_or("unsupported symbol size")?;
    let mut stream = words
        .split(',')
        .map(|w| w.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()?;
    if stream.len() != spec.total_words() {
        return Err(format!(
            "expected {} codewords for {}x{}, got {}",
            spec.total_words(),
            rows,
            cols,
            stream.len()
        )
        .into());
    }

    let correction = dmgrid::reed_solomon::correct(&mut stream, spec)?;
    tracing::info!("reed-solomon: {:?}", correction);
    let payload = dmgrid::payload::decode_payload(&stream, spec.data_words)?;
    println!("{}", String::from_utf8_lossy(&payload));
    Ok(())
}
