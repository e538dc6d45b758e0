//! Satispay CSV converter - offline conversion of an export file.

use clap::Parser;
use std::fs::File;
use std::io::{self, Read, Write};
use satispay_csv_bot::{conversion::transform, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "satispay_convert")]
#[command(about = "Convert a Satispay CSV export for budget tools", long_about = None)]
struct Cli {
    /// Input file path (or stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Output file path (or stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    // stdout may carry the converted file, keep logs on stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut input: Box<dyn Read> = match cli.input {
        Some(ref path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };

    // Convert into memory first so a failed run never creates the output file
    let mut converted = Vec::new();
    transform(&mut input, &mut converted)?;

    if let Some(ref output_path) = cli.output {
        let mut file = File::create(output_path)?;
        file.write_all(&converted)?;
        info!(path = %output_path, bytes = converted.len(), "wrote converted file");
    } else {
        let mut stdout = io::stdout();
        stdout.write_all(&converted)?;
        stdout.flush()?;
    }

    Ok(())
}
