//! J1 Assembler CLI - assembles `.s` files into hex images and listings.
//!
//! Usage:
//!     j1asm <file.s>... [-o DIR] [--no-listing] [-v]

use clap::Parser as ClapParser;
use j1_assembler::{assemble_files, write_outputs};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::Level;

#[derive(ClapParser, Debug)]
#[command(name = "j1asm")]
#[command(version)]
#[command(about = "Two-pass assembler for the J1 16-bit stack machine")]
struct Args {
    /// Assembly source files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (defaults to each input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not write the .lst listing
    #[arg(long = "no-listing")]
    no_listing: bool,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    if let Some(missing) = args.inputs.iter().find(|p| !p.is_file()) {
        eprintln!("Error: Input not found: {}", missing.display());
        return ExitCode::from(2);
    }

    let start = Instant::now();
    let mut has_errors = false;

    for (input, result) in assemble_files(&args.inputs) {
        let assembly = match result {
            Ok(assembly) => assembly,
            Err(e) => {
                eprintln!("{}: {}", input.display(), e);
                has_errors = true;
                continue;
            }
        };

        let output_dir = args.output.clone().unwrap_or_else(|| {
            input
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        match write_outputs(&input, &assembly, &output_dir, !args.no_listing) {
            Ok(hex_path) => {
                println!("{} -> {}", input.display(), hex_path.display());
            }
            Err(e) => {
                eprintln!("Error writing output for {}: {}", input.display(), e);
                has_errors = true;
            }
        }
    }

    tracing::debug!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "assembly finished"
    );

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
