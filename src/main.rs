//! vm2hack CLI
//!
//! Translates VM code to Hack assembly.
//!
//! # Usage
//!
//! ```bash
//! # Single file, no bootstrap
//! vm2hack SimpleAdd.vm
//!
//! # Directory, merged output with bootstrap
//! vm2hack FibonacciElement/
//!
//! # One .asm per unit, written elsewhere
//! vm2hack --split -d out/ StaticsTest/
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser as ClapParser;
use log::LevelFilter;

use vm2hack::{DEFAULT_ENTRY, OutputMode, TranslateOptions, translate_path};

#[derive(ClapParser, Debug)]
#[command(name = "vm2hack")]
#[command(version)]
#[command(about = "Stack VM to Hack assembly translator")]
#[command(author = "nand2tetris")]
struct Args {
    /// Input .vm file or directory of .vm files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (defaults to next to the input)
    #[arg(short, long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Function called by the bootstrap
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ENTRY)]
    entry: String,

    /// Always emit the bootstrap
    #[arg(long, conflicts_with = "no_bootstrap")]
    bootstrap: bool,

    /// Never emit the bootstrap
    #[arg(long = "no-bootstrap")]
    no_bootstrap: bool,

    /// Write one .asm per source unit instead of one merged file
    #[arg(long)]
    split: bool,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if !args.input.exists() {
        eprintln!("Error: Path not found: {}", args.input.display());
        return ExitCode::from(2);
    }

    let options = TranslateOptions {
        bootstrap: match (args.bootstrap, args.no_bootstrap) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        entry: args.entry,
        mode: if args.split {
            OutputMode::PerUnit
        } else {
            OutputMode::Merged
        },
        dest: args.dest,
    };

    let start = Instant::now();

    match translate_path(&args.input, &options) {
        Ok(written) => {
            if args.verbose {
                eprintln!(
                    "Translated {} -> {} file(s) ({:.2}ms)",
                    args.input.display(),
                    written.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            for path in written {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
