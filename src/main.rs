#![deny(warnings)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::unwrap_used)]

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "s3")]
#[command(
    bin_name = "s3",
    version("0.2.10"),
    about = "Run an S3 (Simple Stack Script) program.",
    long_about = "Run an S3 (Simple Stack Script) program: a line-oriented stack-machine \
scripting language for toy automation and teaching scripts. \
For more information, see the README or the project's repository page."
)]
struct S3Cli {
    /// The S3 script file to execute (optional).
    filename: Option<PathBuf>,
}

fn main() -> miette::Result<()> {
    let cli = S3Cli::parse();

    let Some(filename) = cli.filename else {
        let _ = S3Cli::command().print_help();
        return Ok(());
    };

    if filename.extension().and_then(|ext| ext.to_str()) != Some("s3") {
        eprintln!("Error: Unknown file extension.");
        std::process::exit(1);
    }

    let source = match std::fs::read_to_string(&filename) {
        Ok(source) => source,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("Error: File '{}' not found.", filename.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("An error occurred: {}", e);
            std::process::exit(1);
        }
    };

    s3lang::run(&source)
}
