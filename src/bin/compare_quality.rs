//! Quality comparison binary.
//!
//! Compares an original PDF with its rebuilt counterpart and prints the
//! diagnostics as JSON, for tracking regressions across engine changes.
//!
//! Usage: `compare_quality <original.pdf> <produced.pdf> [--pretty]`

use pdf_retext::diagnostics::diagnose_bytes;
use std::fs;
use std::process;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let pretty = args.iter().any(|a| a == "--pretty");
    let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    if paths.len() != 2 {
        eprintln!("Usage: compare_quality <original.pdf> <produced.pdf> [--pretty]");
        process::exit(2);
    }

    let original = fs::read(paths[0])?;
    let produced = fs::read(paths[1])?;
    log::info!(
        "Comparing {} ({} bytes) with {} ({} bytes)",
        paths[0],
        original.len(),
        paths[1],
        produced.len()
    );

    let metrics = diagnose_bytes(&original, &produced);
    let json = if pretty {
        serde_json::to_string_pretty(&metrics)?
    } else {
        serde_json::to_string(&metrics)?
    };
    println!("{}", json);
    Ok(())
}
