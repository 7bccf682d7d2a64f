//! Print a CHIP-8 program image as a listing, one instruction word per line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chipterm-disasm", version, about = "Disassemble a CHIP-8 program")]
struct Args {
    /// Program image to list.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let rom = std::fs::read(&args.file)
        .with_context(|| format!("error while reading file {}", args.file.display()))?;
    for line in chipterm::disassemble(&rom) {
        println!("{}", line);
    }
    Ok(())
}
