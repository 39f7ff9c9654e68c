#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]

use mcbootlib::{BootAttrs, prepare};
use std::env;
use std::process;

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!(" ------------------------------------------");
    println!("|  Bootloader Chunk Preparation  | v{version} |");
    println!(" ------------------------------------------");
    println!("\nUsage:");
    println!("  mcbootprep chunks <input.hex> [options]");
    println!("\nOptions:");
    println!("  --max-packet-length <val>  Bootloader packet size in bytes (default: 256)");
    println!("  --write-size <val>         Flash write unit in bytes (default: 8)");
    println!("  --memory-start <val>       Program window start, word address (default: 0x1800)");
    println!("  --memory-end <val>         Program window end, exclusive (default: 0x2A800)");
    println!("\nExamples:");
    println!("  mcbootprep chunks firmware.hex");
    println!("  mcbootprep chunks firmware.hex --memory-start 0x2000 --memory-end 0x20000");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    println!();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    // Dispatch and immediately handle results
    if let Err(e) = run_dispatch(command, &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_dispatch(cmd: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        "chunks" => {
            // Guard: Check args count
            let path_str = args.get(2).ok_or("Missing input file path")?;

            // Guard: File must exist
            if !std::path::Path::new(path_str).is_file() {
                return Err(format!("File not found: {path_str}").into());
            }

            let attrs = BootAttrs {
                max_packet_length: parse_flag(args, "--max-packet-length", 256)?,
                write_size: parse_flag(args, "--write-size", 8)?,
                memory_start: parse_flag(args, "--memory-start", 0x1800)?,
                memory_end: parse_flag(args, "--memory-end", 0x2A800)?,
                ..BootAttrs::default()
            };

            // Guard: write unit must hold whole words
            if attrs.write_size < 2 || attrs.write_size % 2 != 0 {
                return Err("Write size must be an even number of bytes".into());
            }

            run_chunks(path_str, &attrs)
        }
        _ => {
            print_usage();
            Err(format!("Unknown command: {cmd}").into())
        }
    }
}

fn run_chunks(path: &str, attrs: &BootAttrs) -> Result<(), Box<dyn std::error::Error>> {
    let chunks = prepare(path, attrs)?;

    if chunks.is_empty() {
        println!("No data within [{:#x}, {:#x})", attrs.memory_start, attrs.memory_end);
        return Ok(());
    }

    println!("{:<12} {:>8}", "Address", "Bytes");
    let mut total = 0usize;
    for chunk in &chunks {
        println!("{:<#12x} {:>8}", chunk.address, chunk.data.len());
        total += chunk.data.len();
    }
    println!("\n{} chunk(s), {total} byte(s) total", chunks.len());

    Ok(())
}

/// Find the value after a flag (e.g., "--write-size 8"), falling back to a
/// default when the flag is absent. Accepts decimal or 0x-prefixed hex.
fn parse_flag<T>(args: &[String], flag: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: TryFrom<u64>,
{
    let Some(value) = args
        .iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
    else {
        return Ok(default);
    };

    let trimmed = value.trim();
    let parsed = if let Some(hex_str) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex_str, 16)
    } else {
        trimmed.parse::<u64>()
    }
    .map_err(|_| format!("Invalid value for {flag}: {value}"))?;

    T::try_from(parsed).map_err(|_| format!("Value out of range for {flag}: {value}").into())
}
