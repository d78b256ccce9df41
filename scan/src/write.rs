use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use utrie::format::DataInfo;
use utrie::{Builder, Statistics};

#[derive(Parser, Debug)]
#[clap(
    name = "write",
    about = "A program to build a serialized trie from hexadecimal ranges.

Each input line is `start end value` or `code_point value` in hexadecimal.
Empty lines and lines starting with `#` are skipped."
)]
struct Args {
    #[clap(short = 'i', long)]
    ranges_path: PathBuf,

    #[clap(short = 'o', long)]
    trie_path: PathBuf,

    #[clap(short = 'w', long, default_value = "16", possible_values = &["8", "16", "32"])]
    width: u8,

    #[clap(long, default_value = "0", parse(try_from_str = parse_hex))]
    initial_value: u32,

    #[clap(long, default_value = "0", parse(try_from_str = parse_hex))]
    error_value: u32,

    /// Writes multi-byte fields in big-endian order.
    #[clap(long)]
    big_endian: bool,

    /// Data version as four dot-separated numbers.
    #[clap(long, default_value = "2.0.0.0", parse(try_from_str = parse_version))]
    data_version: [u8; 4],
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut builder = Builder::new(args.initial_value, args.error_value);
    let reader = BufReader::new(File::open(&args.ranges_path)?);
    let mut num_ranges = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cols = line
            .split_whitespace()
            .map(parse_hex)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("line {}: {}", i + 1, e))?;
        match cols[..] {
            [c, value] => builder.set(c, value)?,
            [start, end, value] => builder.set_range(start, end, value, true)?,
            _ => return Err(format!("line {}: expected 2 or 3 columns", i + 1).into()),
        }
        num_ranges += 1;
    }
    info!(num_ranges, heap_bytes = builder.heap_bytes(), "loaded ranges");

    let info = DataInfo {
        big_endian: args.big_endian,
        data_version: args.data_version,
        ..DataInfo::default()
    };
    let bytes = match args.width {
        8 => builder.freeze::<u8>()?.serialize_with_info(&info),
        16 => builder.freeze16()?.serialize_with_info(&info),
        _ => builder.freeze32()?.serialize_with_info(&info),
    };
    let mut writer = File::create(&args.trie_path)?;
    writer.write_all(&bytes)?;
    info!(bytes = bytes.len(), path = ?args.trie_path, "wrote trie");

    Ok(())
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s
        .trim_start_matches("U+")
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("{}: {}", s, e))
}

fn parse_version(s: &str) -> Result<[u8; 4], String> {
    let mut version = [0; 4];
    let parts: Vec<_> = s.split('.').collect();
    if parts.is_empty() || parts.len() > 4 {
        return Err(format!("{}: expected up to four numbers", s));
    }
    for (v, part) in version.iter_mut().zip(parts) {
        *v = part.parse().map_err(|e| format!("{}: {}", s, e))?;
    }
    Ok(version)
}
