use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use utrie::{AnyTrie, CodePointMap, Statistics};

#[derive(Parser, Debug)]
#[clap(name = "dump", about = "A program to print the value ranges of a serialized trie.")]
struct Args {
    #[clap(short = 'i', long)]
    trie_path: PathBuf,

    /// Also prints the ranges of the lead surrogate lane.
    #[clap(short = 'l', long)]
    lead_surrogates: bool,

    /// Merges ranges on `value & mask` (hexadecimal).
    #[clap(short = 'm', long, parse(try_from_str = parse_hex))]
    mask: Option<u32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut bytes = vec![];
    {
        let mut reader = File::open(&args.trie_path)?;
        reader.read_to_end(&mut bytes)?;
    }
    let (trie, rest) = AnyTrie::deserialize_from_slice(&bytes)?;
    info!(
        bits = trie.value_width().bits(),
        heap_bytes = trie.heap_bytes(),
        trailing_bytes = rest.len(),
        "loaded trie"
    );

    let mask = args.mask.unwrap_or(u32::MAX);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(
        out,
        "# initial {:X}, error {:X}",
        trie.initial_value(),
        trie.error_value()
    )?;
    for r in trie.iter_mapped(|v| v & mask) {
        if r.lead_surrogate && !args.lead_surrogates {
            break;
        }
        let lane = if r.lead_surrogate { "lead " } else { "" };
        if r.start == r.end {
            writeln!(out, "{}{:04X} {:X}", lane, r.start, r.value)?;
        } else {
            writeln!(out, "{}{:04X} {:04X} {:X}", lane, r.start, r.end, r.value)?;
        }
    }

    Ok(())
}

fn parse_hex(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| format!("{}: {}", s, e))
}
