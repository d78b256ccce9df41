use std::collections::BTreeMap;
use std::time::Instant;

use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use utrie::{Builder, CodePointMap, CompactArray, Statistics, MAX_CODE_POINT};

const TRIALS: usize = 10;
const QUERIES: usize = 100_000;

#[derive(Parser, Debug)]
#[clap(name = "measure", about = "A program to measure the performance.")]
struct Args {
    /// Number of random ranges to store.
    #[clap(short = 'n', long, default_value = "2000")]
    num_ranges: usize,

    /// Largest stored value.
    #[clap(short = 'm', long, default_value = "65535")]
    max_value: u32,

    #[clap(short = 's', long, default_value = "42")]
    seed: u64,
}

macro_rules! frozen_common {
    ($name:expr, $value:ty, $builder:ident, $queries:ident, $text:ident) => {
        println!("[utrie/{}]", $name);
        let start = Instant::now();
        match $builder.freeze::<$value>() {
            Ok(trie) => {
                let duration = start.elapsed();
                print_heap_bytes(trie.heap_bytes());
                println!("num_elems: {}", trie.num_elems());
                println!("io_bytes: {}", trie.io_bytes());
                println!("freeze: {:.3} [ms]", to_ms(duration.as_secs_f64()));

                let mut dummy = 0;
                let elapsed_sec = measure(TRIALS, || {
                    for &c in &$queries {
                        dummy += u64::from(trie.get(c));
                    }
                });
                println!("get: {:.3} [ns/query]", to_ns(elapsed_sec) / $queries.len() as f64);
                println!("dummy: {}", dummy);

                let mut dummy = 0;
                let elapsed_sec = measure(TRIALS, || {
                    dummy += trie.iter().count();
                });
                println!("iter: {:.3} [us/pass]", to_us(elapsed_sec));
                println!("dummy: {}", dummy);

                let mut dummy = 0;
                let elapsed_sec = measure(TRIALS, || {
                    for u in trie.units_iter(&$text, 0) {
                        dummy += u64::from(u.value);
                    }
                });
                println!("units_iter: {:.3} [ns/unit]", to_ns(elapsed_sec) / $text.len() as f64);
                println!("dummy: {}", dummy);
            }
            Err(e) => println!("skipped: {}", e),
        }
    };
}

fn main() {
    let args = Args::parse();
    println!("num_ranges: {}", args.num_ranges);
    println!("max_value: {:X}", args.max_value);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let ranges = random_ranges(&mut rng, args.num_ranges, args.max_value);
    let queries: Vec<u32> = (0..QUERIES)
        .map(|_| {
            if rng.gen_bool(0.8) {
                rng.gen_range(0..0x10000)
            } else {
                rng.gen_range(0..=MAX_CODE_POINT)
            }
        })
        .collect();
    let text: Vec<u16> = queries
        .iter()
        .filter_map(|&c| char::from_u32(c))
        .collect::<String>()
        .encode_utf16()
        .collect();

    let builder = {
        println!("[utrie/builder]");
        let start = Instant::now();
        let mut builder = Builder::new(0, 0);
        for &(start, end, value) in &ranges {
            builder.set_range(start, end, value, true).unwrap();
        }
        let duration = start.elapsed();
        print_heap_bytes(builder.heap_bytes());
        println!("construction: {:.3} [ms]", to_ms(duration.as_secs_f64()));

        let mut dummy = 0;
        let elapsed_sec = measure(TRIALS, || {
            for &c in &queries {
                dummy += u64::from(builder.get(c));
            }
        });
        println!("get: {:.3} [ns/query]", to_ns(elapsed_sec) / queries.len() as f64);
        println!("dummy: {}", dummy);
        builder
    };

    {
        frozen_common!("frozen8", u8, builder, queries, text);
    }
    {
        frozen_common!("frozen16", u16, builder, queries, text);
    }
    {
        frozen_common!("frozen32", u32, builder, queries, text);
    }

    {
        println!("[utrie/compact_array]");
        let start = Instant::now();
        let mut array = CompactArray::new(0u32);
        for &(start, end, value) in ranges.iter().filter(|r| r.0 <= 0xffff) {
            array
                .set_range(start as u16, end.min(0xffff) as u16, value)
                .unwrap();
        }
        array.compact(true);
        let duration = start.elapsed();
        print_heap_bytes(array.heap_bytes());
        println!("construction: {:.3} [ms]", to_ms(duration.as_secs_f64()));

        let mut dummy = 0;
        let elapsed_sec = measure(TRIALS, || {
            for &c in &queries {
                dummy += u64::from(array.get(c as u16));
            }
        });
        println!("get: {:.3} [ns/query]", to_ns(elapsed_sec) / queries.len() as f64);
        println!("dummy: {}", dummy);
    }

    {
        println!("[std/BTreeMap]");
        let start = Instant::now();
        let map: BTreeMap<u32, (u32, u32)> = disjoint_ranges(&builder);
        let duration = start.elapsed();
        println!("construction: {:.3} [ms]", to_ms(duration.as_secs_f64()));

        let mut dummy = 0;
        let elapsed_sec = measure(TRIALS, || {
            for &c in &queries {
                if let Some((_, &(end, value))) = map.range(..=c).next_back() {
                    if c <= end {
                        dummy += u64::from(value);
                    }
                }
            }
        });
        println!("get: {:.3} [ns/query]", to_ns(elapsed_sec) / queries.len() as f64);
        println!("dummy: {}", dummy);
    }
}

fn random_ranges(rng: &mut StdRng, num_ranges: usize, max_value: u32) -> Vec<(u32, u32, u32)> {
    (0..num_ranges)
        .map(|_| {
            let start = if rng.gen_bool(0.7) {
                rng.gen_range(0..0x10000)
            } else {
                rng.gen_range(0..=MAX_CODE_POINT)
            };
            let end = (start + rng.gen_range(0..0x400)).min(MAX_CODE_POINT);
            (start, end, rng.gen_range(0..=max_value))
        })
        .collect()
}

// Start of each non-initial range, mapped to its end and value.
fn disjoint_ranges(builder: &Builder) -> BTreeMap<u32, (u32, u32)> {
    builder
        .iter()
        .filter(|r| !r.lead_surrogate && r.value != builder.initial_value())
        .map(|r| (r.start, (r.end, r.value)))
        .collect()
}

fn print_heap_bytes(bytes: usize) {
    println!(
        "heap_bytes: {} bytes, {:.3} MiB",
        bytes,
        bytes as f64 / (1024.0 * 1024.0)
    );
}

fn measure<F>(num_trials: usize, mut func: F) -> f64
where
    F: FnMut(),
{
    // Warmup
    func();
    // Measure
    let start = Instant::now();
    for _ in 0..num_trials {
        func();
    }
    let duration = start.elapsed();
    duration.as_secs_f64() / num_trials as f64
}

fn to_ms(sec: f64) -> f64 {
    sec * 1_000.
}

fn to_us(sec: f64) -> f64 {
    sec * 1_000_000.
}

fn to_ns(sec: f64) -> f64 {
    sec * 1_000_000_000.
}
