use std::collections::BTreeMap;
use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, Criterion, SamplingMode,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use utrie::{Builder, CodePointMap, MAX_CODE_POINT};

const SAMPLE_SIZE: usize = 10;
const WARM_UP_TIME: Duration = Duration::from_secs(5);
const MEASURE_TIME: Duration = Duration::from_secs(10);

const NUM_RANGES: usize = 2000;
const QUERIES: usize = 10_000;

fn criterion_random_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("random/get");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP_TIME);
    group.measurement_time(MEASURE_TIME);
    group.sampling_mode(SamplingMode::Flat);

    let mut rng = StdRng::seed_from_u64(42);
    let builder = random_builder(&mut rng);
    let queries: Vec<u32> = (0..QUERIES)
        .map(|_| rng.gen_range(0..=MAX_CODE_POINT))
        .collect();

    add_get_benches(&mut group, &builder, &queries);
}

fn criterion_random_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("random/iter");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP_TIME);
    group.measurement_time(MEASURE_TIME);
    group.sampling_mode(SamplingMode::Flat);

    let mut rng = StdRng::seed_from_u64(42);
    let builder = random_builder(&mut rng);

    group.bench_function("utrie/builder", |b| {
        b.iter(|| {
            if builder.iter().count() == 0 {
                panic!();
            }
        });
    });

    group.bench_function("utrie/frozen16", |b| {
        let trie = builder.freeze16().unwrap();
        b.iter(|| {
            if trie.iter().count() == 0 {
                panic!();
            }
        });
    });
}

fn add_get_benches(group: &mut BenchmarkGroup<WallTime>, builder: &Builder, queries: &[u32]) {
    group.bench_function("utrie/builder", |b| {
        b.iter(|| {
            let mut dummy = 0;
            for &c in queries {
                dummy += u64::from(builder.get(c));
            }
            if dummy == 0 {
                panic!();
            }
        });
    });

    group.bench_function("utrie/frozen16", |b| {
        let trie = builder.freeze16().unwrap();
        b.iter(|| {
            let mut dummy = 0;
            for &c in queries {
                dummy += u64::from(trie.get_value(c));
            }
            if dummy == 0 {
                panic!();
            }
        });
    });

    group.bench_function("utrie/frozen32", |b| {
        let trie = builder.freeze32().unwrap();
        b.iter(|| {
            let mut dummy = 0;
            for &c in queries {
                dummy += u64::from(trie.get_value(c));
            }
            if dummy == 0 {
                panic!();
            }
        });
    });

    group.bench_function("std/BTreeMap", |b| {
        let map: BTreeMap<u32, (u32, u32)> = builder
            .iter()
            .filter(|r| !r.lead_surrogate && r.value != 0)
            .map(|r| (r.start, (r.end, r.value)))
            .collect();
        b.iter(|| {
            let mut dummy = 0;
            for &c in queries {
                if let Some((_, &(end, value))) = map.range(..=c).next_back() {
                    if c <= end {
                        dummy += u64::from(value);
                    }
                }
            }
            if dummy == 0 {
                panic!();
            }
        });
    });
}

fn random_builder(rng: &mut StdRng) -> Builder {
    let mut builder = Builder::new(0, 0);
    for _ in 0..NUM_RANGES {
        let start = rng.gen_range(0..=MAX_CODE_POINT);
        let end = (start + rng.gen_range(0..0x1000)).min(MAX_CODE_POINT);
        builder
            .set_range(start, end, rng.gen_range(1..=0xffff), true)
            .unwrap();
    }
    builder
}

criterion_group!(benches, criterion_random_get, criterion_random_iter);
criterion_main!(benches);
