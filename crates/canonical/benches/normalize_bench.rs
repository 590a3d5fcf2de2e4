use std::hint::black_box;

use canonical::{NormalizeConfig, normalize};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ingest::RawImage;

fn ridge_scan(side: u32) -> RawImage {
    let c = side as f64 / 2.0;
    let data = (0..side * side)
        .map(|i| {
            let (x, y) = ((i % side) as f64, (i / side) as f64);
            let r = ((x - c).powi(2) + (y - c).powi(2)).sqrt();
            (128.0 + 90.0 * (r / 1.5).sin()) as u8
        })
        .collect();
    RawImage::from_gray(side, side, data).expect("valid scan")
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for side in [64u32, 128, 256] {
        let raw = ridge_scan(side);
        group.throughput(Throughput::Elements(u64::from(side * side)));
        for parallel in [false, true] {
            let cfg = NormalizeConfig::default().with_parallel(parallel);
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_function(format!("{label}_{side}"), |b| {
                b.iter(|| normalize(black_box(&raw), black_box(&cfg)).expect("normalize"))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
