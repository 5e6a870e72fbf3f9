//! Performance benchmarks for pet-denoise
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pet_denoise::core::{classify, locate, PetEnd, RawSites, RestrictionSiteIndex, SpanThreshold};
use pet_denoise::formats::PairRecord;
use pet_denoise::pipeline::{self, NoiseReduceConfig, SinkSet};
use std::collections::HashMap;

const REST_SITE_LEN: u64 = 4;

/// MboI-like site density: one site every ~400bp over 10Mb
fn synthetic_index() -> RestrictionSiteIndex {
    let mut sites = HashMap::new();
    for chrom in ["chr1", "chr2"] {
        let positions: Vec<u64> = (1..25_000u64).map(|i| i * 400 + (i * 37) % 113).collect();
        sites.insert(chrom.to_string(), positions);
    }
    RestrictionSiteIndex::build(RawSites {
        sites,
        rest_site_len: REST_SITE_LEN,
    })
    .unwrap()
}

fn synthetic_lines(n: usize) -> Vec<String> {
    (0..n as u64)
        .map(|i| {
            let s1 = (i * 7_919) % 9_900_000;
            let s2 = s1 + (i * 131) % 3_000;
            let chrom2 = if i % 10 == 0 { "chr2" } else { "chr1" };
            format!("chr1\t{}\t{}\t{}\t{}\t{}\tpet{}", s1, s1 + 100, chrom2, s2, s2 + 100, i)
        })
        .collect()
}

/// Benchmark single fragment lookup
fn bench_locate(c: &mut Criterion) {
    let index = synthetic_index();
    let sites = index.sites_for("chr1").unwrap();

    c.bench_function("locate_single", |b| {
        b.iter(|| {
            let frag = locate(
                black_box(sites),
                REST_SITE_LEN,
                black_box(4_000_123),
                black_box(4_000_223),
            );
            black_box(frag)
        })
    });
}

/// Benchmark classification with and without the distance short-circuit
fn bench_classify(c: &mut Criterion) {
    let index = synthetic_index();
    let near = (
        PetEnd::new("chr1", 4_000_123, 4_000_223),
        PetEnd::new("chr1", 4_000_450, 4_000_550),
    );
    let far = (
        PetEnd::new("chr1", 1_000_000, 1_000_100),
        PetEnd::new("chr1", 8_000_000, 8_000_100),
    );

    let mut group = c.benchmark_group("classify");
    group.bench_function("near_pair", |b| {
        b.iter(|| black_box(classify(&index, &near.0, &near.1, SpanThreshold::default())))
    });
    group.bench_function("far_pair", |b| {
        b.iter(|| black_box(classify(&index, &far.0, &far.1, SpanThreshold::default())))
    });
    group.bench_function("far_pair_forced", |b| {
        b.iter(|| black_box(classify(&index, &far.0, &far.1, SpanThreshold::ForceCheck)))
    });
    group.finish();
}

/// Benchmark the worker pool at different worker counts
fn bench_pipeline(c: &mut Criterion) {
    let index = synthetic_index();
    let lines = synthetic_lines(100_000);

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.sample_size(10);

    for processes in [1usize, 2, 4, 8].iter() {
        let config = NoiseReduceConfig {
            processes: *processes,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(processes),
            &config,
            |b, config| {
                b.iter(|| {
                    let records = lines.iter().map(|l| PairRecord::parse(l.clone()));
                    let output = pipeline::run(&index, records, config, |_| {
                        Ok(SinkSet::new(std::io::sink(), std::io::sink(), std::io::sink()))
                    })
                    .unwrap();
                    black_box(output.counts)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_locate, bench_classify, bench_pipeline);
criterion_main!(benches);
