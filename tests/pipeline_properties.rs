//! Property-based tests for the parallel noise reduction pipeline
//!
//! **Feature: pet-denoise, Property 9: 并行结果一致性**

use pet_denoise::core::{
    classify, BedpeParseError, Category, ClassifyError, RawSites, RestrictionSiteIndex,
    SpanThreshold,
};
use pet_denoise::formats::PairRecord;
use pet_denoise::pipeline::{self, ClassCounts, NoiseReduceConfig, SinkSet};
use proptest::prelude::*;
use std::collections::HashMap;
use std::io;

const REST_SITE_LEN: u64 = 4;

fn test_index() -> RestrictionSiteIndex {
    let mut sites = HashMap::new();
    sites.insert("chr1".to_string(), (1..200u64).map(|i| i * 97).collect());
    sites.insert("chr2".to_string(), (1..100u64).map(|i| i * 211).collect());
    RestrictionSiteIndex::build(RawSites {
        sites,
        rest_site_len: REST_SITE_LEN,
    })
    .unwrap()
}

/// chrUn has no restriction sites
fn arb_chrom() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        8 => Just("chr1"),
        3 => Just("chr2"),
        1 => Just("chrUn"),
    ]
}

fn arb_line() -> impl Strategy<Value = String> {
    (
        arb_chrom(),
        0u64..20_000,
        REST_SITE_LEN + 2..150,
        arb_chrom(),
        0u64..20_000,
        REST_SITE_LEN + 2..150,
        0u32..1_000,
    )
        .prop_map(|(c1, s1, l1, c2, s2, l2, id)| {
            format!("{}\t{}\t{}\t{}\t{}\t{}\tpet{}", c1, s1, s1 + l1, c2, s2, s2 + l2, id)
        })
}

fn arb_threshold() -> impl Strategy<Value = SpanThreshold> {
    prop_oneof![
        Just(SpanThreshold::ForceCheck),
        (0u64..3_000).prop_map(SpanThreshold::Span),
    ]
}

/// Single-threaded reference: counts plus the sorted output lines of each category
fn reference(
    index: &RestrictionSiteIndex,
    lines: &[String],
    threshold: SpanThreshold,
) -> (ClassCounts, [Vec<String>; 3]) {
    let mut counts = ClassCounts::default();
    let mut outputs: [Vec<String>; 3] = Default::default();
    for line in lines {
        let record = PairRecord::parse(line.clone()).unwrap();
        match classify(index, &record.end1(), &record.end2(), threshold) {
            Ok(result) => {
                counts.add(result.category);
                let mut out = Vec::new();
                record.write_annotated(&mut out, result.fragments).unwrap();
                outputs[result.category.index()].push(String::from_utf8(out).unwrap());
            }
            Err(ClassifyError::UnknownChromosome(_)) => counts.skipped += 1,
            Err(e) => panic!("unexpected classification error: {}", e),
        }
    }
    for output in outputs.iter_mut() {
        output.sort();
    }
    (counts, outputs)
}

fn memory_sinks(_: usize) -> io::Result<SinkSet<Vec<u8>>> {
    Ok(SinkSet::new(Vec::new(), Vec::new(), Vec::new()))
}

fn records(lines: &[String]) -> impl Iterator<Item = Result<PairRecord, BedpeParseError>> + '_ {
    lines.iter().map(|l| PairRecord::parse(l.clone()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// **Property 9: 并行结果一致性**
    ///
    /// For any worker count the merged counts and the multiset of output
    /// lines per category equal a single-threaded run.
    #[test]
    fn prop_parallel_matches_reference(
        lines in prop::collection::vec(arb_line(), 0..400),
        threshold in arb_threshold(),
        chunk_size in 1usize..64,
    ) {
        let index = test_index();
        let (expected_counts, expected_outputs) = reference(&index, &lines, threshold);

        for processes in [1usize, 2, 4, 8] {
            let config = NoiseReduceConfig {
                threshold,
                processes,
                chunk_size,
                channel_capacity: None,
            };
            let output = pipeline::run(&index, records(&lines), &config, memory_sinks).unwrap();

            prop_assert_eq!(output.counts, expected_counts);
            prop_assert_eq!(output.distributed.records, lines.len());
            prop_assert_eq!(output.sinks.len(), processes);

            for category in Category::ALL {
                let mut written: Vec<String> = output
                    .sinks
                    .iter()
                    .flat_map(|sinks| {
                        String::from_utf8(sinks[category.index()].clone())
                            .unwrap()
                            .lines()
                            .map(|l| format!("{}\n", l))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                written.sort();
                prop_assert_eq!(&written, &expected_outputs[category.index()]);
            }
        }
    }

    /// **Property 10: 计数守恒**
    ///
    /// Every record is either counted in exactly one category or skipped.
    #[test]
    fn prop_counts_conserved(
        lines in prop::collection::vec(arb_line(), 0..300),
        threshold in arb_threshold(),
        processes in 1usize..6,
    ) {
        let index = test_index();
        let config = NoiseReduceConfig {
            threshold,
            processes,
            chunk_size: 17,
            channel_capacity: Some(1),
        };
        let output = pipeline::run(&index, records(&lines), &config, memory_sinks).unwrap();

        prop_assert_eq!(
            output.counts.total() + output.counts.skipped,
            lines.len() as u64
        );
    }
}
