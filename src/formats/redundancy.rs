//! Redundant PET removal
//!
//! Two PETs are replicates when, end by end, their coordinates are all
//! within a distance threshold:
//!
//! ```text
//!   reads1    <---  ...  --->
//!          |-----|      |-----|
//!   reads2   <--- ... --->
//! ```
//!
//! Records are first put in upper-triangle form and sorted by end 1, then
//! compared against a running base record; replicates of the base are
//! dropped.

use crate::core::{open_text, PetDenoiseError};
use crate::formats::bedpe::{BedpeReader, PairRecord};
use log::info;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default replicate distance
pub const DEFAULT_DISTANCE: u64 = 50;

/// Redundancy removal statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RedundancyStats {
    pub total: usize,
    pub kept: usize,
    pub removed: usize,
}

fn sort_key(record: &PairRecord) -> (&str, u64, u64, &str, u64, u64) {
    (
        record.chrom1(),
        record.start1,
        record.end1,
        record.chrom2(),
        record.start2,
        record.end2,
    )
}

/// Sort upper-triangle records by end 1, then end 2
pub fn sort_pairs(records: &mut [PairRecord]) {
    records.par_sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

/// Drop replicates from records already sorted with [`sort_pairs`]
pub fn dedup_sorted(records: Vec<PairRecord>, distance: u64) -> Vec<PairRecord> {
    let mut kept: Vec<PairRecord> = Vec::with_capacity(records.len());
    let mut records = records.into_iter();
    let mut base = match records.next() {
        Some(first) => first,
        None => return kept,
    };

    for record in records {
        if base.is_replicate_of(&record, distance) {
            continue;
        }
        kept.push(std::mem::replace(&mut base, record));
    }
    kept.push(base);
    kept
}

/// Remove redundant PETs from a BEDPE file
///
/// The output holds records in upper-triangle form, sorted by end 1.
pub fn remove_redundancy_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    distance: u64,
) -> Result<RedundancyStats, PetDenoiseError> {
    info!("remove redundancy on file {}", input.as_ref().display());

    let mut records = BedpeReader::new(open_text(input.as_ref())?)
        .map(|r| r.and_then(PairRecord::to_upper_triangle))
        .collect::<Result<Vec<_>, _>>()?;
    let total = records.len();

    sort_pairs(&mut records);
    let kept = dedup_sorted(records, distance);

    let mut out = BufWriter::with_capacity(128 * 1024, File::create(output.as_ref())?);
    for record in &kept {
        record.write_annotated(&mut out, None)?;
    }
    out.flush()?;

    let stats = RedundancyStats {
        total,
        kept: kept.len(),
        removed: total - kept.len(),
    };
    info!(
        "redundancy removed: {} of {} records dropped",
        stats.removed, stats.total
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn record(line: &str) -> PairRecord {
        PairRecord::parse(line.to_string()).unwrap()
    }

    #[test]
    fn test_sort_pairs() {
        let mut records = vec![
            record("chr2\t10\t60\tchr2\t500\t550"),
            record("chr1\t300\t350\tchr1\t500\t550"),
            record("chr1\t100\t150\tchr2\t500\t550"),
            record("chr1\t100\t150\tchr1\t900\t950"),
        ];
        sort_pairs(&mut records);
        let lines: Vec<&str> = records.iter().map(|r| r.line()).collect();
        assert_eq!(
            lines,
            vec![
                "chr1\t100\t150\tchr1\t900\t950",
                "chr1\t100\t150\tchr2\t500\t550",
                "chr1\t300\t350\tchr1\t500\t550",
                "chr2\t10\t60\tchr2\t500\t550",
            ]
        );
    }

    #[test]
    fn test_dedup_compares_against_base() {
        let records = vec![
            record("chr1\t100\t150\tchr1\t500\t550\ta"),
            record("chr1\t130\t180\tchr1\t520\t570\tb"),
            // Within 50 of b but not of the base a
            record("chr1\t170\t220\tchr1\t540\t590\tc"),
        ];
        let kept = dedup_sorted(records, 50);
        let names: Vec<&str> = kept.iter().map(|r| r.line().rsplit('\t').next().unwrap()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_dedup_empty_and_single() {
        assert!(dedup_sorted(Vec::new(), 50).is_empty());
        let kept = dedup_sorted(vec![record("chr1\t1\t50\tchr1\t60\t90")], 50);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_remove_redundancy_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.bedpe");
        fs::write(
            &input,
            "chr1\t500\t550\tchr1\t100\t150\tp1\t0\t-\t+\n\
             chr1\t110\t160\tchr1\t510\t560\tp2\t0\t+\t-\n\
             chr2\t100\t150\tchr2\t900\t950\tp3\t0\t+\t+\n",
        )
        .unwrap();
        let output = dir.path().join("out.bedpe");

        let stats = remove_redundancy_file(&input, &output, DEFAULT_DISTANCE).unwrap();

        assert_eq!(
            stats,
            RedundancyStats {
                total: 3,
                kept: 2,
                removed: 1
            }
        );
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "chr1\t100\t150\tchr1\t500\t550\tp1\t0\t+\t-\n\
             chr2\t100\t150\tchr2\t900\t950\tp3\t0\t+\t+\n"
        );
    }
}
