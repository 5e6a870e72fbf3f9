//! Restriction fragment length table
//!
//! Lists, per chromosome, the lengths of all fragments between
//! consecutive restriction sites.

use crate::core::RestrictionSiteIndex;
use log::info;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Chromosome -> fragment lengths, sorted by chromosome name
pub type FragmentLengthTable = Vec<(String, Vec<u64>)>;

/// Compute fragment lengths of every chromosome in parallel
pub fn fragment_length_table(index: &RestrictionSiteIndex) -> FragmentLengthTable {
    let mut chroms: Vec<&str> = index.chroms().collect();
    chroms.sort_unstable();
    chroms
        .par_iter()
        .map(|&chrom| {
            let lengths = index.fragment_lengths(chrom).unwrap_or_default();
            (chrom.to_string(), lengths)
        })
        .collect()
}

/// Write the table as `chrom\tlen\tlen...` lines
pub fn write_fragment_lengths<P: AsRef<Path>>(
    path: P,
    table: &FragmentLengthTable,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for (chrom, lengths) in table {
        out.write_all(chrom.as_bytes())?;
        for len in lengths {
            write!(out, "\t{}", len)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Load a table written by [`write_fragment_lengths`]
pub fn load_fragment_lengths<P: AsRef<Path>>(path: P) -> io::Result<FragmentLengthTable> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut table = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let chrom = match fields.next() {
            Some(chrom) => chrom.to_string(),
            None => continue,
        };
        let lengths = fields
            .map(|f| {
                f.parse::<u64>().map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line {}: invalid fragment length '{}'", n + 1, f),
                    )
                })
            })
            .collect::<io::Result<Vec<_>>>()?;
        table.push((chrom, lengths));
    }
    Ok(table)
}

/// Summary of all fragment lengths in a table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentLengthSummary {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub median: f64,
}

impl FragmentLengthSummary {
    /// `None` when the table holds no fragment at all
    pub fn from_table(table: &FragmentLengthTable) -> Option<Self> {
        let mut all: Vec<u64> = table.iter().flat_map(|(_, l)| l.iter().copied()).collect();
        if all.is_empty() {
            return None;
        }
        all.par_sort_unstable();

        let count = all.len();
        let sum: u128 = all.iter().map(|&l| l as u128).sum();
        let median = if count % 2 == 0 {
            (all[count / 2 - 1] + all[count / 2]) as f64 / 2.0
        } else {
            all[count / 2] as f64
        };
        Some(Self {
            count,
            min: all[0],
            max: all[count - 1],
            mean: sum as f64 / count as f64,
            median,
        })
    }

    pub fn log(&self) {
        info!(
            "fragments: {} min: {} median: {:.1} mean: {:.1} max: {}",
            self.count, self.min, self.median, self.mean, self.max
        );
    }
}
