//! Aggregation of worker outputs
//!
//! Concatenates per-worker partitions into the final category files and
//! renders the summary report.

use crate::core::Category;
use crate::pipeline::ClassCounts;
use log::info;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Concatenate `parts` into `output` in the given order, removing each part
pub fn merge_parts<P: AsRef<Path>>(parts: &[PathBuf], output: P) -> io::Result<()> {
    let mut out = BufWriter::with_capacity(128 * 1024, File::create(output.as_ref())?);
    for part in parts {
        let mut input = File::open(part)?;
        io::copy(&mut input, &mut out)?;
    }
    out.flush()?;

    for part in parts {
        fs::remove_file(part)?;
    }
    Ok(())
}

/// Final per-category counts of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryReport {
    pub counts: ClassCounts,
}

impl SummaryReport {
    pub fn new(counts: ClassCounts) -> Self {
        Self { counts }
    }

    /// Share of `category` in the total, 0 when nothing was classified
    pub fn ratio(&self, category: Category) -> f64 {
        let total = self.counts.total();
        if total == 0 {
            0.0
        } else {
            self.counts.get(category) as f64 / total as f64
        }
    }

    /// Lines with counts and percentages, as logged
    pub fn log_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Category::ALL
            .iter()
            .map(|&c| {
                format!(
                    "{}\t{}\tpercent\t{:.2}%",
                    c,
                    self.counts.get(c),
                    self.ratio(c) * 100.0
                )
            })
            .collect();
        lines.push(format!("total\t{}", self.counts.total()));
        lines
    }

    /// Emit the summary through the logger
    pub fn log(&self) {
        info!("Noise reduce result count:");
        for line in self.log_lines() {
            info!("\t{}", line);
        }
    }

    /// Write the four-line report
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for category in Category::ALL {
            writeln!(out, "{}\t{}", category, self.counts.get(category))?;
        }
        writeln!(out, "total\t{}", self.counts.total())
    }

    /// Persist the report to `path`
    pub fn write_report<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut out)?;
        out.flush()
    }
}
