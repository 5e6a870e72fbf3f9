//! Restriction site index
//!
//! Holds, per chromosome, the ascending positions of every restriction site
//! together with the restriction sequence length. The index is built once,
//! before any worker starts, and is only ever read afterwards.

use crate::core::error::{SiteLoadError, SiteResult};
use crate::core::io::{is_comment_line, open_text, LineIterator};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Raw per-chromosome site positions, as produced by a loader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSites {
    /// Chromosome -> site positions (ascending)
    pub sites: HashMap<String, Vec<u64>>,
    /// Length of the restriction sequence
    pub rest_site_len: u64,
}

/// Anything able to deliver restriction sites for index construction
pub trait SiteSource {
    fn load(self) -> SiteResult<RawSites>;
}

impl SiteSource for RawSites {
    fn load(self) -> SiteResult<RawSites> {
        Ok(self)
    }
}

/// BED-like restriction site reader
///
/// Site position is column 2; the restriction sequence length is taken
/// from `end - start` of the first record.
pub struct BedSites<R: BufRead> {
    reader: R,
}

impl<R: BufRead> BedSites<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> SiteSource for BedSites<R> {
    fn load(self) -> SiteResult<RawSites> {
        let mut raw = RawSites::default();
        let mut lines = LineIterator::new(self.reader);
        let mut first = true;
        let mut line_number = 0;

        while let Some(line) = lines.next_line() {
            let line = line?;
            line_number += 1;
            if line.trim().is_empty() || is_comment_line(line) {
                continue;
            }

            let mut fields = line.split('\t');
            let (chrom, start, end) = match (fields.next(), fields.next(), fields.next()) {
                (Some(c), Some(s), Some(e)) => (c, s, e),
                _ => {
                    return Err(SiteLoadError::InvalidLine {
                        line: line_number,
                        message: "expected at least 3 tab-separated fields".to_string(),
                    })
                }
            };
            let start: u64 = start.trim().parse().map_err(|_| SiteLoadError::InvalidLine {
                line: line_number,
                message: format!("invalid start '{}'", start),
            })?;
            let end: u64 = end.trim().parse().map_err(|_| SiteLoadError::InvalidLine {
                line: line_number,
                message: format!("invalid end '{}'", end),
            })?;

            if first {
                if end <= start {
                    return Err(SiteLoadError::InvalidSiteLength(end.saturating_sub(start)));
                }
                raw.rest_site_len = end - start;
                first = false;
            }

            match raw.sites.get_mut(chrom) {
                Some(positions) => positions.push(start),
                None => {
                    raw.sites.insert(chrom.to_string(), vec![start]);
                }
            }
        }

        Ok(raw)
    }
}

/// Immutable per-chromosome restriction site positions
#[derive(Debug, Clone)]
pub struct RestrictionSiteIndex {
    sites: HashMap<String, Vec<u64>>,
    rest_site_len: u64,
}

impl RestrictionSiteIndex {
    /// Build an index from any site source
    ///
    /// Positions must already be ascending per chromosome; this is not
    /// verified. Consecutive duplicates are collapsed.
    pub fn build<S: SiteSource>(source: S) -> SiteResult<Self> {
        let RawSites {
            mut sites,
            rest_site_len,
        } = source.load()?;

        sites.retain(|_, positions| !positions.is_empty());
        if sites.is_empty() {
            return Err(SiteLoadError::Empty);
        }
        if rest_site_len == 0 {
            return Err(SiteLoadError::InvalidSiteLength(0));
        }
        for positions in sites.values_mut() {
            positions.dedup();
            positions.shrink_to_fit();
        }

        Ok(Self {
            sites,
            rest_site_len,
        })
    }

    /// Build index from a BED file of restriction sites
    ///
    /// Automatically handles gzip and bzip2 compression.
    ///
    /// # Example
    /// ```ignore
    /// let index = RestrictionSiteIndex::from_bed_file("hg19.MboI.bed.gz")?;
    /// ```
    pub fn from_bed_file<P: AsRef<Path>>(path: P) -> SiteResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SiteLoadError::FileNotFound(path.to_path_buf()));
        }
        Self::build(BedSites::new(open_text(path)?))
    }

    /// Site positions of a chromosome
    pub fn sites_for(&self, chrom: &str) -> Option<&[u64]> {
        self.sites.get(chrom).map(|v| v.as_slice())
    }

    /// Length of the restriction sequence
    pub fn rest_site_len(&self) -> u64 {
        self.rest_site_len
    }

    /// All chromosome names
    pub fn chroms(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(|s| s.as_str())
    }

    /// Number of chromosomes
    pub fn chrom_count(&self) -> usize {
        self.sites.len()
    }

    /// Total number of sites across all chromosomes
    pub fn total_sites(&self) -> usize {
        self.sites.values().map(|v| v.len()).sum()
    }

    /// Lengths between consecutive sites of one chromosome
    pub fn fragment_lengths(&self, chrom: &str) -> Option<Vec<u64>> {
        self.sites_for(chrom)
            .map(|sites| sites.windows(2).map(|w| w[1].abs_diff(w[0])).collect())
    }
}
