//! BEDPE format adapter
//!
//! Parses the six leading coordinate columns of a BEDPE line with
//! zero-copy field splitting. Every other column is passthrough and is
//! written back byte for byte.

use crate::core::io::{is_comment_line, LineIterator};
use crate::core::{BedpeParseError, FragmentRef, PetEnd};
use memchr::memchr;
use std::io::{self, BufRead, Write};
use std::ops::Range;

/// Minimum number of columns of a BEDPE record
pub const BEDPE_MIN_FIELDS: usize = 6;

/// Zero-copy BEDPE record view for parsing
pub struct BedpeRecordView<'a> {
    line: &'a [u8],
    pub chrom1: &'a str,
    pub start1: u64,
    pub end1: u64,
    pub chrom2: &'a str,
    pub start2: u64,
    pub end2: u64,
    field_bounds: Vec<(usize, usize)>,
}

fn field_str<'a>(
    line: &'a [u8],
    bounds: (usize, usize),
    name: &'static str,
) -> Result<&'a str, BedpeParseError> {
    std::str::from_utf8(&line[bounds.0..bounds.1]).map_err(|_| BedpeParseError::InvalidUtf8(name))
}

fn field_u64(
    line: &[u8],
    bounds: (usize, usize),
    name: &'static str,
) -> Result<u64, BedpeParseError> {
    let s = field_str(line, bounds, name)?;
    s.parse()
        .map_err(|_| BedpeParseError::InvalidNumber(name, s.to_string()))
}

impl<'a> BedpeRecordView<'a> {
    /// Parse a BEDPE line, only the six coordinate columns are decoded
    pub fn parse(line: &'a [u8]) -> Result<Self, BedpeParseError> {
        if line.is_empty() {
            return Err(BedpeParseError::EmptyLine);
        }

        let mut field_bounds = Vec::with_capacity(12);
        let mut start_pos = 0;
        while let Some(tab_pos) = memchr(b'\t', &line[start_pos..]) {
            field_bounds.push((start_pos, start_pos + tab_pos));
            start_pos += tab_pos + 1;
        }
        field_bounds.push((start_pos, line.len()));

        if field_bounds.len() < BEDPE_MIN_FIELDS {
            return Err(BedpeParseError::TooFewFields {
                expected: BEDPE_MIN_FIELDS,
                found: field_bounds.len(),
            });
        }

        Ok(Self {
            line,
            chrom1: field_str(line, field_bounds[0], "chrom1")?,
            start1: field_u64(line, field_bounds[1], "start1")?,
            end1: field_u64(line, field_bounds[2], "end1")?,
            chrom2: field_str(line, field_bounds[3], "chrom2")?,
            start2: field_u64(line, field_bounds[4], "start2")?,
            end2: field_u64(line, field_bounds[5], "end2")?,
            field_bounds,
        })
    }

    /// Get the number of fields
    pub fn field_count(&self) -> usize {
        self.field_bounds.len()
    }

    /// Get field as string slice (lazy access)
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.field_bounds
            .get(index)
            .and_then(|(start, end)| std::str::from_utf8(&self.line[*start..*end]).ok())
    }
}

/// Owned BEDPE record handed to workers
///
/// Keeps the original line so passthrough columns are preserved exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    line: String,
    chrom1: Range<usize>,
    chrom2: Range<usize>,
    pub start1: u64,
    pub end1: u64,
    pub start2: u64,
    pub end2: u64,
}

impl PairRecord {
    /// Parse an owned line (without trailing newline)
    pub fn parse(line: String) -> Result<Self, BedpeParseError> {
        let (c1, c2, start1, end1, start2, end2) = {
            let view = BedpeRecordView::parse(line.as_bytes())?;
            (
                view.field_bounds[0],
                view.field_bounds[3],
                view.start1,
                view.end1,
                view.start2,
                view.end2,
            )
        };
        Ok(Self {
            chrom1: c1.0..c1.1,
            chrom2: c2.0..c2.1,
            start1,
            end1,
            start2,
            end2,
            line,
        })
    }

    pub fn chrom1(&self) -> &str {
        &self.line[self.chrom1.clone()]
    }

    pub fn chrom2(&self) -> &str {
        &self.line[self.chrom2.clone()]
    }

    /// The original line
    pub fn line(&self) -> &str {
        &self.line
    }

    /// First end as classifier input
    pub fn end1(&self) -> PetEnd<'_> {
        PetEnd::new(self.chrom1(), self.start1, self.end1)
    }

    /// Second end as classifier input
    pub fn end2(&self) -> PetEnd<'_> {
        PetEnd::new(self.chrom2(), self.start2, self.end2)
    }

    /// Write the record, appending `idx-side\tidx-side` when fragments were assigned
    pub fn write_annotated<W: Write>(
        &self,
        out: &mut W,
        fragments: Option<(FragmentRef, FragmentRef)>,
    ) -> io::Result<()> {
        out.write_all(self.line.as_bytes())?;
        if let Some((frag1, frag2)) = fragments {
            write!(out, "\t{}\t{}", frag1, frag2)?;
        }
        out.write_all(b"\n")
    }

    /// Whether end 1 sorts after end 2 by (chromosome, start)
    pub fn is_lower_triangle(&self) -> bool {
        (self.chrom1(), self.start1) > (self.chrom2(), self.start2)
    }

    /// Swap the two ends when needed so end 1 sorts first
    ///
    /// Strand columns (10 and 11) are swapped along with the coordinates.
    pub fn to_upper_triangle(self) -> Result<Self, BedpeParseError> {
        if !self.is_lower_triangle() {
            return Ok(self);
        }

        let view = BedpeRecordView::parse(self.line.as_bytes())?;
        let mut order: Vec<usize> = (0..view.field_count()).collect();
        order.swap(0, 3);
        order.swap(1, 4);
        order.swap(2, 5);
        if view.field_count() >= 10 {
            order.swap(8, 9);
        }

        let mut swapped = String::with_capacity(self.line.len());
        for (n, i) in order.into_iter().enumerate() {
            if n > 0 {
                swapped.push('\t');
            }
            swapped.push_str(view.field(i).unwrap_or(""));
        }
        PairRecord::parse(swapped)
    }

    /// Both ends lie within `distance` of the other record's ends
    pub fn is_replicate_of(&self, other: &PairRecord, distance: u64) -> bool {
        self.chrom1() == other.chrom1()
            && self.chrom2() == other.chrom2()
            && self.start1.abs_diff(other.start1) <= distance
            && self.end1.abs_diff(other.end1) <= distance
            && self.start2.abs_diff(other.start2) <= distance
            && self.end2.abs_diff(other.end2) <= distance
    }
}

/// Streaming BEDPE reader yielding owned records
///
/// Blank lines and `#` / `track` / `browser` lines are skipped. Parse
/// errors carry the 1-based line number.
pub struct BedpeReader<R: BufRead> {
    lines: LineIterator<R>,
}

impl<R: BufRead> BedpeReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LineIterator::new(reader),
        }
    }
}

impl<R: BufRead> Iterator for BedpeReader<R> {
    type Item = Result<PairRecord, BedpeParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() || is_comment_line(line) {
                continue;
            }
            let line = line.to_string();
            let line_number = self.lines.line_number();
            return Some(PairRecord::parse(line).map_err(|e| e.at_line(line_number)));
        }
    }
}
