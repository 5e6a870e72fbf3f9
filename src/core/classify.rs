//! PET interaction classification
//!
//! Separates real long-range interactions from the two artifacts left by
//! incomplete digestion:
//!
//! ```text
//! self-ligation: both ends on the same fragment
//!
//!             PET1 (frag n)      PET2 (frag n)
//!             --------           --------
//!   genome <--*------------...-----------*-->
//!
//! re-ligation: ends on adjacent fragments, touching the shared site
//!
//!                                 PET2 (frag n+1)
//!                                 --------
//!                        --------
//!                        PET1 (frag n)
//!   genome <---------------------*------------->
//! ```

use crate::core::error::ClassifyError;
use crate::core::fragment::{locate, FragmentRef, Side};
use crate::core::sites::RestrictionSiteIndex;
use std::fmt;

/// Distance filter applied before fragment assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanThreshold {
    /// Always assign both ends to fragments, never short-circuit
    ForceCheck,
    /// Pairs whose starts are farther apart than this are normal without lookup
    Span(u64),
}

impl SpanThreshold {
    /// Interpret a raw command line value, where `-1` forces checking
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            -1 => Some(SpanThreshold::ForceCheck),
            v if v >= 0 => Some(SpanThreshold::Span(v as u64)),
            _ => None,
        }
    }
}

impl Default for SpanThreshold {
    fn default() -> Self {
        SpanThreshold::Span(1000)
    }
}

/// Interaction category of a PET
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Normal,
    SelfLigation,
    ReLigation,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Category; 3] = [Category::Normal, Category::SelfLigation, Category::ReLigation];

    /// Name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Normal => "normal",
            Category::SelfLigation => "self-ligation",
            Category::ReLigation => "re-ligation",
        }
    }

    /// Position in [`Category::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Category::Normal => 0,
            Category::SelfLigation => 1,
            Category::ReLigation => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One PET end as seen by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetEnd<'a> {
    pub chrom: &'a str,
    pub start: u64,
    pub end: u64,
}

impl<'a> PetEnd<'a> {
    pub fn new(chrom: &'a str, start: u64, end: u64) -> Self {
        Self { chrom, start, end }
    }
}

/// Classification verdict, with fragments when they were assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub fragments: Option<(FragmentRef, FragmentRef)>,
}

impl Classification {
    fn unmapped(category: Category) -> Self {
        Self {
            category,
            fragments: None,
        }
    }

    fn mapped(category: Category, frag1: FragmentRef, frag2: FragmentRef) -> Self {
        Self {
            category,
            fragments: Some((frag1, frag2)),
        }
    }
}

/// Assign one end to its fragment, failing on unknown chromosomes
fn locate_end(index: &RestrictionSiteIndex, end: &PetEnd) -> Result<FragmentRef, ClassifyError> {
    let sites = index
        .sites_for(end.chrom)
        .ok_or_else(|| ClassifyError::UnknownChromosome(end.chrom.to_string()))?;
    Ok(locate(sites, index.rest_site_len(), end.start, end.end)?)
}

/// Decide the category of a fragment pair on one chromosome
pub fn categorize(frag1: FragmentRef, frag2: FragmentRef) -> Category {
    if frag1.index == frag2.index {
        Category::SelfLigation
    } else if frag2.index == frag1.index + 1
        && frag2.side == Side::Start
        && frag1.side == Side::End
    {
        Category::ReLigation
    } else {
        Category::Normal
    }
}

/// Classify a PET
///
/// Rules, in order:
/// 1. Ends on different chromosomes are normal; fragments are only
///    assigned under [`SpanThreshold::ForceCheck`].
/// 2. Same chromosome with `|start1 - start2|` above the threshold is
///    normal without any lookup.
/// 3. Otherwise both ends are assigned and compared with [`categorize`].
pub fn classify(
    index: &RestrictionSiteIndex,
    end1: &PetEnd,
    end2: &PetEnd,
    threshold: SpanThreshold,
) -> Result<Classification, ClassifyError> {
    if end1.chrom != end2.chrom {
        return match threshold {
            SpanThreshold::Span(_) => Ok(Classification::unmapped(Category::Normal)),
            SpanThreshold::ForceCheck => {
                let frag1 = locate_end(index, end1)?;
                let frag2 = locate_end(index, end2)?;
                Ok(Classification::mapped(Category::Normal, frag1, frag2))
            }
        };
    }

    if let SpanThreshold::Span(max_span) = threshold {
        if end1.start.abs_diff(end2.start) > max_span {
            return Ok(Classification::unmapped(Category::Normal));
        }
    }

    let frag1 = locate_end(index, end1)?;
    let frag2 = locate_end(index, end2)?;
    Ok(Classification::mapped(categorize(frag1, frag2), frag1, frag2))
}
