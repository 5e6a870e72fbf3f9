//! Restriction fragment assignment
//!
//! Maps one PET end onto the restriction fragment it belongs to:
//! 1. Derive two search points, the interval start and `end - rest_site_len - 1`
//! 2. Binary search both against the chromosome's sites (right-biased)
//! 3. When both land in the same gap, pick the side by midpoint distance
//! 4. When the interval straddles a site, attribute it to the nearer boundary
//!
//! The side tag is only meaningful for adjacency comparison between two ends.

use crate::core::error::LocateError;
use std::fmt;

/// Which restriction site of a fragment an interval is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Closer to the fragment's start-adjacent site
    Start,
    /// Closer to the fragment's end-adjacent site
    End,
}

impl Side {
    /// Convert to the single character used in annotations
    pub fn to_char(&self) -> char {
        match self {
            Side::Start => 's',
            Side::End => 'e',
        }
    }
}

/// Fragment assignment of one interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentRef {
    /// Insertion index among the chromosome's sites
    pub index: usize,
    pub side: Side,
}

impl FragmentRef {
    pub fn new(index: usize, side: Side) -> Self {
        Self { index, side }
    }
}

impl fmt::Display for FragmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.index, self.side.to_char())
    }
}

/// Index of the first site strictly greater than `pos`
#[inline]
fn search_right(sites: &[u64], pos: u64) -> usize {
    sites.partition_point(|&site| site <= pos)
}

/// Assign the interval `[start, end)` to a restriction fragment
///
/// # Errors
/// `LocateError::IntervalTooShort` when `start >= end - rest_site_len - 1`.
///
/// # Examples
/// ```
/// use pet_denoise::core::{locate, FragmentRef, Side};
///
/// let sites = [100, 200, 300];
/// let frag = locate(&sites, 10, 150, 180).unwrap();
/// assert_eq!(frag, FragmentRef::new(1, Side::End));
/// ```
pub fn locate(
    sites: &[u64],
    rest_site_len: u64,
    start: u64,
    end: u64,
) -> Result<FragmentRef, LocateError> {
    let end_search_point = end
        .checked_sub(rest_site_len + 1)
        .filter(|&point| start < point)
        .ok_or(LocateError::IntervalTooShort {
            start,
            end,
            rest_site_len,
        })?;

    let idx_s = search_right(sites, start);
    let idx_e = search_right(sites, end_search_point);
    let n = sites.len();

    if idx_s == idx_e {
        // Both search points fall into the same gap
        let side = if idx_s == 0 {
            Side::End
        } else if idx_s == n {
            Side::Start
        } else {
            let mid = ((start + end) / 2) as i64;
            let left_span = mid - sites[idx_s - 1] as i64;
            let right_span = sites[idx_s] as i64 - mid;
            if left_span < right_span {
                Side::Start
            } else {
                Side::End
            }
        };
        return Ok(FragmentRef::new(idx_s, side));
    }

    // The interval straddles at least one site
    if idx_s == 0 {
        Ok(FragmentRef::new(idx_s, Side::End))
    } else if idx_e == n {
        Ok(FragmentRef::new(idx_e, Side::Start))
    } else {
        let left_span = start as i64 - sites[idx_s - 1] as i64;
        let right_span = sites[idx_e] as i64 - end_search_point as i64 - 1;
        // Equal spans fall through to the end side
        if left_span < right_span {
            Ok(FragmentRef::new(idx_s, Side::Start))
        } else {
            Ok(FragmentRef::new(idx_e, Side::End))
        }
    }
}
