//! Core fragment assignment functionality
//!
//! This module contains the restriction site index, the fragment
//! locator and the interaction classifier.

mod classify;
mod error;
mod fragment;
pub mod io;
mod sites;

pub use classify::{categorize, classify, Category, Classification, PetEnd, SpanThreshold};
pub use error::{
    BedpeParseError, ClassifyError, LocateError, PetDenoiseError, PipelineError, PipelineResult,
    Result, SiteLoadError, SiteResult,
};
pub use fragment::{locate, FragmentRef, Side};
pub use io::{
    detect_compression, open_text, CompressionFormat, LineIterator, TextReader,
    DEFAULT_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use sites::{BedSites, RawSites, RestrictionSiteIndex, SiteSource};
