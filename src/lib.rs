//! pet-denoise - Restriction fragment based PET noise reduction
//!
//! Removes self-ligation and re-ligation artifacts from paired-end tags
//! of proximity-ligation experiments (Hi-C, ChIA-PET).
//!
//! # Features
//!
//! - Binary search fragment assignment against a restriction site index
//! - Parallel classification with a bounded worker pool
//! - Support for compressed BEDPE input (gzip, bzip2)
//! - Redundant PET removal and fragment length tables
//!
//! # Example
//!
//! ```ignore
//! use pet_denoise::{noise_reduce_file, NoiseReduceConfig, RestrictionSiteIndex};
//!
//! // Load restriction sites
//! let index = RestrictionSiteIndex::from_bed_file("hg38.MboI.bed")?;
//!
//! // Split PETs into <out>, <out>.sel and <out>.re
//! let stats = noise_reduce_file(
//!     "pets.bedpe",
//!     "pets.nr.bedpe",
//!     &index,
//!     &NoiseReduceConfig::default(),
//!     "noise_reduce.log",
//! )?;
//! ```

pub mod core;
pub mod formats;
pub mod pipeline;

// Re-export commonly used types
pub use self::core::{
    classify, locate, BedpeParseError, Category, Classification, ClassifyError, FragmentRef,
    LocateError, PetDenoiseError, PetEnd, PipelineError, RestrictionSiteIndex, Side,
    SiteLoadError, SpanThreshold,
};
pub use formats::{noise_reduce_file, remove_redundancy_file, BedpeReader, PairRecord};
pub use pipeline::{ClassCounts, NoiseReduceConfig, SummaryReport};
