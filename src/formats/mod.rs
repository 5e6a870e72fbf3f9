//! File format adapters
//!
//! BEDPE parsing plus the file-level drivers (noise reduction, redundancy
//! removal, fragment length table).

pub mod bedpe;
pub mod frag_len;
pub mod noise_reduce;
pub mod redundancy;

pub use bedpe::{BedpeReader, BedpeRecordView, PairRecord, BEDPE_MIN_FIELDS};
pub use frag_len::{
    fragment_length_table, load_fragment_lengths, write_fragment_lengths, FragmentLengthSummary,
    FragmentLengthTable,
};
pub use noise_reduce::{category_output, noise_reduce_file, NoiseReduceStats, DEFAULT_LOG_FILE};
pub use redundancy::{
    dedup_sorted, remove_redundancy_file, sort_pairs, RedundancyStats, DEFAULT_DISTANCE,
};
