//! Parallel noise reduction pipeline
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────┐    ┌────────────┐
//! │ Distributor │───>│ Task channel │───>│ Worker pool  │───>│ Aggregator │
//! │  (chunks)   │    │  (bounded)   │    │ (P threads)  │    │            │
//! └─────────────┘    └──────────────┘    └──────────────┘    └────────────┘
//! ```
//!
//! The restriction site index is shared read-only by every worker. Each
//! worker writes only to its own sinks and merges its local counts into
//! the shared counters once, when it receives its shutdown signal.

pub mod aggregate;
pub mod distributor;
mod worker;

pub use aggregate::{merge_parts, SummaryReport};
pub use distributor::{distribute, ChunkReader, DistributeStats, DEFAULT_CHUNK_SIZE};
pub use worker::SinkSet;

use crate::core::{
    BedpeParseError, Category, PipelineError, PipelineResult, RestrictionSiteIndex, SpanThreshold,
};
use crate::formats::bedpe::PairRecord;
use crossbeam_channel::bounded;
use log::info;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use worker::Worker;

/// Message on the task channel
#[derive(Debug)]
pub enum Task {
    /// A chunk of records to classify
    Chunk(Vec<PairRecord>),
    /// Flush sinks, merge counts and exit
    Shutdown,
}

/// Per-category record counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassCounts {
    pub normal: u64,
    pub self_ligation: u64,
    pub re_ligation: u64,
    /// Records dropped because a chromosome had no restriction sites
    pub skipped: u64,
}

impl ClassCounts {
    pub fn add(&mut self, category: Category) {
        match category {
            Category::Normal => self.normal += 1,
            Category::SelfLigation => self.self_ligation += 1,
            Category::ReLigation => self.re_ligation += 1,
        }
    }

    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Normal => self.normal,
            Category::SelfLigation => self.self_ligation,
            Category::ReLigation => self.re_ligation,
        }
    }

    pub fn merge(&mut self, other: &ClassCounts) {
        self.normal += other.normal;
        self.self_ligation += other.self_ligation;
        self.re_ligation += other.re_ligation;
        self.skipped += other.skipped;
    }

    /// Classified records, skipped ones excluded
    pub fn total(&self) -> u64 {
        self.normal + self.self_ligation + self.re_ligation
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "normal={} self-ligation={} re-ligation={} skipped={}",
            self.normal, self.self_ligation, self.re_ligation, self.skipped
        )
    }
}

/// Noise reduction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseReduceConfig {
    pub threshold: SpanThreshold,
    /// Number of workers
    pub processes: usize,
    /// Records per chunk
    pub chunk_size: usize,
    /// Task channel capacity in chunks, `None` for twice the worker count
    pub channel_capacity: Option<usize>,
}

impl Default for NoiseReduceConfig {
    fn default() -> Self {
        Self {
            threshold: SpanThreshold::default(),
            processes: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            channel_capacity: None,
        }
    }
}

impl NoiseReduceConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.processes == 0 {
            return Err(PipelineError::InvalidConfig(
                "processes must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(2 * self.processes)
    }
}

/// Raises the abort flag when a worker exits unsuccessfully, unwinding included
struct AbortGuard<'a> {
    abort: &'a AtomicBool,
    disarmed: bool,
}

impl<'a> AbortGuard<'a> {
    fn new(abort: &'a AtomicBool) -> Self {
        Self {
            abort,
            disarmed: false,
        }
    }
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if !self.disarmed {
            self.abort.store(true, Ordering::Relaxed);
        }
    }
}

/// Result of a pipeline run
pub struct PipelineOutput<W> {
    /// Merged counts of all workers
    pub counts: ClassCounts,
    /// Sinks of each worker, in worker order, each in category order
    pub sinks: Vec<[W; 3]>,
    pub distributed: DistributeStats,
}

/// Classify a record stream with a pool of `config.processes` workers
///
/// `make_sinks` is called once per worker id, before any worker starts.
/// Any worker failure aborts the run; no partial result is returned.
pub fn run<I, W, F>(
    index: &RestrictionSiteIndex,
    records: I,
    config: &NoiseReduceConfig,
    make_sinks: F,
) -> PipelineResult<PipelineOutput<W>>
where
    I: Iterator<Item = Result<PairRecord, BedpeParseError>>,
    W: Write + Send,
    F: FnMut(usize) -> io::Result<SinkSet<W>>,
{
    config.validate()?;

    let sink_sets = (0..config.processes)
        .map(make_sinks)
        .collect::<io::Result<Vec<_>>>()?;
    let (tx, rx) = bounded::<Task>(config.channel_capacity());
    let shared = Mutex::new(ClassCounts::default());
    let abort = AtomicBool::new(false);

    info!("{} workers spawned for noise reduce", sink_sets.len());

    let (distributed, joined) = thread::scope(|scope| {
        let handles: Vec<_> = sink_sets
            .into_iter()
            .enumerate()
            .map(|(id, sinks)| {
                let tasks = rx.clone();
                let (shared, abort) = (&shared, &abort);
                let worker = Worker::new(id, index, config.threshold, sinks);
                scope.spawn(move || {
                    let mut guard = AbortGuard::new(abort);
                    let result = worker.run(&tasks, shared);
                    guard.disarmed = result.is_ok();
                    result
                })
            })
            .collect();
        drop(rx);

        let distributed = distribute(records, config.chunk_size, &tx, handles.len(), &abort);
        drop(tx);

        let joined: Vec<PipelineResult<[W; 3]>> = handles
            .into_iter()
            .enumerate()
            .map(|(id, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(PipelineError::WorkerPanicked(id)))
            })
            .collect();
        (distributed, joined)
    });

    let sinks = joined.into_iter().collect::<PipelineResult<Vec<_>>>()?;
    let distributed = distributed?;

    Ok(PipelineOutput {
        counts: shared.into_inner().unwrap_or_else(PoisonError::into_inner),
        sinks,
        distributed,
    })
}
