//! Chunked work distribution
//!
//! Cuts the record stream into bounded chunks and feeds the task channel.
//! The channel is bounded, so sending blocks once workers fall behind.

use crate::core::{BedpeParseError, PipelineError, PipelineResult};
use crate::formats::bedpe::PairRecord;
use crate::pipeline::Task;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default number of records per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Groups a record stream into chunks of at most `chunk_size` records
pub struct ChunkReader<I> {
    records: I,
    chunk_size: usize,
}

impl<I> ChunkReader<I>
where
    I: Iterator<Item = Result<PairRecord, BedpeParseError>>,
{
    pub fn new(records: I, chunk_size: usize) -> Self {
        Self {
            records,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Next chunk, or `None` once the stream is exhausted
    ///
    /// Never yields an empty chunk.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<PairRecord>>, BedpeParseError> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        for record in self.records.by_ref() {
            chunk.push(record?);
            if chunk.len() == self.chunk_size {
                break;
            }
        }
        Ok(if chunk.is_empty() { None } else { Some(chunk) })
    }
}

/// Counts reported by [`distribute`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DistributeStats {
    pub chunks: usize,
    pub records: usize,
}

/// Send every chunk, then one shutdown signal per worker
///
/// Stops early, still signalling shutdown, when `abort` is raised by a
/// failing worker. A parse error returns immediately; dropping the sender
/// then closes the channel for the workers.
pub fn distribute<I>(
    records: I,
    chunk_size: usize,
    tasks: &Sender<Task>,
    workers: usize,
    abort: &AtomicBool,
) -> PipelineResult<DistributeStats>
where
    I: Iterator<Item = Result<PairRecord, BedpeParseError>>,
{
    let mut reader = ChunkReader::new(records, chunk_size);
    let mut stats = DistributeStats::default();

    while !abort.load(Ordering::Relaxed) {
        let chunk = match reader.next_chunk()? {
            Some(chunk) => chunk,
            None => break,
        };
        stats.chunks += 1;
        stats.records += chunk.len();
        tasks
            .send(Task::Chunk(chunk))
            .map_err(|_| PipelineError::WorkersGone)?;
    }

    for _ in 0..workers {
        tasks
            .send(Task::Shutdown)
            .map_err(|_| PipelineError::WorkersGone)?;
    }

    Ok(stats)
}
