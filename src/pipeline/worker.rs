//! Classification worker
//!
//! Each worker owns its three category sinks for its whole lifetime and
//! counts locally; the shared counters are touched once, at shutdown.

use crate::core::{
    classify, Category, ClassifyError, FragmentRef, PipelineError, PipelineResult,
    RestrictionSiteIndex, SpanThreshold,
};
use crate::formats::bedpe::PairRecord;
use crate::pipeline::{ClassCounts, Task};
use crossbeam_channel::Receiver;
use log::{debug, warn};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// One output sink per category, exclusively owned by a worker
pub struct SinkSet<W: Write> {
    sinks: [W; 3],
}

impl<W: Write> SinkSet<W> {
    pub fn new(normal: W, self_ligation: W, re_ligation: W) -> Self {
        Self {
            sinks: [normal, self_ligation, re_ligation],
        }
    }

    /// Write a record to the sink of its category
    pub fn write_record(
        &mut self,
        category: Category,
        record: &PairRecord,
        fragments: Option<(FragmentRef, FragmentRef)>,
    ) -> io::Result<()> {
        record.write_annotated(&mut self.sinks[category.index()], fragments)
    }

    /// Flush every sink and hand them back in category order
    pub fn finish(mut self) -> io::Result<[W; 3]> {
        for sink in self.sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(self.sinks)
    }
}

pub(crate) struct Worker<'a, W: Write> {
    id: usize,
    index: &'a RestrictionSiteIndex,
    threshold: SpanThreshold,
    sinks: SinkSet<W>,
    local: ClassCounts,
}

impl<'a, W: Write> Worker<'a, W> {
    pub(crate) fn new(
        id: usize,
        index: &'a RestrictionSiteIndex,
        threshold: SpanThreshold,
        sinks: SinkSet<W>,
    ) -> Self {
        Self {
            id,
            index,
            threshold,
            sinks,
            local: ClassCounts::default(),
        }
    }

    /// Consume tasks until shutdown, then merge local counts into `shared`
    ///
    /// A closed channel is treated like a shutdown signal.
    pub(crate) fn run(
        mut self,
        tasks: &Receiver<Task>,
        shared: &Mutex<ClassCounts>,
    ) -> PipelineResult<[W; 3]> {
        while let Ok(Task::Chunk(chunk)) = tasks.recv() {
            self.process_chunk(&chunk)?;
        }

        let writers = self.sinks.finish()?;
        shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(&self.local);
        debug!("Worker-{} done: {}", self.id, self.local);
        Ok(writers)
    }

    fn process_chunk(&mut self, chunk: &[PairRecord]) -> PipelineResult<()> {
        for record in chunk {
            match classify(self.index, &record.end1(), &record.end2(), self.threshold) {
                Ok(verdict) => {
                    self.sinks
                        .write_record(verdict.category, record, verdict.fragments)?;
                    self.local.add(verdict.category);
                }
                Err(ClassifyError::UnknownChromosome(chrom)) => {
                    warn!("Chromosome not found in restriction sites: {}", chrom);
                    self.local.skipped += 1;
                }
                Err(ClassifyError::Locate(source)) => {
                    return Err(PipelineError::Locate {
                        worker: self.id,
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}
