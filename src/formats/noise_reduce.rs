//! BEDPE noise reduction driver
//!
//! Runs the pipeline over a BEDPE file and produces three outputs:
//! `<output>` (normal), `<output>.sel` (self-ligation) and `<output>.re`
//! (re-ligation), plus a four-line count report.

use crate::core::{open_text, Category, PetDenoiseError, RestrictionSiteIndex};
use crate::formats::bedpe::BedpeReader;
use crate::pipeline::{self, merge_parts, NoiseReduceConfig, SinkSet, SummaryReport};
use log::{info, warn};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Default report file name
pub const DEFAULT_LOG_FILE: &str = "noise_reduce.log";

/// Statistics of a noise reduction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseReduceStats {
    pub report: SummaryReport,
    /// Records read from the input
    pub total: usize,
    /// Records dropped for lack of restriction sites
    pub skipped: u64,
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn category_suffix(category: Category) -> &'static str {
    match category {
        Category::Normal => "",
        Category::SelfLigation => ".sel",
        Category::ReLigation => ".re",
    }
}

/// Final output path of a category
pub fn category_output(output: &Path, category: Category) -> PathBuf {
    append_suffix(output, category_suffix(category))
}

/// Temporary partition of one worker for a category
fn worker_part(output: &Path, category: Category, worker: usize) -> PathBuf {
    append_suffix(
        output,
        &format!(".tmp{}.{}", category_suffix(category), worker),
    )
}

fn remove_parts(output: &Path, processes: usize) {
    for worker in 0..processes {
        for category in Category::ALL {
            let part = worker_part(output, category, worker);
            if part.exists() {
                if let Err(e) = std::fs::remove_file(&part) {
                    warn!("Failed to remove temporary file {}: {}", part.display(), e);
                }
            }
        }
    }
}

/// Concatenate every category's partitions into its final output
fn merge_categories(output: &Path, processes: usize) -> std::io::Result<()> {
    for category in Category::ALL {
        let parts: Vec<PathBuf> = (0..processes)
            .map(|worker| worker_part(output, category, worker))
            .collect();
        merge_parts(&parts, category_output(output, category))?;
    }
    Ok(())
}

/// Remove self-ligation and re-ligation PETs from a BEDPE file
///
/// # Arguments
/// * `input` - Input BEDPE file (plain, gzip or bzip2)
/// * `output` - Output path for normal PETs; `.sel` / `.re` are derived from it
/// * `index` - Restriction sites of the genome
/// * `config` - Threshold, worker count and chunk size
/// * `log_file` - Where the count report is written
pub fn noise_reduce_file<P: AsRef<Path>, Q: AsRef<Path>, L: AsRef<Path>>(
    input: P,
    output: Q,
    index: &RestrictionSiteIndex,
    config: &NoiseReduceConfig,
    log_file: L,
) -> Result<NoiseReduceStats, PetDenoiseError> {
    let output = output.as_ref();
    info!("noise reduce on file {}", input.as_ref().display());

    let records = BedpeReader::new(open_text(input.as_ref())?);
    let make_sinks = |worker: usize| -> std::io::Result<SinkSet<BufWriter<File>>> {
        let open = |category| -> std::io::Result<BufWriter<File>> {
            let file = File::create(worker_part(output, category, worker))?;
            Ok(BufWriter::with_capacity(128 * 1024, file))
        };
        Ok(SinkSet::new(
            open(Category::Normal)?,
            open(Category::SelfLigation)?,
            open(Category::ReLigation)?,
        ))
    };

    let outcome = match pipeline::run(index, records, config, make_sinks) {
        Ok(outcome) => outcome,
        Err(e) => {
            remove_parts(output, config.processes);
            return Err(e.into());
        }
    };
    drop(outcome.sinks);

    info!("merging temporary files.");
    if let Err(e) = merge_categories(output, config.processes) {
        remove_parts(output, config.processes);
        return Err(e.into());
    }

    if outcome.counts.skipped > 0 {
        warn!(
            "{} records skipped: chromosome not found in restriction sites",
            outcome.counts.skipped
        );
    }
    let report = SummaryReport::new(outcome.counts);
    report.log();
    report.write_report(log_file.as_ref())?;
    info!("Noise reduce done.");

    Ok(NoiseReduceStats {
        report,
        total: outcome.distributed.records,
        skipped: outcome.counts.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RawSites, SpanThreshold};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn test_index() -> RestrictionSiteIndex {
        let mut sites = HashMap::new();
        sites.insert("chr1".to_string(), vec![100, 200, 300]);
        RestrictionSiteIndex::build(RawSites {
            sites,
            rest_site_len: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_paths() {
        let out = Path::new("/data/pets.bedpe");
        assert_eq!(
            category_output(out, Category::SelfLigation),
            PathBuf::from("/data/pets.bedpe.sel")
        );
        assert_eq!(
            worker_part(out, Category::Normal, 2),
            PathBuf::from("/data/pets.bedpe.tmp.2")
        );
        assert_eq!(
            worker_part(out, Category::ReLigation, 0),
            PathBuf::from("/data/pets.bedpe.tmp.re.0")
        );
    }

    #[test]
    fn test_noise_reduce_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.bedpe");
        fs::write(
            &input,
            "chr1\t105\t140\tchr1\t150\t180\tsel\n\
             chr1\t170\t195\tchr1\t205\t240\tre\n\
             chr1\t105\t140\tchr1\t5000\t5050\tfar\n\
             chrUn\t105\t140\tchrUn\t150\t180\tunknown\n",
        )
        .unwrap();
        let output = dir.path().join("out.bedpe");
        let log_file = dir.path().join("noise_reduce.log");
        let config = NoiseReduceConfig {
            threshold: SpanThreshold::Span(1000),
            processes: 2,
            chunk_size: 1,
            channel_capacity: None,
        };

        let stats = noise_reduce_file(&input, &output, &test_index(), &config, &log_file).unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.report.counts.total(), 3);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "chr1\t105\t140\tchr1\t5000\t5050\tfar\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("out.bedpe.sel")).unwrap(),
            "chr1\t105\t140\tchr1\t150\t180\tsel\t1-s\t1-e\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("out.bedpe.re")).unwrap(),
            "chr1\t170\t195\tchr1\t205\t240\tre\t1-e\t2-s\n"
        );
        assert_eq!(
            fs::read_to_string(&log_file).unwrap(),
            "normal\t1\nself-ligation\t1\nre-ligation\t1\ntotal\t3\n"
        );
        assert!(!dir.path().join("out.bedpe.tmp.0").exists());
        assert!(!dir.path().join("out.bedpe.tmp.sel.1").exists());
    }

    #[test]
    fn test_noise_reduce_file_merge_failure_cleans_up() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.bedpe");
        fs::write(&input, "chr1\t105\t140\tchr1\t150\t180\tsel\n").unwrap();
        let output = dir.path().join("out.bedpe");
        fs::create_dir(category_output(&output, Category::SelfLigation)).unwrap();
        let config = NoiseReduceConfig {
            processes: 2,
            ..Default::default()
        };

        let result = noise_reduce_file(
            &input,
            &output,
            &test_index(),
            &config,
            dir.path().join("log"),
        );

        assert!(matches!(result, Err(PetDenoiseError::Io(_))));
        for category in Category::ALL {
            for worker in 0..2 {
                assert!(!worker_part(&output, category, worker).exists());
            }
        }
    }

    #[test]
    fn test_failure_removes_temporary_files() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.bedpe");
        fs::write(&input, "chr1\t150\t160\tchr1\t170\t200\n").unwrap();
        let output = dir.path().join("out.bedpe");
        let config = NoiseReduceConfig {
            threshold: SpanThreshold::ForceCheck,
            ..Default::default()
        };

        let result = noise_reduce_file(
            &input,
            &output,
            &test_index(),
            &config,
            dir.path().join("log"),
        );

        assert!(matches!(result, Err(PetDenoiseError::Pipeline(_))));
        assert!(!dir.path().join("out.bedpe.tmp.0").exists());
        assert!(!output.exists());
    }
}
