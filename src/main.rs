//! pet-denoise CLI entry point
//!
//! Restriction fragment based noise reduction for paired-end tags.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pet_denoise::core::{RestrictionSiteIndex, SpanThreshold};
use pet_denoise::formats::{self, FragmentLengthSummary};
use pet_denoise::pipeline::{NoiseReduceConfig, DEFAULT_CHUNK_SIZE};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pet-denoise")]
#[command(about = "Remove self-ligation and re-ligation noise from PETs")]
#[command(version)]
#[command(author = "pet-denoise Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a BEDPE file into normal, self-ligation and re-ligation PETs
    NoiseReduce {
        /// Input BEDPE file (plain, gzip or bzip2)
        bedpe: PathBuf,
        /// Output file for normal PETs; <output>.sel and <output>.re are written next to it
        output: PathBuf,
        /// Restriction sites BED file
        #[arg(short = 'r', long)]
        restriction: PathBuf,
        /// Number of worker threads
        #[arg(short = 'p', long, default_value = "1")]
        processes: usize,
        /// PETs with starts farther apart are normal without fragment lookup; -1 forces checking
        #[arg(
            short = 's',
            long = "threshold-span",
            default_value = "1000",
            allow_negative_numbers = true
        )]
        threshold_span: i64,
        /// Records per task chunk
        #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Count report file
        #[arg(long = "log-file", default_value = formats::DEFAULT_LOG_FILE)]
        log_file: PathBuf,
    },
    /// Remove redundant PETs whose ends lie within a distance of each other
    RemoveRedundancy {
        /// Input BEDPE file
        input: PathBuf,
        /// Output BEDPE file
        output: PathBuf,
        /// Maximum coordinate difference of replicates
        #[arg(short = 'd', long, default_value_t = formats::DEFAULT_DISTANCE)]
        distance: u64,
    },
    /// Write the restriction fragment length table
    FragLen {
        /// Restriction sites BED file
        restriction: PathBuf,
        /// Output table
        output: PathBuf,
    },
}

fn load_sites(path: &PathBuf) -> anyhow::Result<RestrictionSiteIndex> {
    let start = Instant::now();
    eprintln!("Loading restriction sites: {:?}", path);

    let index = RestrictionSiteIndex::from_bed_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load restriction sites: {}", e))?;

    eprintln!(
        "{} sites on {} chromosomes loaded in {:.2}s",
        index.total_sites(),
        index.chrom_count(),
        start.elapsed().as_secs_f64()
    );
    Ok(index)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::NoiseReduce {
            bedpe,
            output,
            restriction,
            processes,
            threshold_span,
            chunk_size,
            log_file,
        } => {
            let threshold = SpanThreshold::from_raw(threshold_span).ok_or_else(|| {
                anyhow::anyhow!("threshold span must be -1 or non-negative, got {}", threshold_span)
            })?;
            let index = load_sites(&restriction)?;
            let config = NoiseReduceConfig {
                threshold,
                processes,
                chunk_size,
                channel_capacity: None,
            };

            eprintln!("Noise reducing: {:?} -> {:?}", bedpe, output);
            let stats = formats::noise_reduce_file(&bedpe, &output, &index, &config, &log_file)
                .with_context(|| format!("noise reduce failed on {:?}", bedpe))?;
            let counts = stats.report.counts;

            eprintln!("\n=== Noise Reduce Statistics ===");
            eprintln!("Total records:   {}", stats.total);
            eprintln!("Normal:          {}", counts.normal);
            eprintln!("Self-ligation:   {}", counts.self_ligation);
            eprintln!("Re-ligation:     {}", counts.re_ligation);
            eprintln!("Skipped:         {}", stats.skipped);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::RemoveRedundancy {
            input,
            output,
            distance,
        } => {
            eprintln!("Removing redundancy: {:?} -> {:?} (distance={})", input, output, distance);
            let stats = formats::remove_redundancy_file(&input, &output, distance)
                .with_context(|| format!("redundancy removal failed on {:?}", input))?;

            eprintln!("\n=== Redundancy Statistics ===");
            eprintln!("Total records:   {}", stats.total);
            eprintln!("Kept:            {}", stats.kept);
            eprintln!("Removed:         {}", stats.removed);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::FragLen {
            restriction,
            output,
        } => {
            let index = load_sites(&restriction)?;
            let table = formats::fragment_length_table(&index);
            formats::write_fragment_lengths(&output, &table)
                .with_context(|| format!("failed to write {:?}", output))?;

            eprintln!("\n=== Fragment Length Statistics ===");
            match FragmentLengthSummary::from_table(&table) {
                Some(summary) => {
                    summary.log();
                    eprintln!("Fragments:       {}", summary.count);
                    eprintln!("Min:             {}", summary.min);
                    eprintln!("Median:          {:.1}", summary.median);
                    eprintln!("Mean:            {:.1}", summary.mean);
                    eprintln!("Max:             {}", summary.max);
                }
                None => eprintln!("Fragments:       0"),
            }
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
