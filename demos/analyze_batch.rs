//! Example: Estimate tempo for many files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] [--fast] <file>...
//!
//! One pipeline runs per file on a rayon pool; a single file is never split
//! across workers. `--json` prints one estimate per line (JSONL) with a `file`
//! key added.

use std::time::Instant;

use rayon::prelude::*;
use serde_json::json;
use tempo_dsp::{analyze_file, AnalysisConfig, TempoEstimate};

struct Options {
    jobs: usize,
    json: bool,
    fast: bool,
    files: Vec<String>,
}

fn parse_options() -> Result<Option<Options>, Box<dyn std::error::Error>> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1);
    let mut options = Options {
        jobs: workers,
        json: false,
        fast: false,
        files: Vec::new(),
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--fast" => options.fast = true,
            "--jobs" => {
                let value = args.next().ok_or("--jobs requires a value")?;
                options.jobs = value.parse::<usize>()?.max(1);
            }
            "-h" | "--help" => return Ok(None),
            _ => options.files.push(arg),
        }
    }
    Ok(Some(options))
}

fn print_summary(times_ms: &mut [f32], total: usize, wall_ms: f64) {
    eprintln!("Finished {}/{} files in {:.0} ms", times_ms.len(), total, wall_ms);
    if times_ms.is_empty() {
        return;
    }
    times_ms.sort_by(|a, b| a.total_cmp(b));
    let at = |q: f32| times_ms[((times_ms.len() - 1) as f32 * q).round() as usize];
    let mean = times_ms.iter().sum::<f32>() / times_ms.len() as f32;
    eprintln!(
        "Per-file analysis ms: mean {:.1}, median {:.1}, p90 {:.1}, max {:.1}",
        mean,
        at(0.5),
        at(0.9),
        at(1.0)
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let Some(options) = parse_options()? else {
        eprintln!("Usage: analyze_batch [--jobs N] [--json] [--fast] <file>...");
        return Ok(());
    };
    if options.files.is_empty() {
        eprintln!("No input files. Use --help for usage.");
        std::process::exit(2);
    }

    let config = if options.fast {
        AnalysisConfig::fast(10.0)
    } else {
        AnalysisConfig::default()
    };
    eprintln!("Analysing {} files on {} workers", options.files.len(), options.jobs);

    let started = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()?;
    let results: Vec<Result<TempoEstimate, String>> = pool.install(|| {
        options
            .files
            .par_iter()
            .map(|file| analyze_file(file, config.clone()).map_err(|e| e.to_string()))
            .collect()
    });

    for (file, result) in options.files.iter().zip(&results) {
        match result {
            Ok(estimate) if options.json => {
                let mut record = serde_json::to_value(estimate)?;
                record["file"] = json!(file);
                println!("{}", record);
            }
            Ok(estimate) => println!(
                "{}\t{:.2} BPM\tconfidence {:.2}",
                file, estimate.bpm, estimate.confidence
            ),
            Err(e) if options.json => println!("{}", json!({ "file": file, "error": e })),
            Err(e) => println!("{}\terror: {}", file, e),
        }
    }

    let mut times_ms: Vec<f32> = results
        .iter()
        .flatten()
        .map(|estimate| estimate.metadata.processing_time_ms)
        .collect();
    print_summary(&mut times_ms, results.len(), started.elapsed().as_secs_f64() * 1000.0);

    Ok(())
}
