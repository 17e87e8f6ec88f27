//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--json] [--full] <file>
//!
//! `--full` analyses the whole file instead of the first 15 seconds.
//! Set `RUST_LOG=info` to see each pipeline stage.

use std::env;

use tempo_dsp::{analyze_file_with_observer, AnalysisConfig, LogObserver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut full = false;
    let mut path: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--full" => full = true,
            _ => path = Some(arg),
        }
    }

    let Some(path) = path else {
        eprintln!("Usage: analyze_file [--json] [--full] <file>");
        std::process::exit(2);
    };

    let config = AnalysisConfig {
        max_analysis_seconds: if full { None } else { Some(15.0) },
        ..AnalysisConfig::default()
    };

    let estimate = analyze_file_with_observer(&path, config, &LogObserver)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!("Analysis Results for {}:", path);
    println!("  BPM: {:.2} (confidence: {:.2})", estimate.bpm, estimate.confidence);
    let methods = [
        ("beat track", estimate.method1_bpm),
        ("periodicity prior", estimate.method2_bpm),
        ("periodicity distribution", estimate.method3_bpm),
    ];
    for (name, bpm) in methods {
        if let Some(bpm) = bpm {
            println!("    {}: {:.2}", name, bpm);
        }
    }
    if let Some(correction) = estimate.metadata.octave_correction {
        println!("  Octave correction: {:?}", correction);
    }
    println!(
        "  Duration: {:.2}s{}",
        estimate.duration_seconds,
        if estimate.metadata.truncated { " (truncated)" } else { "" }
    );
    println!("  Processing time: {:.2} ms", estimate.metadata.processing_time_ms);
    for warning in &estimate.metadata.warnings {
        println!("  Warning: {}", warning);
    }

    Ok(())
}
