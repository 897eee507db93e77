//! Visual comparison of reference PDFs against candidate renderings.
//!
//! Rasterizes every reference PDF and its candidate at the same relative
//! path, scores them page by page and writes:
//! - comparison-results.json (per-document scores)
//! - VISUAL-QUALITY-REPORT.md (human-readable report)
//! - diffs/ (similarity maps of pages scoring below 0.8)
//!
//! Usage:
//!   cargo run --bin compare_pdfs -- --reference ./reference-pdfs --candidate ./candidate-pdfs
//!   cargo run --bin compare_pdfs -- --reference ref --candidate out --output ./comparison --dpi 150
//!   cargo run --bin compare_pdfs -- --reference ref --candidate out --limit 20 --jobs 8
//!   cargo run --bin compare_pdfs -- --reference ref --candidate out --baseline previous/comparison-results.json
//!
//! Requires `pdftoppm` (poppler-utils) on PATH.

use pdf_parity::baseline::{compare_to_baseline, format_deltas};
use pdf_parity::batch::BatchRunner;
use pdf_parity::report::ComparisonSummary;
use pdf_parity::{CompareConfig, DocumentResult, DocumentStatus, Grade, PdftoppmRasterizer};
use std::path::PathBuf;

struct CliOptions {
    config: CompareConfig,
    baseline: Option<PathBuf>,
    verbose: bool,
}

impl CliOptions {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = CompareConfig::new();
        let mut baseline = None;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--reference" | "--candidate" | "--output" | "--dpi" | "--limit" | "--jobs"
                | "--baseline" => {
                    i += 1;
                    let value = args
                        .get(i)
                        .ok_or_else(|| format!("{} requires a value", flag))?
                        .clone();
                    config = match flag {
                        "--reference" => config.with_reference_dir(value),
                        "--candidate" => config.with_candidate_dir(value),
                        "--output" => config.with_output_dir(value),
                        "--dpi" => config.with_dpi(parse_number(flag, &value)?),
                        "--limit" => config.with_limit(Some(parse_number(flag, &value)?)),
                        "--jobs" => config.with_jobs(parse_number(flag, &value)?),
                        _ => {
                            baseline = Some(PathBuf::from(value));
                            config
                        },
                    };
                },
                "--no-diffs" => {
                    config = config.with_diffs(false);
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                },
                other => {
                    return Err(format!("unknown argument: {}", other));
                },
            }
            i += 1;
        }

        Ok(Self {
            config,
            baseline,
            verbose,
        })
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, value))
}

fn print_usage() {
    println!("Usage: compare_pdfs --reference <dir> --candidate <dir> [options]");
    println!();
    println!("Options:");
    println!("  --output <dir>      Output directory (default: ./comparison)");
    println!("  --dpi <n>           Rasterization DPI (default: 150)");
    println!("  --limit <n>         Compare at most n documents");
    println!("  --jobs <n>          Worker threads (default: 1)");
    println!("  --baseline <json>   Print score changes against a previous run");
    println!("  --no-diffs          Do not write diff images");
    println!("  -v, --verbose       Show per-page scores");
}

fn grade_icon(grade: Grade) -> &'static str {
    match grade {
        Grade::A => "🟢",
        Grade::B => "🔵",
        Grade::C => "🟡",
        Grade::D => "🟠",
        Grade::F => "🔴",
    }
}

fn print_result(done: usize, total: usize, result: &DocumentResult, verbose: bool) {
    // One print per document: workers share stdout.
    let mut out = match result.status() {
        DocumentStatus::Missing => {
            format!("[{}/{}] ❌ {}: no candidate PDF\n", done, total, result.name())
        },
        DocumentStatus::Error => format!(
            "[{}/{}] {} {}: error: {}\n",
            done,
            total,
            grade_icon(result.grade()),
            result.name(),
            result.error().unwrap_or("")
        ),
        _ => format!(
            "[{}/{}] {} {}: {} (SSIM: {:.2})\n",
            done,
            total,
            grade_icon(result.grade()),
            result.name(),
            result.grade(),
            result.avg_ssim()
        ),
    };

    if verbose {
        for page in result.pages() {
            let note = page.note().map(|n| format!(" {:?}", n)).unwrap_or_default();
            out.push_str(&format!(
                "        page {}: ssim {:.4}, size {:.4}{}\n",
                page.page_index(),
                page.ssim(),
                page.size_match(),
                note
            ));
        }
    }

    print!("{}", out);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match CliOptions::from_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(2);
        },
    };

    let rasterizer = PdftoppmRasterizer::new();
    match rasterizer.check_available() {
        Ok(version) => log::info!("Using {}", version),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        },
    }

    let config = &options.config;
    println!("🔍 Reference PDFs: {}", config.reference_dir.display());
    println!("📁 Candidate PDFs: {}", config.candidate_dir.display());
    println!();

    let runner = BatchRunner::new(config, &rasterizer);
    let results = match runner.run_with_progress(|done, total, result| {
        print_result(done, total, result, options.verbose)
    }) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        },
    };

    let summary = match runner.write_artifacts(results) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error writing reports: {}", e);
            std::process::exit(1);
        },
    };

    println!();
    println!("{}", "=".repeat(60));
    let grades = &summary.grades;
    println!(
        "📊 Results: A={} B={} C={} D={} F={}",
        grades.a, grades.b, grades.c, grades.d, grades.f
    );
    if summary.total > 0 {
        println!("✅ Pass rate: {:.1}%", grades.pass_rate());
    }
    println!("📁 Output: {}", config.output_dir.display());
    println!("{}", "=".repeat(60));

    if let Some(path) = &options.baseline {
        match ComparisonSummary::load(path) {
            Ok(baseline) => {
                println!();
                println!("Changes since {}:", path.display());
                print!("{}", format_deltas(&compare_to_baseline(&summary, &baseline)));
            },
            Err(e) => {
                eprintln!("Could not read baseline {}: {}", path.display(), e);
            },
        }
    }
}
