// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagesense — batch PDF text extraction with automatic scanned/digital routing.
//
// Entry point. Parses arguments, initialises logging, builds the extraction
// router and runs every input PDF through it sequentially.

mod report;
mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use pagesense_core::error::Result;
use pagesense_document::extract::ExtractionRouter;
use tracing::{error, info};

use report::DocumentOutcome;
use services::pipeline::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "pagesense",
    version,
    about = "Extract text from PDFs, routing each to the text layer or OCR",
    after_help = "EXAMPLES:\n  \
                  pagesense samples/\n  \
                  pagesense samples/sample.pdf --output-dir results/\n  \
                  pagesense scans/ --script latin --dpi 200 --model-dir ~/.cache/ocrs"
)]
struct Args {
    /// PDF file or directory containing PDFs
    input: PathBuf,

    /// Directory to save results
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Suppress progress output
    #[arg(long)]
    quiet: bool,

    /// JSON pipeline configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render resolution for OCR
    #[arg(long)]
    dpi: Option<u32>,

    /// Pixels added around each region before recognition
    #[arg(long)]
    margin: Option<u32>,

    /// Minimum column gap as a fraction of page width
    #[arg(long)]
    gap_ratio: Option<f64>,

    /// Expected script of the text layer (hangul, latin)
    #[arg(long)]
    script: Option<String>,

    /// Skip classification and treat every document as this type (digital, scanned)
    #[arg(long)]
    assume: Option<String>,

    /// Directory holding the OCR detection and recognition models
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Directory holding the pdfium shared library used to render pages for OCR
    #[arg(long)]
    pdfium_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let pdfs = services::inputs::collect_pdfs(&args.input)?;
    if pdfs.is_empty() {
        return Err(pagesense_core::PagesenseError::Config(format!(
            "No PDF files found in {}",
            args.input.display()
        )));
    }

    let config = services::pipeline::resolve_config(&Overrides {
        config_file: args.config.clone(),
        dpi: args.dpi,
        margin: args.margin,
        gap_ratio: args.gap_ratio,
        script: args.script.clone(),
    })?;
    let router = services::pipeline::build_router(
        &config,
        args.model_dir.clone(),
        args.pdfium_dir.clone(),
    );

    let verbose = !args.quiet;
    if verbose {
        println!("Found {} PDF file(s)", pdfs.len());
        println!("Output directory: {}\n", args.output_dir.display());
    }
    info!(count = pdfs.len(), output = %args.output_dir.display(), "Starting batch");

    let mut outcomes = Vec::with_capacity(pdfs.len());
    for pdf in pdfs {
        if verbose {
            println!("Processing: {}", file_name(&pdf));
        }
        let outcome = process(&router, &pdf, args.assume.as_deref());
        if verbose {
            print_progress(&outcome);
        }
        if let Err(e) = report::save_results(&outcome, &args.output_dir, Local::now()) {
            error!(pdf = %pdf.display(), error = %e, "Failed to save results");
        }
        outcomes.push(outcome);
    }

    let report = report::write_report(&outcomes, &args.output_dir, Local::now())?;
    if verbose {
        println!("{}", "=".repeat(60));
        println!("{report}");
        println!("{}", "=".repeat(60));
        println!("\nResults saved to: {}", args.output_dir.display());
    }
    Ok(())
}

/// Classify (unless a type is assumed) and extract one document.
fn process(router: &ExtractionRouter, pdf: &Path, assume: Option<&str>) -> DocumentOutcome {
    match assume {
        Some(label) => DocumentOutcome {
            pdf_path: pdf.to_path_buf(),
            classification: None,
            results: vec![router.route_as(pdf, label)],
        },
        None => {
            let routed = router.route(pdf);
            DocumentOutcome {
                pdf_path: pdf.to_path_buf(),
                classification: routed.classification,
                results: vec![routed.result],
            }
        }
    }
}

fn print_progress(outcome: &DocumentOutcome) {
    if let Some(classification) = &outcome.classification {
        print!("  PDF type: {} ", classification.verdict);
    }
    for r in &outcome.results {
        if r.success {
            println!(
                "→ {} ✓ ({:.2}s, {} words)",
                r.extractor_name, r.execution_time_seconds, r.word_count
            );
        } else {
            let message = r.error_message.as_deref().unwrap_or_default();
            let head: String = message.chars().take(50).collect();
            println!("→ {} ✗ ({head}...)", r.extractor_name);
        }
    }
    println!();
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
