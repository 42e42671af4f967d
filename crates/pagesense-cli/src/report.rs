// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persisted batch artifacts: per-document text and JSON summaries, and the
// aggregate markdown comparison report.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};
use pagesense_core::error::Result;
use pagesense_core::types::{ClassificationVerdict, ExtractionResult};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Everything produced for one input document.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub pdf_path: PathBuf,
    pub classification: Option<ClassificationVerdict>,
    pub results: Vec<ExtractionResult>,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    pdf_file: String,
    timestamp: String,
    sha256: Option<String>,
    classification: Option<ClassificationSummary<'a>>,
    results: Vec<ResultSummary<'a>>,
}

/// Document-level verdict metadata. Per-page detail stays in the logs.
#[derive(Debug, Serialize)]
struct ClassificationSummary<'a> {
    verdict: &'a str,
    page_count: usize,
    forced_pages: usize,
    force_ratio: f64,
    file_size: u64,
    avg_size_per_page: f64,
    page_reasons: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct ResultSummary<'a> {
    extractor: &'a str,
    success: bool,
    error: Option<&'a str>,
    execution_time_seconds: f64,
    char_count: usize,
    word_count: usize,
    line_count: usize,
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn hash_file(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Write `<stem>_<extractor>.txt` for every successful result and
/// `<stem>_summary.json` for the document.
pub fn save_results(outcome: &DocumentOutcome, output_dir: &Path, now: DateTime<Local>) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let stem = outcome
        .pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    for result in outcome.results.iter().filter(|r| r.success) {
        let path = output_dir.join(format!("{stem}_{}.txt", result.extractor_name));
        std::fs::write(&path, &result.text)?;
        debug!(path = %path.display(), "Wrote extracted text");
    }

    // A file that vanished mid-batch still gets a summary, just without a hash.
    let sha256 = hash_file(&outcome.pdf_path).ok();
    let summary = Summary {
        pdf_file: outcome.pdf_path.display().to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, false),
        sha256,
        classification: outcome.classification.as_ref().map(classification_summary),
        results: outcome.results.iter().map(result_summary).collect(),
    };

    let path = output_dir.join(format!("{stem}_summary.json"));
    std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
    debug!(path = %path.display(), "Wrote summary");
    Ok(())
}

fn classification_summary(verdict: &ClassificationVerdict) -> ClassificationSummary<'_> {
    ClassificationSummary {
        verdict: verdict.verdict.as_str(),
        page_count: verdict.page_count,
        forced_pages: verdict.forced_pages,
        force_ratio: verdict.force_ratio,
        file_size: verdict.file_size,
        avg_size_per_page: verdict.avg_size_per_page,
        page_reasons: verdict.pages.iter().map(|p| p.reason.as_str()).collect(),
    }
}

fn result_summary(result: &ExtractionResult) -> ResultSummary<'_> {
    ResultSummary {
        extractor: &result.extractor_name,
        success: result.success,
        error: result.error_message.as_deref(),
        execution_time_seconds: result.execution_time_seconds,
        char_count: result.char_count,
        word_count: result.word_count,
        line_count: result.line_count,
    }
}

/// Per-extractor totals for the overall summary table.
#[derive(Debug, Default)]
struct ExtractorStats {
    total: usize,
    succeeded: usize,
    total_time: f64,
    total_words: usize,
}

/// Markdown comparison report over every processed document.
pub fn comparison_report(outcomes: &[DocumentOutcome], now: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# PDF Text Extraction Comparison Report\n");
    let _ = writeln!(out, "Generated: {}\n", now.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Total PDFs tested: {}\n", outcomes.len());

    for outcome in outcomes {
        let name = outcome
            .pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = writeln!(out, "## {name}\n");
        let _ = writeln!(out, "| Extractor | Success | Time (s) | Words | Chars | Lines |");
        let _ = writeln!(out, "|-----------|---------|----------|-------|-------|-------|");
        for r in &outcome.results {
            let status = if r.success { "✓" } else { "✗" };
            let _ = writeln!(
                out,
                "| {} | {status} | {:.2} | {} | {} | {} |",
                r.extractor_name, r.execution_time_seconds, r.word_count, r.char_count, r.line_count
            );
        }
        out.push('\n');
    }

    // Insertion order, so extractors appear in the order they were first used.
    let mut order: Vec<&str> = Vec::new();
    let mut stats: BTreeMap<&str, ExtractorStats> = BTreeMap::new();
    for r in outcomes.iter().flat_map(|o| &o.results) {
        let name = r.extractor_name.as_str();
        let entry = stats.entry(name).or_insert_with(|| {
            order.push(name);
            ExtractorStats::default()
        });
        entry.total += 1;
        if r.success {
            entry.succeeded += 1;
            entry.total_time += r.execution_time_seconds;
            entry.total_words += r.word_count;
        }
    }

    let _ = writeln!(out, "## Overall Summary\n");
    let _ = writeln!(out, "| Extractor | Success Rate | Avg Time (s) | Avg Words |");
    let _ = writeln!(out, "|-----------|--------------|--------------|-----------|");
    for name in order {
        let Some(s) = stats.get(name) else { continue };
        let divisor = s.succeeded.max(1) as f64;
        let _ = writeln!(
            out,
            "| {name} | {:.0}% | {:.2} | {:.0} |",
            s.succeeded as f64 / s.total as f64 * 100.0,
            s.total_time / divisor,
            s.total_words as f64 / divisor,
        );
    }
    out
}

/// Write `comparison_report.md` into `output_dir` and return the report.
pub fn write_report(outcomes: &[DocumentOutcome], output_dir: &Path, now: DateTime<Local>) -> Result<String> {
    std::fs::create_dir_all(output_dir)?;
    let report = comparison_report(outcomes, now);
    std::fs::write(output_dir.join("comparison_report.md"), &report)?;
    Ok(report)
}
