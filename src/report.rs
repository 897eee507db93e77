//! JSON summary and Markdown report generation.

use crate::document::{DocumentResult, DocumentStatus};
use crate::error::Result;
use crate::grade::Grade;
use crate::utils::{safe_float_cmp, truncate_chars};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the machine-readable summary.
pub const SUMMARY_FILE: &str = "comparison-results.json";

/// File name of the human-readable report.
pub const REPORT_FILE: &str = "VISUAL-QUALITY-REPORT.md";

const PROBLEM_NAME_WIDTH: usize = 40;
const PROBLEM_ERROR_WIDTH: usize = 30;
const RESULT_NAME_WIDTH: usize = 50;

/// Number of documents per grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCounts {
    /// Grade A
    #[serde(rename = "A")]
    pub a: usize,
    /// Grade B
    #[serde(rename = "B")]
    pub b: usize,
    /// Grade C
    #[serde(rename = "C")]
    pub c: usize,
    /// Grade D
    #[serde(rename = "D")]
    pub d: usize,
    /// Grade F
    #[serde(rename = "F")]
    pub f: usize,
}

impl GradeCounts {
    /// Count grades over `results`.
    pub fn from_results(results: &[DocumentResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            *counts.slot(result.grade()) += 1;
        }
        counts
    }

    fn slot(&mut self, grade: Grade) -> &mut usize {
        match grade {
            Grade::A => &mut self.a,
            Grade::B => &mut self.b,
            Grade::C => &mut self.c,
            Grade::D => &mut self.d,
            Grade::F => &mut self.f,
        }
    }

    /// Count for one grade.
    pub fn get(&self, grade: Grade) -> usize {
        match grade {
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D => self.d,
            Grade::F => self.f,
        }
    }

    /// Sum over all grades.
    pub fn total(&self) -> usize {
        Grade::ALL.iter().map(|&g| self.get(g)).sum()
    }

    /// Documents graded A or B.
    pub fn passing(&self) -> usize {
        self.a + self.b
    }

    /// Passing share in percent, `0.0` when nothing was counted.
    pub fn pass_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.passing() as f64 / total as f64 * 100.0
        }
    }
}

/// Machine-readable outcome of a run, written as `comparison-results.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Generation time (RFC 3339, local time).
    pub generated: String,
    /// Rasterization DPI used for the run.
    pub dpi: u32,
    /// Number of documents.
    pub total: usize,
    /// Documents per grade.
    pub grades: GradeCounts,
    /// Every document result, in processing order.
    pub results: Vec<DocumentResult>,
}

impl ComparisonSummary {
    /// Write as pretty-printed UTF-8 JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a summary written by a previous run.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Collect results into a summary stamped with the current time.
pub fn build_summary(results: Vec<DocumentResult>, dpi: u32) -> ComparisonSummary {
    ComparisonSummary {
        generated: chrono::Local::now().to_rfc3339(),
        dpi,
        total: results.len(),
        grades: GradeCounts::from_results(&results),
        results,
    }
}

/// Render the Markdown report stamped with the current time.
pub fn build_markdown_report(results: &[DocumentResult]) -> String {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    build_markdown_report_at(results, &generated)
}

/// Render the Markdown report with an explicit generation stamp.
pub fn build_markdown_report_at(results: &[DocumentResult], generated: &str) -> String {
    let grades = GradeCounts::from_results(results);
    let total = results.len();
    let mut out = String::new();

    out.push_str("# Visual Quality Report\n\n");
    out.push_str(&format!("*Generated: {}*\n\n", generated));
    out.push_str("## Summary\n\n");
    out.push_str("| Metric | Value |\n");
    out.push_str("|------|-----|\n");
    out.push_str(&format!("| Total documents | {} |\n", total));
    out.push_str(&format!(
        "| Passing (A+B) | {} ({:.1}%) |\n",
        grades.passing(),
        grades.pass_rate()
    ));
    for grade in Grade::ALL {
        out.push_str(&format!(
            "| {} ({}) | {} |\n",
            grade,
            bound_label(grade),
            grades.get(grade)
        ));
    }
    out.push('\n');

    out.push_str("## Grade criteria\n");
    for grade in Grade::ALL {
        let rule = match grade.threshold() {
            Some(t) => format!("SSIM ≥ {:.2}", t),
            None => "SSIM < 0.50".to_string(),
        };
        out.push_str(&format!("- **{}**: {}: {}\n", grade, rule, grade.description()));
    }
    out.push('\n');

    let mut sorted: Vec<&DocumentResult> = results.iter().collect();
    sorted.sort_by(|a, b| safe_float_cmp(a.avg_ssim(), b.avg_ssim()));

    let problems: Vec<&DocumentResult> =
        sorted.iter().copied().filter(|r| r.grade().is_problem()).collect();
    if !problems.is_empty() {
        out.push_str("## Problem documents\n\n");
        out.push_str("| Document | Grade | SSIM | Pages | Notes |\n");
        out.push_str("|------|------|------|--------|------|\n");
        for r in problems {
            let name = r.name();
            let error = match (r.status(), r.error()) {
                (DocumentStatus::Error, Some(e)) => truncate_chars(e, PROBLEM_ERROR_WIDTH),
                _ => "",
            };
            out.push_str(&format!(
                "| {} | {} | {:.2} | {}/{} | {} |\n",
                truncate_chars(&name, PROBLEM_NAME_WIDTH),
                r.grade(),
                r.avg_ssim(),
                count_label(r.ref_page_count()),
                count_label(r.test_page_count()),
                error
            ));
        }
        out.push('\n');
    }

    out.push_str("## All results\n\n");
    out.push_str("| Document | Grade | SSIM |\n");
    out.push_str("|------|------|------|\n");
    for r in sorted {
        let name = r.name();
        out.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            truncate_chars(&name, RESULT_NAME_WIDTH),
            r.grade(),
            r.avg_ssim()
        ));
    }

    out
}

/// Write the Markdown report for `results` to `path`.
pub fn write_markdown_report(results: &[DocumentResult], path: &Path) -> Result<()> {
    fs::write(path, build_markdown_report(results))?;
    Ok(())
}

fn bound_label(grade: Grade) -> String {
    match grade.threshold() {
        Some(t) => format!("≥{:.0}%", t * 100.0),
        None => "<50%".to_string(),
    }
}

fn count_label(count: Option<usize>) -> String {
    count.map_or_else(|| "?".to_string(), |n| n.to_string())
}
