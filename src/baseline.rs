//! Score deltas between a run and a previously stored run.

use crate::grade::Grade;
use crate::report::ComparisonSummary;
use crate::utils::safe_float_cmp;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Direction of a score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Score went up
    Improved,
    /// Score went down
    Regressed,
    /// Score unchanged
    Unchanged,
}

impl Trend {
    /// Arrow used in console output.
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Improved => "↑",
            Trend::Regressed => "↓",
            Trend::Unchanged => "=",
        }
    }
}

/// One document's score in the baseline and current runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDelta {
    /// Reference path as recorded in both runs.
    pub reference: PathBuf,
    /// Grade in the baseline, `None` if the document was not in it.
    pub old_grade: Option<Grade>,
    /// Grade in the current run.
    pub new_grade: Grade,
    /// Baseline score, `0.0` if absent.
    pub old_avg: f64,
    /// Current score.
    pub new_avg: f64,
    /// `new_avg - old_avg`.
    pub delta: f64,
}

impl ScoreDelta {
    /// Direction of the change.
    pub fn trend(&self) -> Trend {
        if self.delta > 0.0 {
            Trend::Improved
        } else if self.delta < 0.0 {
            Trend::Regressed
        } else {
            Trend::Unchanged
        }
    }
}

/// Match current results to the baseline by reference path. Sorted by the
/// current score, best first.
pub fn compare_to_baseline(
    current: &ComparisonSummary,
    baseline: &ComparisonSummary,
) -> Vec<ScoreDelta> {
    let previous: HashMap<&Path, (f64, Grade)> = baseline
        .results
        .iter()
        .map(|r| (r.reference_path(), (r.avg_ssim(), r.grade())))
        .collect();

    let mut deltas: Vec<ScoreDelta> = current
        .results
        .iter()
        .map(|r| {
            let old = previous.get(r.reference_path()).copied();
            let old_avg = old.map_or(0.0, |(avg, _)| avg);
            ScoreDelta {
                reference: r.reference_path().to_path_buf(),
                old_grade: old.map(|(_, grade)| grade),
                new_grade: r.grade(),
                old_avg,
                new_avg: r.avg_ssim(),
                delta: r.avg_ssim() - old_avg,
            }
        })
        .collect();

    deltas.sort_by(|a, b| safe_float_cmp(b.new_avg, a.new_avg));
    deltas
}

/// One line per document: `B→A 0.9100→0.9600 (↑0.0500) name`.
pub fn format_deltas(deltas: &[ScoreDelta]) -> String {
    let mut out = String::new();
    for d in deltas {
        let old_grade = d.old_grade.map_or("?", Grade::as_str);
        let name = d
            .reference
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push_str(&format!(
            "  {}→{} {:.4}→{:.4} ({}{:.4}) {}\n",
            old_grade,
            d.new_grade,
            d.old_avg,
            d.new_avg,
            d.trend().arrow(),
            d.delta.abs(),
            name
        ));
    }
    out
}
