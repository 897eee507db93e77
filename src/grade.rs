//! Quality grades derived from aggregated document scores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal quality bucket for a document, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Nearly identical to the reference
    A,
    /// Minor differences (fonts, spacing)
    B,
    /// Noticeable differences
    C,
    /// Severe layout differences
    D,
    /// Completely different, empty, missing or failed
    F,
}

impl Grade {
    /// All grades in order from best to worst.
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// Classify an aggregated SSIM score. Lower bounds are inclusive; anything
    /// below 0.50, including negative scores and NaN, is `F`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Grade::A
        } else if score >= 0.85 {
            Grade::B
        } else if score >= 0.70 {
            Grade::C
        } else if score >= 0.50 {
            Grade::D
        } else {
            Grade::F
        }
    }

    /// Inclusive lower bound of the grade, `None` for `F`.
    pub fn threshold(self) -> Option<f64> {
        match self {
            Grade::A => Some(0.95),
            Grade::B => Some(0.85),
            Grade::C => Some(0.70),
            Grade::D => Some(0.50),
            Grade::F => None,
        }
    }

    /// A and B count as passing.
    pub fn is_passing(self) -> bool {
        matches!(self, Grade::A | Grade::B)
    }

    /// Needs attention in the report (C and below).
    pub fn is_problem(self) -> bool {
        !self.is_passing()
    }

    /// Short human-readable meaning of the grade.
    pub fn description(self) -> &'static str {
        match self {
            Grade::A => "nearly identical to the reference",
            Grade::B => "minor differences (fonts, spacing)",
            Grade::C => "noticeable differences",
            Grade::D => "severe layout differences",
            Grade::F => "completely different / empty output",
        }
    }

    /// Letter for the grade.
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Grade::from_score(1.0), Grade::A);
        assert_eq!(Grade::from_score(0.95), Grade::A);
        assert_eq!(Grade::from_score(0.9499), Grade::B);
        assert_eq!(Grade::from_score(0.85), Grade::B);
        assert_eq!(Grade::from_score(0.8499), Grade::C);
        assert_eq!(Grade::from_score(0.70), Grade::C);
        assert_eq!(Grade::from_score(0.50), Grade::D);
        assert_eq!(Grade::from_score(0.4999), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
        assert_eq!(Grade::from_score(-0.1), Grade::F);
    }

    #[test]
    fn test_nan_is_f() {
        assert_eq!(Grade::from_score(f64::NAN), Grade::F);
    }

    #[test]
    fn test_thresholds_match_classifier() {
        for grade in Grade::ALL {
            if let Some(t) = grade.threshold() {
                assert_eq!(Grade::from_score(t), grade);
            }
        }
    }

    #[test]
    fn test_passing() {
        assert!(Grade::A.is_passing());
        assert!(Grade::B.is_passing());
        assert!(Grade::C.is_problem());
        assert!(Grade::F.is_problem());
    }

    #[test]
    fn test_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Grade::C).unwrap(), "\"C\"");
        let g: Grade = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(g, Grade::D);
        assert_eq!(Grade::B.to_string(), "B");
    }
}
