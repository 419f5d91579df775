//! Letter grades and the threshold scale that assigns them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Threshold;

/// Letter grade, ordered from worst to best so sorting follows grade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    F,
    D,
    C,
    B,
    A,
}

impl LetterGrade {
    /// All grades in ascending order.
    pub const ALL: [LetterGrade; 5] = [
        LetterGrade::F,
        LetterGrade::D,
        LetterGrade::C,
        LetterGrade::B,
        LetterGrade::A,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::F => "F",
            LetterGrade::D => "D",
            LetterGrade::C => "C",
            LetterGrade::B => "B",
            LetterGrade::A => "A",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold table evaluated from the highest minimum down.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    descending: Vec<Threshold>,
}

impl GradeScale {
    pub fn new(thresholds: &[Threshold]) -> Self {
        let mut descending = thresholds.to_vec();
        descending.sort_by(|a, b| b.min_percent.cmp(&a.min_percent));
        Self { descending }
    }

    /// Converts a ceiling percentage into a letter grade.
    ///
    /// | Percent | Grade (defaults) |
    /// |---------|------------------|
    /// | >= 90   | A                |
    /// | >= 80   | B                |
    /// | >= 70   | C                |
    /// | >= 60   | D                |
    /// | < 60    | F                |
    ///
    /// Percentages below every threshold take the lowest threshold's letter.
    pub fn grade(&self, percent: i64) -> LetterGrade {
        self.descending
            .iter()
            .find(|t| percent >= t.min_percent)
            .or(self.descending.last())
            .map(|t| t.grade)
            .unwrap_or(LetterGrade::F)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::new(&crate::config::GradingPolicy::default().grade_thresholds)
    }
}
