//! Grading policy for one course offering.
//!
//! The defaults describe the course the tool was written for. A policy can be
//! overridden with a JSON file; any field left out keeps its default:
//!
//! ```json
//! {
//!   "exam_count": 3,
//!   "quiz_max_points": { "1": 11, "2": 15, "3": 17, "4": 14, "5": 12 },
//!   "weights": [
//!     { "component": "exam", "number": 1, "weight": 0.05 },
//!     { "component": "quizzes", "weight": 0.30 },
//!     { "component": "homework", "weight": 0.65 }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::GradeError;
use crate::scoring::grade::LetterGrade;

/// Allowed distance between the weight sum and 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Everything that decides how raw scores become a letter grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingPolicy {
    /// Number of exams; `Exam 1` through `Exam {exam_count}` are scored.
    pub exam_count: u32,
    /// Static max points per quiz number. Not derived from the quiz files.
    pub quiz_max_points: BTreeMap<u32, f64>,
    pub weights: Vec<Weight>,
    pub grade_thresholds: Vec<Threshold>,
    pub columns: ColumnNames,
    pub files: InputFiles,
}

/// One term of the final-score weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    #[serde(flatten)]
    pub component: Component,
    pub weight: f64,
}

/// A derived score that contributes to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum Component {
    Exam { number: u32 },
    Homework,
    Quizzes,
}

impl Component {
    /// Name of the derived column holding this component's score.
    pub fn column_name(&self) -> String {
        match self {
            Component::Exam { number } => format!("Exam {number} Score"),
            Component::Homework => "Homework Score".to_string(),
            Component::Quizzes => "Quiz Score".to_string(),
        }
    }
}

/// Minimum ceiling percentage needed for `grade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub min_percent: i64,
    pub grade: LetterGrade,
}

/// Names of the columns the pipeline reads from the input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub roster_id: String,
    pub roster_email: String,
    pub hw_exam_id: String,
    pub quiz_email: String,
    pub quiz_grade: String,
    pub section: String,
    pub first_name: String,
    pub last_name: String,
}

/// File names, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub roster: String,
    pub hw_exam: String,
    /// Glob matching the per-quiz files; the quiz number is the second
    /// `_`-separated token of the file stem.
    pub quiz_pattern: String,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            exam_count: 3,
            quiz_max_points: BTreeMap::from([
                (1, 11.0),
                (2, 15.0),
                (3, 17.0),
                (4, 14.0),
                (5, 12.0),
            ]),
            weights: vec![
                Weight {
                    component: Component::Exam { number: 1 },
                    weight: 0.05,
                },
                Weight {
                    component: Component::Exam { number: 2 },
                    weight: 0.10,
                },
                Weight {
                    component: Component::Exam { number: 3 },
                    weight: 0.15,
                },
                Weight {
                    component: Component::Quizzes,
                    weight: 0.30,
                },
                Weight {
                    component: Component::Homework,
                    weight: 0.40,
                },
            ],
            grade_thresholds: vec![
                Threshold {
                    min_percent: 90,
                    grade: LetterGrade::A,
                },
                Threshold {
                    min_percent: 80,
                    grade: LetterGrade::B,
                },
                Threshold {
                    min_percent: 70,
                    grade: LetterGrade::C,
                },
                Threshold {
                    min_percent: 60,
                    grade: LetterGrade::D,
                },
                Threshold {
                    min_percent: 0,
                    grade: LetterGrade::F,
                },
            ],
            columns: ColumnNames::default(),
            files: InputFiles::default(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            roster_id: "NetID".to_string(),
            roster_email: "Email Address".to_string(),
            hw_exam_id: "SID".to_string(),
            quiz_email: "Email".to_string(),
            quiz_grade: "Grade".to_string(),
            section: "Section".to_string(),
            first_name: "First Name".to_string(),
            last_name: "Last Name".to_string(),
        }
    }
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            roster: "roster.csv".to_string(),
            hw_exam: "hw_exam_grades.csv".to_string(),
            quiz_pattern: "quiz_*_grades.csv".to_string(),
        }
    }
}

impl GradingPolicy {
    /// Loads a policy from a JSON file at `path` and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading grading policy `{}`", path.display()))?;
        let policy: GradingPolicy = serde_json::from_str(&content)
            .with_context(|| format!("parsing grading policy `{}`", path.display()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Loads `path` when given, otherwise returns the validated defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let policy = Self::default();
                policy.validate()?;
                Ok(policy)
            }
        }
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().map(|w| w.weight).sum()
    }

    pub fn quiz_max_total(&self) -> f64 {
        self.quiz_max_points.values().sum()
    }

    /// Checks the invariants the scorer relies on.
    pub fn validate(&self) -> Result<(), GradeError> {
        let sum = self.weight_sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(GradeError::WeightSumInvalid { sum });
        }

        for w in &self.weights {
            if w.weight < 0.0 {
                return Err(GradeError::InvalidPolicy(format!(
                    "weight for `{}` is negative",
                    w.component.column_name()
                )));
            }
            if let Component::Exam { number } = w.component {
                if number == 0 || number > self.exam_count {
                    return Err(GradeError::InvalidPolicy(format!(
                        "weight refers to exam {number} but only {} exams are scored",
                        self.exam_count
                    )));
                }
            }
        }

        if self.quiz_max_points.is_empty() {
            return Err(GradeError::InvalidPolicy(
                "no quizzes are configured".to_string(),
            ));
        }
        if let Some((number, _)) = self.quiz_max_points.iter().find(|(_, max)| **max <= 0.0) {
            return Err(GradeError::InvalidPolicy(format!(
                "quiz {number} has non-positive max points"
            )));
        }

        if self.grade_thresholds.is_empty() {
            return Err(GradeError::InvalidPolicy(
                "no grade thresholds are configured".to_string(),
            ));
        }
        let mut ordered = self.grade_thresholds.clone();
        ordered.sort_by_key(|t| t.min_percent);
        if ordered.windows(2).any(|pair| pair[0].min_percent == pair[1].min_percent) {
            return Err(GradeError::InvalidPolicy(
                "two grade thresholds share a minimum percentage".to_string(),
            ));
        }
        // A higher percentage must never map to a lower letter.
        if ordered.windows(2).any(|pair| pair[0].grade > pair[1].grade) {
            return Err(GradeError::InvalidPolicy(
                "grade thresholds are not ordered by letter".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_default_policy_is_valid() {
        let policy = GradingPolicy::default();
        policy.validate().unwrap();
        assert!((policy.weight_sum() - 1.0).abs() < WEIGHT_TOLERANCE);
        assert_eq!(policy.quiz_max_total(), 69.0);
    }

    #[test]
    fn test_weight_sum_must_be_one() {
        let mut policy = GradingPolicy::default();
        policy.weights[4].weight = 0.5;

        match policy.validate() {
            Err(GradeError::WeightSumInvalid { sum }) => assert!((sum - 1.1).abs() < 1e-9),
            other => panic!("expected WeightSumInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_exam_weight_beyond_exam_count_is_rejected() {
        let mut policy = GradingPolicy::default();
        policy.exam_count = 2;
        assert!(matches!(
            policy.validate(),
            Err(GradeError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let mut policy = GradingPolicy::default();
        policy.grade_thresholds[0].grade = LetterGrade::F;
        policy.grade_thresholds[4].grade = LetterGrade::A;
        assert!(matches!(
            policy.validate(),
            Err(GradeError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let path = temp_path("course_grader_test_policy.json");
        fs::write(
            &path,
            r#"{
                "exam_count": 1,
                "quiz_max_points": { "1": 10, "2": 20 },
                "weights": [
                    { "component": "exam", "number": 1, "weight": 0.5 },
                    { "component": "quizzes", "weight": 0.25 },
                    { "component": "homework", "weight": 0.25 }
                ]
            }"#,
        )
        .unwrap();

        let policy = GradingPolicy::load(&path).unwrap();
        assert_eq!(policy.exam_count, 1);
        assert_eq!(policy.quiz_max_points.get(&2), Some(&20.0));
        assert_eq!(policy.weights[0].component, Component::Exam { number: 1 });
        assert_eq!(policy.columns, ColumnNames::default());
        assert_eq!(policy.grade_thresholds.len(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_bad_weights() {
        let path = temp_path("course_grader_test_bad_policy.json");
        fs::write(
            &path,
            r#"{ "weights": [ { "component": "homework", "weight": 0.9 } ] }"#,
        )
        .unwrap();

        let err = GradingPolicy::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GradeError>(),
            Some(GradeError::WeightSumInvalid { .. })
        ));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_component_column_names() {
        assert_eq!(Component::Exam { number: 2 }.column_name(), "Exam 2 Score");
        assert_eq!(Component::Homework.column_name(), "Homework Score");
        assert_eq!(Component::Quizzes.column_name(), "Quiz Score");
    }
}
