//! Extraction of scoring inputs from a merged student row.

use std::collections::BTreeMap;

use crate::table::Cell;

const HOMEWORK_PREFIX: &str = "Homework ";
const EXAM_PREFIX: &str = "Exam ";
const QUIZ_PREFIX: &str = "Quiz ";
const MAX_POINTS_SUFFIX: &str = " - Max Points";

/// Role of an input column in scoring, recognized by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Homework(u32),
    HomeworkMax(u32),
    Exam(u32),
    ExamMax(u32),
    Quiz(u32),
}

impl ColumnKind {
    /// Classifies `Homework {n}`, `Homework {n} - Max Points`, `Exam {n}`,
    /// `Exam {n} - Max Points` and `Quiz {n}`.
    pub fn classify(column: &str) -> Option<Self> {
        if let Some(rest) = column.strip_prefix(HOMEWORK_PREFIX) {
            return match rest.strip_suffix(MAX_POINTS_SUFFIX) {
                Some(n) => number(n).map(ColumnKind::HomeworkMax),
                None => number(rest).map(ColumnKind::Homework),
            };
        }
        if let Some(rest) = column.strip_prefix(EXAM_PREFIX) {
            return match rest.strip_suffix(MAX_POINTS_SUFFIX) {
                Some(n) => number(n).map(ColumnKind::ExamMax),
                None => number(rest).map(ColumnKind::Exam),
            };
        }
        column
            .strip_prefix(QUIZ_PREFIX)
            .and_then(number)
            .map(ColumnKind::Quiz)
    }

    pub fn quiz_column(number: u32) -> String {
        format!("{QUIZ_PREFIX}{number}")
    }

    pub fn exam_column(number: u32) -> String {
        format!("{EXAM_PREFIX}{number}")
    }
}

fn number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A score and the points it was out of.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Assignment {
    pub score: f64,
    pub max_points: f64,
}

impl Assignment {
    pub fn new(score: f64, max_points: f64) -> Self {
        Self { score, max_points }
    }

    /// An item with zero max points was never recorded for the student.
    pub fn is_recorded(&self) -> bool {
        self.max_points > 0.0
    }

    /// `score / max_points`; an unrecorded item scores 0. `None` when a
    /// positive score sits against zero max points.
    pub fn ratio(&self) -> Option<f64> {
        if self.is_recorded() {
            Some(self.score / self.max_points)
        } else if self.score == 0.0 {
            Some(0.0)
        } else {
            None
        }
    }
}

/// Raw scoring inputs for one student, keyed by item number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSheet {
    pub student: String,
    pub homework: BTreeMap<u32, Assignment>,
    pub exams: BTreeMap<u32, Assignment>,
    pub quizzes: BTreeMap<u32, f64>,
}

impl ScoreSheet {
    /// Collects every scoring column of `row`. Empty or non-numeric cells
    /// count as 0.
    pub fn from_row(student: &str, columns: &[String], row: &[Cell]) -> Self {
        let mut sheet = ScoreSheet {
            student: student.to_string(),
            ..Default::default()
        };

        for (name, cell) in columns.iter().zip(row) {
            let Some(kind) = ColumnKind::classify(name) else {
                continue;
            };
            let value = cell.as_f64().unwrap_or(0.0);
            match kind {
                ColumnKind::Homework(n) => sheet.homework.entry(n).or_default().score = value,
                ColumnKind::HomeworkMax(n) => {
                    sheet.homework.entry(n).or_default().max_points = value
                }
                ColumnKind::Exam(n) => sheet.exams.entry(n).or_default().score = value,
                ColumnKind::ExamMax(n) => sheet.exams.entry(n).or_default().max_points = value,
                ColumnKind::Quiz(n) => {
                    sheet.quizzes.insert(n, value);
                }
            }
        }

        sheet
    }

    pub fn homework_items(&self) -> Vec<Assignment> {
        self.homework.values().copied().collect()
    }

    /// Exam `number`, or an unrecorded 0/0 item when the student has none.
    pub fn exam(&self, number: u32) -> Assignment {
        self.exams.get(&number).copied().unwrap_or_default()
    }

    /// One item per configured quiz, scored against its static max. A quiz
    /// the student has no column for scores 0. Quizzes without a configured
    /// max become unrecorded items: their points count toward the total but
    /// not toward the average.
    pub fn quiz_items(&self, quiz_max_points: &BTreeMap<u32, f64>) -> Vec<Assignment> {
        let configured = quiz_max_points
            .iter()
            .map(|(n, max)| Assignment::new(self.quizzes.get(n).copied().unwrap_or(0.0), *max));
        let unconfigured = self
            .quizzes
            .iter()
            .filter(|(n, _)| !quiz_max_points.contains_key(*n))
            .map(|(_, score)| Assignment::new(*score, 0.0));
        configured.chain(unconfigured).collect()
    }
}
