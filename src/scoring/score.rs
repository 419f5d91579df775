//! Per-student scoring and the derived columns of the merged table.

use anyhow::Result;
use tracing::{debug, instrument, warn};

use super::grade::{GradeScale, LetterGrade};
use super::sheet::{Assignment, ColumnKind, ScoreSheet};
use super::strategy::{best_of, default_strategies};
use crate::config::{Component, GradingPolicy};
use crate::error::GradeError;
use crate::table::{Cell, Table};

/// Derived scores for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentScores {
    pub student: String,
    /// `Exam i Score` for i in `1..=exam_count`.
    pub exam_scores: Vec<f64>,
    pub total_homework: f64,
    pub average_homework: f64,
    pub homework_score: f64,
    pub total_quizzes: f64,
    pub average_quizzes: f64,
    pub quiz_score: f64,
    pub final_score: f64,
    pub ceiling_score: i64,
    pub grade: LetterGrade,
}

impl StudentScores {
    fn component(&self, component: Component) -> f64 {
        match component {
            Component::Exam { number } => self
                .exam_scores
                .get(number as usize - 1)
                .copied()
                .unwrap_or(0.0),
            Component::Homework => self.homework_score,
            Component::Quizzes => self.quiz_score,
        }
    }
}

/// `ceil(final_score * 100)`.
pub fn ceiling_score(final_score: f64) -> i64 {
    (final_score * 100.0).ceil() as i64
}

fn checked_ratio(sheet: &ScoreSheet, item: &Assignment, column: String) -> Result<f64, GradeError> {
    item.ratio().ok_or_else(|| GradeError::ZeroMaxPoints {
        student: sheet.student.clone(),
        column,
    })
}

/// Scores one student. `policy` must already be validated.
pub fn score_sheet(
    sheet: &ScoreSheet,
    policy: &GradingPolicy,
    scale: &GradeScale,
) -> Result<StudentScores, GradeError> {
    let exam_scores = (1..=policy.exam_count)
        .map(|n| checked_ratio(sheet, &sheet.exam(n), ColumnKind::exam_column(n)))
        .collect::<Result<Vec<_>, _>>()?;

    let homework_items = sheet.homework_items();
    for (n, item) in &sheet.homework {
        checked_ratio(sheet, item, format!("Homework {n}"))?;
    }

    let strategies = default_strategies();
    let homework = best_of(&strategies, &homework_items);
    let quizzes = best_of(&strategies, &sheet.quiz_items(&policy.quiz_max_points));

    let mut scores = StudentScores {
        student: sheet.student.clone(),
        exam_scores,
        total_homework: homework.ratio("total").unwrap_or(0.0),
        average_homework: homework.ratio("average").unwrap_or(0.0),
        homework_score: homework.best,
        total_quizzes: quizzes.ratio("total").unwrap_or(0.0),
        average_quizzes: quizzes.ratio("average").unwrap_or(0.0),
        quiz_score: quizzes.best,
        final_score: 0.0,
        ceiling_score: 0,
        grade: LetterGrade::F,
    };

    scores.final_score = policy
        .weights
        .iter()
        .map(|w| scores.component(w.component) * w.weight)
        .sum();
    scores.ceiling_score = ceiling_score(scores.final_score);
    scores.grade = scale.grade(scores.ceiling_score);

    Ok(scores)
}

/// Scores every row of the merged table and appends the derived columns:
/// `Exam i Score`, `Total Homework`, `Average Homework`, `Homework Score`,
/// `Total Quizzes`, `Average Quizzes`, `Quiz Score`, `Final Score`,
/// `Ceiling Score` and `Final Grade`.
#[instrument(skip_all, fields(students = table.len()))]
pub fn score_table(table: &mut Table, policy: &GradingPolicy) -> Result<Vec<StudentScores>> {
    policy.validate()?;
    let id_column = table.require_column(&policy.columns.roster_id, "merged table")?;
    let scale = GradeScale::new(&policy.grade_thresholds);

    for n in 1..=policy.exam_count {
        if table.column_index(&ColumnKind::exam_column(n)).is_none() {
            warn!(exam = n, "No column for exam; every student scores 0 on it");
        }
    }
    let quiz_columns: Vec<u32> = table
        .columns()
        .iter()
        .filter_map(|c| match ColumnKind::classify(c) {
            Some(ColumnKind::Quiz(n)) => Some(n),
            _ => None,
        })
        .collect();
    for n in quiz_columns
        .iter()
        .filter(|n| !policy.quiz_max_points.contains_key(*n))
    {
        warn!(
            quiz = n,
            "Quiz has no configured max points; it counts toward the quiz total only"
        );
    }

    let scores = table
        .rows()
        .iter()
        .map(|row| {
            let student = row[id_column].as_str();
            let sheet = ScoreSheet::from_row(&student, table.columns(), row);
            score_sheet(&sheet, policy, &scale)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let derived = |f: &dyn Fn(&StudentScores) -> Cell| scores.iter().map(f).collect::<Vec<_>>();

    for n in 1..=policy.exam_count {
        let i = n as usize - 1;
        let values = derived(&|s| Cell::Number(s.exam_scores[i]));
        table.push_column(format!("Exam {n} Score"), values);
    }
    table.push_column("Total Homework", derived(&|s| Cell::Number(s.total_homework)));
    table.push_column("Average Homework", derived(&|s| Cell::Number(s.average_homework)));
    table.push_column("Homework Score", derived(&|s| Cell::Number(s.homework_score)));
    table.push_column("Total Quizzes", derived(&|s| Cell::Number(s.total_quizzes)));
    table.push_column("Average Quizzes", derived(&|s| Cell::Number(s.average_quizzes)));
    table.push_column("Quiz Score", derived(&|s| Cell::Number(s.quiz_score)));
    table.push_column("Final Score", derived(&|s| Cell::Number(s.final_score)));
    table.push_column(
        "Ceiling Score",
        derived(&|s| Cell::Number(s.ceiling_score as f64)),
    );
    table.push_column(
        "Final Grade",
        derived(&|s| Cell::Text(s.grade.to_string())),
    );

    debug!(columns = table.columns().len(), "Appended derived score columns");
    Ok(scores)
}
