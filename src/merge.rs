//! Joins the roster, homework/exam grades and quiz grades into one table
//! with a row per student.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

use crate::config::GradingPolicy;
use crate::error::GradeError;
use crate::loader::SourceTables;
use crate::scoring::sheet::ColumnKind;
use crate::table::{Cell, Table};

/// Inner-joins roster and homework/exam grades on the identifier, keeping
/// roster order, then left-joins quiz grades on the roster's contact address.
///
/// Output columns are the roster's, then the homework/exam file's without
/// its key, then one per quiz. Empty cells in scoring columns become 0.
#[instrument(skip_all)]
pub fn merge(sources: &SourceTables, policy: &GradingPolicy) -> Result<Table> {
    let roster = &sources.roster;
    let hw_exam = &sources.hw_exam;
    let quizzes = &sources.quizzes;

    let email_idx = roster
        .table()
        .require_column(&policy.columns.roster_email, "roster")?;

    let hw_keep: Vec<usize> = (0..hw_exam.table().columns().len())
        .filter(|&i| i != hw_exam.key_column())
        .collect();
    let quiz_keep: Vec<usize> = (0..quizzes.table().columns().len())
        .filter(|&i| i != quizzes.key_column())
        .collect();

    let mut columns: Vec<String> = roster.table().columns().to_vec();
    columns.extend(hw_keep.iter().map(|&i| hw_exam.table().columns()[i].clone()));
    columns.extend(quiz_keep.iter().map(|&i| quizzes.table().columns()[i].clone()));

    {
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(GradeError::DuplicateColumn {
                column: dup.clone(),
            }
            .into());
        }
    }

    let mut merged = Table::new(columns);
    let mut without_quizzes = 0usize;

    for row in roster.table().rows() {
        let key = row[roster.key_column()].as_str();
        let Some(hw_row) = hw_exam.get(&key) else {
            continue;
        };

        let mut out = row.clone();
        out.extend(hw_keep.iter().map(|&i| hw_row[i].clone()));

        match quizzes.get(&row[email_idx].as_str()) {
            Some(quiz_row) => out.extend(quiz_keep.iter().map(|&i| quiz_row[i].clone())),
            None => {
                without_quizzes += 1;
                out.extend(quiz_keep.iter().map(|_| Cell::Empty));
            }
        }

        merged.push_row(out);
    }

    if merged.is_empty() {
        return Err(GradeError::EmptyJoin {
            left: "roster".to_string(),
            right: "homework/exam grades".to_string(),
        }
        .into());
    }

    let scoring: Vec<usize> = merged
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| ColumnKind::classify(name).is_some())
        .map(|(i, _)| i)
        .collect();
    for idx in scoring {
        merged.map_column(idx, |c| {
            if c.is_empty() {
                Cell::Number(0.0)
            } else {
                c.clone()
            }
        });
    }

    let roster_only = roster.len() - merged.len();
    let hw_only = hw_exam.len() - merged.len();
    if roster_only > 0 || hw_only > 0 {
        warn!(
            roster_only,
            hw_only, "Students missing from one source were left out"
        );
    }
    if without_quizzes > 0 && !quiz_keep.is_empty() {
        warn!(students = without_quizzes, "Students without any quiz grades");
    }
    info!(students = merged.len(), "Merged sources");

    Ok(merged)
}
