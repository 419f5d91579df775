//! Reads the roster, homework/exam and per-quiz CSV files into keyed tables.

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::config::GradingPolicy;
use crate::error::GradeError;
use crate::scoring::sheet::ColumnKind;
use crate::table::{Cell, KeyedTable, Table};

/// The three inputs, each indexed by its join key.
#[derive(Debug, Clone)]
pub struct SourceTables {
    /// Keyed by lower-cased login identifier.
    pub roster: KeyedTable,
    /// Keyed by lower-cased login identifier.
    pub hw_exam: KeyedTable,
    /// Keyed by lower-cased contact address, one `Quiz k` column per file.
    pub quizzes: KeyedTable,
}

/// Loads all three sources from `data_dir`.
#[instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn load_sources(data_dir: &Path, policy: &GradingPolicy) -> Result<SourceTables> {
    let roster = load_roster(data_dir, policy)?;
    let hw_exam = load_hw_exam(data_dir, policy)?;
    let quizzes = load_quizzes(data_dir, policy)?;

    info!(
        roster = roster.len(),
        hw_exam = hw_exam.len(),
        quiz_students = quizzes.len(),
        quiz_columns = quizzes.table().columns().len() - 1,
        "Loaded sources"
    );

    Ok(SourceTables {
        roster,
        hw_exam,
        quizzes,
    })
}

/// Reads the roster, lower-casing the identifier and contact-address columns.
pub fn load_roster(data_dir: &Path, policy: &GradingPolicy) -> Result<KeyedTable> {
    let cols = &policy.columns;
    let path = data_dir.join(&policy.files.roster);
    let mut table = Table::read_csv(&path)?;

    lowercase_column(&mut table, &cols.roster_id, &path)?;
    lowercase_column(&mut table, &cols.roster_email, &path)?;
    check_numeric_columns(&table, &path)?;

    Ok(KeyedTable::new(table, &cols.roster_id, &path)?)
}

/// Reads homework and exam grades, lower-casing the identifier column.
pub fn load_hw_exam(data_dir: &Path, policy: &GradingPolicy) -> Result<KeyedTable> {
    let cols = &policy.columns;
    let path = data_dir.join(&policy.files.hw_exam);
    let mut table = Table::read_csv(&path)?;

    lowercase_column(&mut table, &cols.hw_exam_id, &path)?;
    check_numeric_columns(&table, &path)?;

    Ok(KeyedTable::new(table, &cols.hw_exam_id, &path)?)
}

/// Discovers the per-quiz files and combines their grade columns into one
/// table keyed by contact address. Addresses from every file are kept, in
/// order of first appearance; columns are ordered by quiz number.
pub fn load_quizzes(data_dir: &Path, policy: &GradingPolicy) -> Result<KeyedTable> {
    let cols = &policy.columns;
    // The directory is matched literally; only the file pattern is a glob.
    let dir = data_dir
        .to_str()
        .context("data directory path is not valid UTF-8")?;
    let pattern = Path::new(&Pattern::escape(dir)).join(&policy.files.quiz_pattern);
    let pattern = pattern
        .to_str()
        .context("quiz file pattern is not valid UTF-8")?
        .to_string();

    let mut files: BTreeMap<u32, PathBuf> = BTreeMap::new();
    for entry in glob(&pattern).context("could not build quiz file glob")? {
        let path = entry.context("could not read a quiz file candidate")?;
        let Some(number) = quiz_number(&path) else {
            warn!(path = %path.display(), "Quiz file name has no quiz number, skipping");
            continue;
        };
        if let Some(previous) = files.insert(number, path.clone()) {
            debug!(previous = %previous.display(), path = %path.display(), "Duplicate quiz number");
            return Err(GradeError::DuplicateColumn {
                column: ColumnKind::quiz_column(number),
            }
            .into());
        }
    }

    if files.is_empty() {
        warn!(pattern = %pattern, "No quiz files found; quiz scores will be zero");
    }

    let mut per_quiz: Vec<(u32, KeyedTable)> = Vec::with_capacity(files.len());
    for (number, path) in files {
        let mut table = Table::read_csv(&path)?;
        lowercase_column(&mut table, &cols.quiz_email, &path)?;
        let grade = table.require_column(&cols.quiz_grade, &path.display().to_string())?;
        for (i, row) in table.rows().iter().enumerate() {
            if !row[grade].is_empty() && row[grade].as_f64().is_none() {
                return Err(GradeError::MalformedRow {
                    path: path.clone(),
                    line: i as u64 + 2,
                    reason: format!("`{}` is not a number: `{}`", cols.quiz_grade, row[grade]),
                }
                .into());
            }
        }
        debug!(quiz = number, path = %path.display(), rows = table.len(), "Read quiz file");
        per_quiz.push((number, KeyedTable::new(table, &cols.quiz_email, &path)?));
    }

    let mut emails: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for (_, quiz) in &per_quiz {
        for key in quiz.keys() {
            if seen.insert(key.to_string()) {
                emails.push(key.into_owned());
            }
        }
    }

    let mut columns = vec![cols.quiz_email.clone()];
    columns.extend(per_quiz.iter().map(|(n, _)| ColumnKind::quiz_column(*n)));

    let mut combined = Table::new(columns);
    for email in &emails {
        let mut row = vec![Cell::Text(email.clone())];
        for (_, quiz) in &per_quiz {
            let grade = quiz.table().column_index(&cols.quiz_grade);
            let cell = quiz
                .get(email)
                .zip(grade)
                .map(|(r, g)| r[g].clone())
                .unwrap_or(Cell::Empty);
            row.push(cell);
        }
        combined.push_row(row);
    }

    Ok(KeyedTable::new(
        combined,
        &cols.quiz_email,
        Path::new(&policy.files.quiz_pattern),
    )?)
}

/// Quiz number from a `quiz_<k>_grades.csv` file name.
fn quiz_number(path: &Path) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .split('_')
        .nth(1)?
        .parse()
        .ok()
}

fn lowercase_column(table: &mut Table, column: &str, path: &Path) -> Result<(), GradeError> {
    let idx = table.require_column(column, &path.display().to_string())?;
    table.map_column(idx, |c| match c {
        Cell::Text(s) => Cell::Text(s.to_lowercase()),
        other => other.clone(),
    });
    Ok(())
}

/// Every non-empty cell of a homework, exam or quiz column must be a number.
fn check_numeric_columns(table: &Table, path: &Path) -> Result<(), GradeError> {
    let scoring: Vec<(usize, &String)> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| ColumnKind::classify(name).is_some())
        .collect();

    for (i, row) in table.rows().iter().enumerate() {
        for (idx, name) in &scoring {
            let cell = &row[*idx];
            if !cell.is_empty() && cell.as_f64().is_none() {
                return Err(GradeError::MalformedRow {
                    path: path.to_path_buf(),
                    line: i as u64 + 2,
                    reason: format!("`{name}` is not a number: `{cell}`"),
                });
            }
        }
    }
    Ok(())
}
