//! Named failure kinds for the grading pipeline.
//!
//! Library functions return [`anyhow::Result`]; the root cause of a failed run
//! is one of these variants, which callers can recover with
//! [`anyhow::Error::downcast_ref`].

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// A required input file does not exist.
    #[error("required input file `{}` was not found", path.display())]
    MissingFile { path: PathBuf },

    /// A row could not be read or interpreted.
    #[error("malformed row in `{}` at line {line}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// A column the pipeline depends on is absent.
    #[error("column `{column}` is missing from {source_name}")]
    MissingColumn { column: String, source_name: String },

    /// Joining two inputs produced no students.
    #[error("joining {left} with {right} produced no rows")]
    EmptyJoin { left: String, right: String },

    /// The configured final-score weights do not add up to 1.
    #[error("final score weights sum to {sum}, expected 1.0")]
    WeightSumInvalid { sum: f64 },

    /// Two inputs carry a column with the same name.
    #[error("column `{column}` appears in more than one input")]
    DuplicateColumn { column: String },

    /// A positive score was recorded against zero max points.
    #[error("student `{student}` has a score in `{column}` but zero max points")]
    ZeroMaxPoints { student: String, column: String },

    /// The grading policy is unusable for a reason other than its weights.
    #[error("invalid grading policy: {0}")]
    InvalidPolicy(String),
}
