//! The grading run from input files to a scored table.

use anyhow::Result;
use std::path::Path;
use tracing::{info, instrument};

use crate::config::GradingPolicy;
use crate::loader::load_sources;
use crate::merge::merge;
use crate::scoring::score::{StudentScores, score_table};
use crate::stats::GradeSummary;
use crate::table::Table;

/// Everything a run produces before it is written out.
#[derive(Debug, Clone)]
pub struct GradedCourse {
    /// Merged inputs plus every derived column, in roster order.
    pub table: Table,
    pub scores: Vec<StudentScores>,
    pub summary: GradeSummary,
}

/// Loads, merges and scores the course data in `data_dir`.
#[instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn grade_course(data_dir: &Path, policy: &GradingPolicy) -> Result<GradedCourse> {
    policy.validate()?;

    let sources = load_sources(data_dir, policy)?;
    let mut table = merge(&sources, policy)?;
    let scores = score_table(&mut table, policy)?;
    let summary = GradeSummary::from_scores(&scores);

    info!(
        students = summary.students(),
        mean = summary.mean,
        std_dev = summary.std_dev,
        "Course graded"
    );

    Ok(GradedCourse {
        table,
        scores,
        summary,
    })
}
