//! Per-section CSV reports and console summaries.

use anyhow::{Context, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tabled::{
    Table as TextTable, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Columns},
};
use tracing::{debug, info, instrument, warn};

use crate::config::GradingPolicy;
use crate::stats::GradeSummary;
use crate::table::Table;

/// One section's rows, sorted by last then first name.
#[derive(Debug, Clone)]
pub struct SectionTable {
    pub section: String,
    pub table: Table,
}

/// What was written for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub section: String,
    pub rows: usize,
    pub path: PathBuf,
}

/// Output file name for a section value.
pub fn section_file_name(section: &str) -> String {
    let safe: String = section
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect();
    format!("section_{safe}_data.csv")
}

/// Numeric sections sort by value, everything else lexically.
fn compare_sections(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Groups rows by section, in section order; rows inside a group are stably
/// sorted by (last name, first name). Rows without a section belong to no
/// group and are left out.
pub fn partition_by_section(table: &Table, policy: &GradingPolicy) -> Result<Vec<SectionTable>> {
    let cols = &policy.columns;
    let section = table.require_column(&cols.section, "merged table")?;
    let last = table.require_column(&cols.last_name, "merged table")?;
    let first = table.require_column(&cols.first_name, "merged table")?;

    let unassigned = table.rows().iter().filter(|r| r[section].is_empty()).count();
    if unassigned > 0 {
        warn!(rows = unassigned, "Rows without a section are not written");
    }

    let mut sections: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| !r[section].is_empty())
        .map(|r| r[section].as_str().into_owned())
        .collect();
    sections.sort_by(|a, b| compare_sections(a, b));
    sections.dedup();

    let rows = table.rows();
    let partitions = sections
        .into_iter()
        .map(|value| {
            let mut indices: Vec<usize> = (0..rows.len())
                .filter(|&i| rows[i][section].as_str() == value)
                .collect();
            indices.sort_by(|&a, &b| {
                rows[a][last]
                    .as_str()
                    .cmp(&rows[b][last].as_str())
                    .then_with(|| rows[a][first].as_str().cmp(&rows[b][first].as_str()))
            });
            SectionTable {
                section: value,
                table: table.select_rows(&indices),
            }
        })
        .collect();

    Ok(partitions)
}

/// Writes one CSV per section into `out_dir`, overwriting earlier runs.
#[instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn write_sections(
    table: &Table,
    policy: &GradingPolicy,
    out_dir: &Path,
) -> Result<Vec<SectionReport>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory `{}`", out_dir.display()))?;

    let mut reports = Vec::new();
    for part in partition_by_section(table, policy)? {
        let path = out_dir.join(section_file_name(&part.section));
        part.table.write_csv(&path)?;

        info!(
            section = %part.section,
            rows = part.table.len(),
            path = %path.display(),
            "Section written"
        );
        reports.push(SectionReport {
            section: part.section,
            rows: part.table.len(),
            path,
        });
    }

    Ok(reports)
}

#[derive(Tabled)]
struct StudentLine {
    #[tabled(rename = "Last Name")]
    last: String,
    #[tabled(rename = "First Name")]
    first: String,
    #[tabled(rename = "Final Score")]
    final_score: String,
    #[tabled(rename = "Ceiling")]
    ceiling: String,
    #[tabled(rename = "Grade")]
    grade: String,
}

/// Renders one section's students with their final scores and grades.
pub fn render_section(part: &SectionTable, policy: &GradingPolicy) -> String {
    let cols = &policy.columns;
    let text = |row: usize, column: &str| {
        part.table
            .cell(row, column)
            .map(|c| c.as_str().into_owned())
            .unwrap_or_default()
    };

    let lines: Vec<StudentLine> = (0..part.table.len())
        .map(|i| StudentLine {
            last: text(i, &cols.last_name),
            first: text(i, &cols.first_name),
            final_score: part
                .table
                .cell(i, "Final Score")
                .and_then(|c| c.as_f64())
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            ceiling: text(i, "Ceiling Score"),
            grade: text(i, "Final Grade"),
        })
        .collect();

    TextTable::new(&lines)
        .with(Panel::header(format!("Section {}", part.section)))
        .with(Panel::footer(format!(
            "Number of students in Section {}: {}",
            part.section,
            part.table.len()
        )))
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .with(Style::modern())
        .to_string()
}

#[derive(Tabled)]
struct GradeCountLine {
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Renders the class-wide grade counts in ascending grade order, with the
/// final-score mean and standard deviation underneath.
pub fn render_grade_counts(summary: &GradeSummary) -> String {
    let lines: Vec<GradeCountLine> = summary
        .counts
        .iter()
        .map(|(grade, count)| GradeCountLine {
            grade: grade.to_string(),
            count: *count,
        })
        .collect();

    TextTable::new(&lines)
        .with(Panel::header("Final Grades"))
        .with(Panel::footer(format!(
            "Final mean {:.4} / std {:.4}",
            summary.mean, summary.std_dev
        )))
        .with(Style::modern())
        .to_string()
}

/// Prints any serializable value to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    debug!(bytes = json.len(), "Rendered JSON");
    println!("{json}");
    Ok(())
}
