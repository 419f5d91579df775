//! Terminal charts for the grade summary.
//!
//! Nothing here is persisted; the strings are printed by the CLI.

use tabled::{
    Table as TextTable, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Columns},
};

use crate::stats::GradeSummary;

const BAR_WIDTH: usize = 40;

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len.max(1))
}

/// Bar chart of letter-grade counts, lowest grade first.
pub fn render_grade_bars(summary: &GradeSummary) -> String {
    let max = summary.counts.values().copied().max().unwrap_or(0) as f64;

    let mut out = String::from("Distribution of Letter Grades\n");
    for (grade, count) in &summary.counts {
        out.push_str(&format!(
            "{grade} | {count:>4} {}\n",
            bar(*count as f64, max)
        ));
    }
    out
}

#[derive(Tabled)]
struct DistributionLine {
    #[tabled(rename = "Final Score")]
    range: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Histogram")]
    histogram: String,
    #[tabled(rename = "Density")]
    density: String,
    #[tabled(rename = "KDE")]
    kde: String,
    #[tabled(rename = "Normal")]
    normal: String,
}

/// Histogram of final scores with the kernel density estimate and the fitted
/// normal density evaluated at each bin centre. Empty when there are no
/// scores.
pub fn render_score_distribution(summary: &GradeSummary, bins: usize) -> String {
    let histogram = summary.histogram(bins);
    if histogram.is_empty() {
        return String::new();
    }

    let n = summary.students() as f64;
    let max = histogram.iter().map(|b| b.count).max().unwrap_or(0) as f64;

    let lines: Vec<DistributionLine> = histogram
        .iter()
        .map(|b| {
            let width = b.end - b.start;
            let density = if width > 0.0 {
                b.count as f64 / (n * width)
            } else {
                0.0
            };
            DistributionLine {
                range: format!("{:.3} - {:.3}", b.start, b.end),
                count: b.count,
                histogram: bar(b.count as f64, max),
                density: format!("{density:.3}"),
                kde: format!("{:.3}", summary.kde(b.center())),
                normal: format!("{:.3}", summary.normal(b.center())),
            }
        })
        .collect();

    TextTable::new(&lines)
        .with(Panel::header("Final Score Distribution"))
        .with(Panel::footer(format!(
            "mean {:.4}, std {:.4}, n {}",
            summary.mean,
            summary.std_dev,
            summary.students()
        )))
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .with(Style::modern())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::grade::LetterGrade;
    use std::collections::BTreeMap;

    fn summary(scores: &[f64], counts: &[(LetterGrade, usize)]) -> GradeSummary {
        let mean = crate::stats::mean(scores);
        GradeSummary {
            counts: counts.iter().copied().collect::<BTreeMap<_, _>>(),
            final_scores: scores.to_vec(),
            mean,
            std_dev: crate::stats::stddev(scores, mean),
        }
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0.0, 10.0), "");
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(0.1, 10.0).chars().count(), 1);
    }

    #[test]
    fn test_grade_bars_in_grade_order() {
        let s = summary(
            &[0.5, 0.95],
            &[(LetterGrade::A, 1), (LetterGrade::F, 1), (LetterGrade::C, 0)],
        );
        let rendered = render_grade_bars(&s);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("F |"));
        assert!(lines[2].starts_with("C |"));
        assert!(lines[3].starts_with("A |"));
    }

    #[test]
    fn test_distribution_has_one_row_per_bin() {
        let s = summary(&[0.5, 0.6, 0.7, 0.9], &[]);
        let rendered = render_score_distribution(&s, 4);
        assert!(rendered.contains("Final Score Distribution"));
        assert!(rendered.contains("n 4"));
        assert_eq!(rendered.matches(" - ").count(), 4);
    }

    #[test]
    fn test_distribution_empty() {
        let s = summary(&[], &[]);
        assert!(render_score_distribution(&s, 20).is_empty());
    }
}
