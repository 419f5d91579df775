//! Class-wide summaries of the scored table: grade counts and the
//! distribution of final scores.

use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::scoring::grade::LetterGrade;
use crate::scoring::score::StudentScores;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the sample standard deviation (n - 1) given a pre-computed mean.
/// Returns 0.0 for fewer than two values.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Density of the normal distribution `N(mean, sd)` at `x`.
pub fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    if sd <= 0.0 {
        return 0.0;
    }
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * PI).sqrt())
}

/// One histogram bin covering `[start, end)`; the last bin also holds `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Grade counts and final-score statistics for the whole class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSummary {
    /// Every letter, ascending, including those nobody received.
    pub counts: BTreeMap<LetterGrade, usize>,
    pub final_scores: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
}

impl GradeSummary {
    pub fn from_scores(scores: &[StudentScores]) -> Self {
        let mut counts: BTreeMap<LetterGrade, usize> =
            LetterGrade::ALL.into_iter().map(|g| (g, 0)).collect();
        for s in scores {
            *counts.entry(s.grade).or_default() += 1;
        }

        let final_scores: Vec<f64> = scores.iter().map(|s| s.final_score).collect();
        let mean = mean(&final_scores);
        let std_dev = stddev(&final_scores, mean);

        Self {
            counts,
            final_scores,
            mean,
            std_dev,
        }
    }

    pub fn students(&self) -> usize {
        self.final_scores.len()
    }

    /// Splits the final scores into `bins` equal-width bins between the
    /// lowest and highest score. A single distinct value gets a unit-wide
    /// range centred on it.
    pub fn histogram(&self, bins: usize) -> Vec<Bin> {
        if bins == 0 || self.final_scores.is_empty() {
            return Vec::new();
        }

        let lo = self.final_scores.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self
            .final_scores
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let width = (hi - lo) / bins as f64;

        let mut out: Vec<Bin> = (0..bins)
            .map(|i| Bin {
                start: lo + width * i as f64,
                end: if i + 1 == bins {
                    hi
                } else {
                    lo + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &score in &self.final_scores {
            let idx = (((score - lo) / width).floor() as usize).min(bins - 1);
            out[idx].count += 1;
        }
        out
    }

    /// Gaussian kernel bandwidth by Scott's rule, `sd * n^(-1/5)`.
    pub fn kde_bandwidth(&self) -> f64 {
        let n = self.students();
        if n == 0 {
            return 0.0;
        }
        self.std_dev * (n as f64).powf(-0.2)
    }

    /// Gaussian kernel density estimate of the final scores at `x`.
    pub fn kde(&self, x: f64) -> f64 {
        let h = self.kde_bandwidth();
        if h <= 0.0 {
            return 0.0;
        }
        let n = self.students() as f64;
        self.final_scores
            .iter()
            .map(|xi| normal_pdf(x, *xi, h))
            .sum::<f64>()
            / n
    }

    /// Normal density fitted to the final scores' mean and standard deviation.
    pub fn normal(&self, x: f64) -> f64 {
        normal_pdf(x, self.mean, self.std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(final_score: f64, grade: LetterGrade) -> StudentScores {
        StudentScores {
            student: String::new(),
            exam_scores: vec![],
            total_homework: 0.0,
            average_homework: 0.0,
            homework_score: 0.0,
            total_quizzes: 0.0,
            average_quizzes: 0.0,
            quiz_score: 0.0,
            final_score,
            ceiling_score: crate::scoring::score::ceiling_score(final_score),
            grade,
        }
    }

    #[test]
    fn test_mean_and_sample_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert!((stddev(&values, m) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[3.0], 3.0), 0.0);
    }

    #[test]
    fn test_counts_cover_every_grade_in_order() {
        let summary = GradeSummary::from_scores(&[
            scored(0.95, LetterGrade::A),
            scored(0.55, LetterGrade::F),
            scored(0.91, LetterGrade::A),
        ]);
        let counts: Vec<_> = summary.counts.iter().map(|(g, c)| (*g, *c)).collect();
        assert_eq!(
            counts,
            vec![
                (LetterGrade::F, 1),
                (LetterGrade::D, 0),
                (LetterGrade::C, 0),
                (LetterGrade::B, 0),
                (LetterGrade::A, 2),
            ]
        );
        assert_eq!(summary.students(), 3);
    }

    #[test]
    fn test_histogram_places_every_score() {
        let summary = GradeSummary::from_scores(&[
            scored(0.5, LetterGrade::F),
            scored(0.75, LetterGrade::C),
            scored(1.0, LetterGrade::A),
        ]);
        let bins = summary.histogram(5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[2].count, 1);
        assert_eq!(bins[4].count, 1);
        assert_eq!(bins[4].end, 1.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let summary = GradeSummary::from_scores(&[scored(0.8, LetterGrade::B)]);
        let bins = summary.histogram(4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1);
        assert!(bins[0].start < 0.8 && bins[3].end > 0.8);
    }

    #[test]
    fn test_densities() {
        assert!((normal_pdf(0.0, 0.0, 1.0) - 1.0 / (2.0 * PI).sqrt()).abs() < 1e-12);
        assert_eq!(normal_pdf(0.0, 0.0, 0.0), 0.0);

        let summary = GradeSummary::from_scores(&[
            scored(0.6, LetterGrade::D),
            scored(0.7, LetterGrade::C),
            scored(0.8, LetterGrade::B),
        ]);
        assert!(summary.kde(0.7) > summary.kde(0.2));
        assert!(summary.normal(0.7) > summary.normal(1.0));
    }
}
