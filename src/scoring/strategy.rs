//! Ratio aggregation strategies and best-of selection.
//!
//! A category (homework, quizzes) is scored by every strategy and the
//! student keeps the most favorable result.

use super::sheet::Assignment;

/// Reduces a set of scored items to one ratio.
pub trait RatioStrategy {
    fn label(&self) -> &'static str;
    fn ratio(&self, items: &[Assignment]) -> f64;
}

/// Sum of scores over sum of max points.
pub struct TotalMethod;

impl RatioStrategy for TotalMethod {
    fn label(&self) -> &'static str {
        "total"
    }

    fn ratio(&self, items: &[Assignment]) -> f64 {
        let max: f64 = items.iter().map(|a| a.max_points).sum();
        if max <= 0.0 {
            return 0.0;
        }
        items.iter().map(|a| a.score).sum::<f64>() / max
    }
}

/// Mean of the per-item ratios over recorded items.
pub struct AverageMethod;

impl RatioStrategy for AverageMethod {
    fn label(&self) -> &'static str {
        "average"
    }

    fn ratio(&self, items: &[Assignment]) -> f64 {
        let ratios: Vec<f64> = items
            .iter()
            .filter(|a| a.is_recorded())
            .map(|a| a.score / a.max_points)
            .collect();
        crate::stats::mean(&ratios)
    }
}

/// Every strategy's ratio, in strategy order, plus the largest.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub ratios: Vec<(&'static str, f64)>,
    pub best: f64,
}

impl Evaluation {
    pub fn ratio(&self, label: &str) -> Option<f64> {
        self.ratios.iter().find(|(l, _)| *l == label).map(|(_, r)| *r)
    }
}

/// Scores `items` with each strategy and keeps the maximum. No strategies
/// yields 0.
pub fn best_of(strategies: &[&dyn RatioStrategy], items: &[Assignment]) -> Evaluation {
    let ratios: Vec<(&'static str, f64)> = strategies
        .iter()
        .map(|s| (s.label(), s.ratio(items)))
        .collect();
    let best = ratios.iter().map(|(_, r)| *r).fold(0.0, f64::max);
    Evaluation { ratios, best }
}

/// The strategies used for both homework and quizzes.
pub fn default_strategies() -> [&'static dyn RatioStrategy; 2] {
    [&TotalMethod, &AverageMethod]
}
