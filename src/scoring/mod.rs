//! Score derivation and letter grading.
//!
//! Each merged student row is reduced to a [`sheet::ScoreSheet`], scored
//! with best-of ratio strategies, combined into a weighted final score, and
//! mapped to a letter grade through the configured threshold table.

pub mod grade;
pub mod score;
pub mod sheet;
pub mod strategy;
