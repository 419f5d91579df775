pub mod chart;
pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod stats;
pub mod table;
