// Analyzer module: per-timeframe estimation and signal combination.

pub mod combiner;
pub mod timeframe;

pub use combiner::combine;
pub use timeframe::{HeuristicEstimator, TimeframeEstimator};
