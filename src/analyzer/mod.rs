// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod cross_filter;
pub mod depreciation;
pub mod grouping;

// Re-export the main entry points for ease of use.
pub use cross_filter::CrossFilterIndexBuilder;
pub use depreciation::DepreciationCalculator;
