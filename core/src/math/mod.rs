pub mod peaks;
pub mod stats;
pub mod uncertain;

pub use peaks::PeakFinder;
pub use stats::StatsHelper;
pub use uncertain::UncertainValue;
