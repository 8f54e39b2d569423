pub mod events;
pub mod outcome;

pub use events::{DetectionEvent, SearchWindow};
pub use outcome::{AnalysisOutcome, Diagnostics, ErrorKind};
