//! Acoustic time-of-flight core for the Rust shot chronograph.
//!
//! A single recording holds the muzzle report and, later, the impact sound.
//! The stages locate both events, bound the impact search with projectile
//! and sound speeds, and turn the delay into a velocity with propagated
//! uncertainty. Results carry plain numeric diagnostics for an external
//! chart renderer.

pub mod audio;
pub mod interface;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use audio::SampleBuffer;
pub use interface::{AnalysisOutcome, DetectionEvent, Diagnostics, ErrorKind, SearchWindow};
pub use math::UncertainValue;
pub use pipeline::{analyze, analyze_with};
pub use prelude::{AnalysisConfig, DecodeError, StageError};
