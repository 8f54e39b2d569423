pub mod buffer;
pub mod decoder;

pub use buffer::SampleBuffer;
pub use decoder::{decode, decode_file, MAX_DURATION_SECONDS};
