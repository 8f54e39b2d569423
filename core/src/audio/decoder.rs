//! Decode boundary: 16-bit linear PCM WAV into a normalized [`SampleBuffer`].
//!
//! Multi-channel input keeps only the first channel of every frame, and
//! anything past [`MAX_DURATION_SECONDS`] is dropped while reading.

use hound::{SampleFormat, WavReader};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::audio::buffer::SampleBuffer;
use crate::prelude::DecodeError;

/// Longest stretch of audio the analysis looks at.
pub const MAX_DURATION_SECONDS: f64 = 10.0;

const I16_SCALE: f32 = 32_768.0;

pub fn decode<R: Read>(reader: R) -> Result<SampleBuffer, DecodeError> {
    let mut wav = WavReader::new(reader)?;
    let spec = wav.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(DecodeError::UnsupportedEncoding {
            format: format!("{:?}", spec.sample_format),
            bits: spec.bits_per_sample,
        });
    }
    if spec.sample_rate == 0 {
        return Err(DecodeError::InvalidSampleRate(spec.sample_rate));
    }

    let channels = usize::from(spec.channels.max(1));
    let limit = (MAX_DURATION_SECONDS * f64::from(spec.sample_rate)) as usize;
    let samples = wav
        .samples::<i16>()
        .step_by(channels)
        .take(limit)
        .map(|sample| sample.map(|value| f32::from(value) / I16_SCALE))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "decoded {} frames at {} Hz from {} channel(s)",
        samples.len(),
        spec.sample_rate,
        channels
    );
    SampleBuffer::new(samples, spec.sample_rate)
}

pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, DecodeError> {
    let file = File::open(path.as_ref()).map_err(hound::Error::IoError)?;
    decode(BufReader::new(file))
}
