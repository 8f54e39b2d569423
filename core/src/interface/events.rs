use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::audio::SampleBuffer;

/// A located acoustic event: the shot or the impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub index: usize,
    pub time: f64,
    pub amplitude: f32,
}

impl DetectionEvent {
    /// Reads the signed amplitude and time of `index` from `buffer`.
    ///
    /// Panics if `index` is outside the buffer; callers only pass indices they
    /// obtained from the same buffer.
    pub fn at(buffer: &SampleBuffer, index: usize) -> Self {
        Self {
            index,
            time: buffer.time_of(index),
            amplitude: buffer.samples()[index],
        }
    }
}

/// Half-open sample interval `[start, end)` where an impact may be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct SearchWindow {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct RawWindow {
    start: usize,
    end: usize,
}

impl TryFrom<RawWindow> for SearchWindow {
    type Error = String;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        if raw.start < raw.end {
            Ok(Self {
                start: raw.start,
                end: raw.end,
            })
        } else {
            Err(format!("empty search window {}..{}", raw.start, raw.end))
        }
    }
}

impl SearchWindow {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        assert!(start < end, "search window must be non-empty");
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn sample_count(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Window bounds in seconds for a given sample rate.
    pub fn times(&self, sample_rate: u32) -> (f64, f64) {
        let rate = f64::from(sample_rate);
        (self.start as f64 / rate, self.end as f64 / rate)
    }
}
