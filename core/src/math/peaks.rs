use std::ops::Range;

/// Local-maximum peak search with a height floor and a minimum spacing.
///
/// Neighbour comparisons always use the full signal, so a peak sitting on the
/// edge of the searched range is still found. Flat plateaus collapse to their
/// middle sample. When two peaks are closer than `min_separation`, the taller
/// one survives; equal heights favour the later index.
#[derive(Debug, Clone, Copy)]
pub struct PeakFinder {
    min_height: f32,
    min_separation: usize,
}

impl PeakFinder {
    pub fn new(min_height: f32, min_separation: usize) -> Self {
        Self {
            min_height,
            min_separation: min_separation.max(1),
        }
    }

    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    pub fn min_separation(&self) -> usize {
        self.min_separation
    }

    /// Returns peak indices inside `range`, in ascending order.
    pub fn find(&self, signal: &[f32], range: Range<usize>) -> Vec<usize> {
        let mut peaks = local_maxima(signal, range);
        peaks.retain(|&idx| signal[idx] >= self.min_height);
        self.enforce_separation(signal, peaks)
    }

    fn enforce_separation(&self, signal: &[f32], peaks: Vec<usize>) -> Vec<usize> {
        if self.min_separation <= 1 || peaks.len() < 2 {
            return peaks;
        }

        let mut order: Vec<usize> = (0..peaks.len()).collect();
        order.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

        let mut keep = vec![true; peaks.len()];
        for &current in order.iter().rev() {
            if !keep[current] {
                continue;
            }

            let mut left = current;
            while left > 0 && peaks[current] - peaks[left - 1] < self.min_separation {
                left -= 1;
                keep[left] = false;
            }

            let mut right = current + 1;
            while right < peaks.len() && peaks[right] - peaks[current] < self.min_separation {
                keep[right] = false;
                right += 1;
            }
        }

        peaks
            .into_iter()
            .zip(keep)
            .filter_map(|(idx, kept)| kept.then_some(idx))
            .collect()
    }
}

fn local_maxima(signal: &[f32], range: Range<usize>) -> Vec<usize> {
    let mut maxima = Vec::new();
    let last = signal.len().saturating_sub(1);
    let end = range.end.min(signal.len());
    let mut idx = range.start.max(1);

    while idx < end && idx < last {
        if signal[idx - 1] < signal[idx] {
            let mut ahead = idx + 1;
            while ahead < last && signal[ahead] == signal[idx] {
                ahead += 1;
            }
            if signal[ahead] < signal[idx] {
                let peak = (idx + ahead - 1) / 2;
                if peak < end {
                    maxima.push(peak);
                }
                idx = ahead;
            }
        }
        idx += 1;
    }

    maxima
}
