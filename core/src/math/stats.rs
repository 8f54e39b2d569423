pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = samples.iter().map(|&v| v * v).sum();
        (sum_sq / samples.len() as f32).sqrt()
    }

    /// Index and absolute value of the loudest sample.
    ///
    /// Ties resolve to the earliest index. Returns `None` for an empty slice.
    pub fn abs_peak(samples: &[f32]) -> Option<(usize, f32)> {
        samples
            .iter()
            .map(|v| v.abs())
            .enumerate()
            .fold(None, |best, (idx, value)| match best {
                Some((_, best_value)) if value <= best_value => best,
                _ => Some((idx, value)),
            })
    }

    pub fn magnitudes(samples: &[f32]) -> Vec<f32> {
        samples.iter().map(|v| v.abs()).collect()
    }
}
