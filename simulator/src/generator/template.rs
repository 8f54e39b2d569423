use std::f32::consts::PI;

/// Exponentially decaying tone standing in for a gunshot or impact transient.
///
/// The first sample is at full scale and every later sample is strictly
/// quieter, so the onset is the burst's loudest point.
pub fn decaying_burst(length: usize, sample_rate: u32, frequency: f32, decay_seconds: f32) -> Vec<f32> {
    let rate = sample_rate.max(1) as f32;
    let decay = decay_seconds.max(f32::EPSILON);
    (0..length)
        .map(|i| {
            let t = i as f32 / rate;
            (2.0 * PI * frequency * t).cos() * (-t / decay).exp()
        })
        .collect()
}
