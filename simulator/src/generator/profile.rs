use anyhow::{ensure, Context};
use chronocore::audio::MAX_DURATION_SECONDS;
use chronocore::processing::physics::speed_of_sound;
use chronocore::SampleBuffer;
use hound::{SampleFormat, WavSpec, WavWriter};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::generator::template::decaying_burst;

/// Configuration for generating a synthetic shot/impact recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub channels: u16,
    pub shot_time: f64,
    pub shot_amplitude: f32,
    pub impact_amplitude: f32,
    /// Projectile speed used to place the impact, m/s.
    pub velocity: f64,
    pub distance: f64,
    pub temperature: f64,
    pub burst_frequency: f32,
    pub burst_decay: f32,
    pub noise: f32,
    pub seed: u64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            duration_seconds: 1.5,
            channels: 1,
            shot_time: 0.1,
            shot_amplitude: 0.9,
            impact_amplitude: 0.3,
            velocity: 250.0,
            distance: 50.0,
            temperature: 25.0,
            burst_frequency: 1_500.0,
            burst_decay: 0.004,
            noise: 0.005,
            seed: 0,
            description: None,
            scenario: None,
        }
    }
}

impl GeneratorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))
    }

    /// Microphone delay between the shot and the impact sound, seconds.
    pub fn impact_delay(&self) -> f64 {
        self.distance / self.velocity + self.distance / speed_of_sound(self.temperature)
    }
}

/// Generated recording plus the ground truth used to build it.
#[derive(Debug, Clone)]
pub struct SyntheticRecording {
    pub buffer: SampleBuffer,
    pub shot_index: usize,
    pub impact_index: usize,
    pub channels: u16,
}

fn sample_count(config: &GeneratorConfig) -> anyhow::Result<usize> {
    ensure!(config.sample_rate > 0, "sample rate must be positive");
    ensure!(
        config.duration_seconds.is_finite() && config.duration_seconds > 0.0,
        "duration must be positive"
    );
    ensure!(
        config.duration_seconds <= MAX_DURATION_SECONDS,
        "duration {} s exceeds the {} s analysis cap",
        config.duration_seconds,
        MAX_DURATION_SECONDS
    );
    Ok((config.duration_seconds * f64::from(config.sample_rate)) as usize)
}

pub fn build_recording(config: &GeneratorConfig) -> anyhow::Result<SyntheticRecording> {
    ensure!(
        config.velocity > 0.0 && config.distance > 0.0,
        "velocity and distance must be positive"
    );
    let len = sample_count(config)?;
    let rate = f64::from(config.sample_rate);
    let shot_index = (config.shot_time * rate).round() as usize;
    let impact_index = shot_index + (config.impact_delay() * rate).round() as usize;
    ensure!(
        impact_index < len,
        "impact at sample {} falls after the recording end ({} samples)",
        impact_index,
        len
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = config.noise.abs();
    let mut samples: Vec<f32> = (0..len)
        .map(|_| {
            if noise > 0.0 {
                rng.gen_range(-noise..noise)
            } else {
                0.0
            }
        })
        .collect();

    let burst_len = (f64::from(config.burst_decay) * 10.0 * rate).ceil() as usize;
    let burst = decaying_burst(
        burst_len.max(1),
        config.sample_rate,
        config.burst_frequency,
        config.burst_decay,
    );
    for (onset, amplitude) in [
        (shot_index, config.shot_amplitude),
        (impact_index, config.impact_amplitude),
    ] {
        for (offset, value) in burst.iter().enumerate() {
            if let Some(sample) = samples.get_mut(onset + offset) {
                *sample += value * amplitude;
            }
        }
    }
    for sample in samples.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }

    let buffer = SampleBuffer::new(samples, config.sample_rate)
        .context("building synthetic sample buffer")?;
    Ok(SyntheticRecording {
        buffer,
        shot_index,
        impact_index,
        channels: config.channels.max(1),
    })
}

/// Writes the recording as 16-bit PCM; extra channels carry a half-level copy.
pub fn write_wav<P: AsRef<Path>>(recording: &SyntheticRecording, path: P) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: recording.channels,
        sample_rate: recording.buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path_ref, spec)
        .with_context(|| format!("creating wav {}", path_ref.display()))?;
    for &sample in recording.buffer.samples() {
        writer.write_sample(quantize(sample))?;
        for _ in 1..recording.channels {
            writer.write_sample(quantize(sample * 0.5))?;
        }
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing wav {}", path_ref.display()))?;
    Ok(())
}

fn quantize(sample: f32) -> i16 {
    (sample * 32_767.0).round().clamp(-32_768.0, 32_767.0) as i16
}
