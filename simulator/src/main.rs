use anyhow::{bail, Context};
use clap::Parser;
use generator::profile::{build_recording, write_wav, GeneratorConfig};
use render_bridge::bridge::{bridge_bind_address, RenderBridge};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::report::append_report;
use workflow::runner::{Runner, WorkflowResult};

mod generator;
mod render_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Acoustic shot chronograph driver")]
struct Args {
    /// Analyze a 16-bit PCM WAV recording
    #[arg(long)]
    input: Option<PathBuf>,
    /// Generate a synthetic shot/impact recording and analyze it
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Load the synthetic scenario from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Also write the synthetic recording to this WAV path
    #[arg(long)]
    write_wav: Option<PathBuf>,
    /// Load measurements and tuning from YAML instead of flags
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Distance from the microphone to the target, metres
    #[arg(long, default_value_t = 50.0)]
    distance: f64,
    #[arg(long, default_value_t = 0.5)]
    distance_uncertainty: f64,
    /// Air temperature, degrees Celsius
    #[arg(long, default_value_t = 25.0)]
    temperature: f64,
    #[arg(long, default_value_t = 2.0)]
    temperature_uncertainty: f64,
    /// Fraction of the shot amplitude an impact must reach (0.01 - 0.5)
    #[arg(long, default_value_t = 0.1)]
    sensitivity: f32,
    #[arg(long, default_value_t = 40.0)]
    min_velocity: f64,
    #[arg(long, default_value_t = 1000.0)]
    max_velocity: f64,
    /// Append a one-line result per analysis to this file
    #[arg(long, default_value = "tools/data/shot_analysis.log")]
    report: PathBuf,
    /// Print the full outcome as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Keep the render bridge alive for external chart renderers
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.input.is_none() && !args.synthetic && !args.serve {
        bail!("nothing to do: pass --input, --synthetic or --serve");
    }

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            (args.distance, args.distance_uncertainty),
            (args.temperature, args.temperature_uncertainty),
        )
        .with_tuning(args.sensitivity, args.min_velocity, args.max_velocity)
    };
    workflow_config.validate()?;

    let runner = Arc::new(Runner::new(workflow_config));
    let bridge = RenderBridge::new(runner.clone());

    if let Some(path) = &args.input {
        let result = runner.analyze_file(path)?;
        finish(&bridge, &args, &path.display().to_string(), &result)?;
    }

    if args.synthetic {
        let generator_config = match &args.scenario {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };
        let recording = build_recording(&generator_config).context("generating recording")?;
        println!(
            "Synthetic recording -> shot at sample {}, impact at sample {}",
            recording.shot_index, recording.impact_index
        );

        let (source, result) = match &args.write_wav {
            Some(path) => {
                write_wav(&recording, path)?;
                (path.display().to_string(), runner.analyze_file(path)?)
            }
            None => (
                generator_config
                    .scenario
                    .clone()
                    .unwrap_or_else(|| "synthetic".into()),
                runner.analyze_buffer(&recording.buffer),
            ),
        };
        finish(&bridge, &args, &source, &result)?;
    }

    if args.serve {
        let address = bridge.serve(bridge_bind_address())?;
        bridge.publish_status(&format!(
            "HTTP bridge running on http://{} (Ctrl+C to stop)...",
            address
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

fn finish(
    bridge: &RenderBridge,
    args: &Args,
    source: &str,
    result: &WorkflowResult,
) -> anyhow::Result<()> {
    println!("{} -> {}", source, result.outcome.summary());
    for note in &result.model.diagnostics.notes {
        println!("  {}", note);
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.outcome)?);
    }

    bridge.publish(&result.model);
    append_report(&args.report, source, &result.outcome)
}
