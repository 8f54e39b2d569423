use crate::render_bridge::model::VisualizationModel;
use crate::workflow::config::WorkflowConfig;
use anyhow::ensure;
use chronocore::audio::decode_file;
use chronocore::{analyze, AnalysisOutcome, SampleBuffer};
use log::warn;
use std::path::Path;

pub struct WorkflowResult {
    pub outcome: AnalysisOutcome,
    pub model: VisualizationModel,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Decodes a WAV file and analyzes it.
    ///
    /// A missing file is an error; an undecodable one is a `Format` outcome.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<WorkflowResult> {
        let path_ref = path.as_ref();
        ensure!(
            path_ref.is_file(),
            "input file {} does not exist",
            path_ref.display()
        );

        match decode_file(path_ref) {
            Ok(buffer) => Ok(self.analyze_buffer(&buffer)),
            Err(err) => {
                warn!("decoding {} failed: {}", path_ref.display(), err);
                let outcome = AnalysisOutcome::from_decode_error(&err);
                let model = VisualizationModel::from_outcome(&outcome, None);
                Ok(WorkflowResult { outcome, model })
            }
        }
    }

    pub fn analyze_buffer(&self, buffer: &SampleBuffer) -> WorkflowResult {
        let outcome = analyze(
            buffer,
            self.config.distance(),
            self.config.temperature(),
            &self.config.to_analysis_config(),
        );
        let model = VisualizationModel::from_outcome(&outcome, Some(buffer));
        WorkflowResult { outcome, model }
    }
}
